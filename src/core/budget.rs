//! Derived totals. Nothing here is stored; every figure is recomputed from
//! the current snapshot.

use crate::types::{Material, Project, ResourceAssignment, Task, WorkPackage, MONTHS};

/// Sum of units × unit_price; 0 for an empty list
pub fn compute_materials_total(materials: &[Material]) -> f64 {
    materials.iter().map(Material::line_total).sum()
}

/// Completed tasks over all tasks as a rounded percentage; 0 when there are
/// no tasks at all.
pub fn compute_project_progress(work_packages: &[WorkPackage]) -> u32 {
    let (completed, total) = work_packages
        .iter()
        .flat_map(|wp| wp.tasks.iter())
        .fold((0usize, 0usize), |(done, total), task| {
            (done + usize::from(task.is_completed()), total + 1)
        });
    percentage(completed, total)
}

pub fn work_package_progress(work_package: &WorkPackage) -> u32 {
    compute_project_progress(std::slice::from_ref(work_package))
}

fn percentage(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    (part as f64 / whole as f64 * 100.0).round() as u32
}

pub fn task_budget(task: &Task) -> f64 {
    compute_materials_total(&task.materials)
}

pub fn work_package_budget(work_package: &WorkPackage) -> f64 {
    work_package.tasks.iter().map(task_budget).sum()
}

pub fn project_budget(project: &Project) -> f64 {
    project.work_packages.iter().map(work_package_budget).sum()
}

/// Column sums of the resource × month matrix
pub fn monthly_totals(task: &Task) -> [f64; MONTHS] {
    let mut totals = [0.0; MONTHS];
    for resource in task.resources.iter() {
        for (total, value) in totals.iter_mut().zip(resource.allocation.values()) {
            *total += value;
        }
    }
    totals
}

/// Average full-time equivalent over the year
pub fn resource_fte(resource: &ResourceAssignment) -> f64 {
    resource.allocation.total() / MONTHS as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Allocation, TaskStatus};
    use chrono::NaiveDate;
    use std::sync::Arc;

    fn material(units: f64, unit_price: f64) -> Material {
        Material {
            id: "m".to_string(),
            name: "item".to_string(),
            units,
            unit_price,
        }
    }

    fn task(id: &str, status: TaskStatus) -> Task {
        let day = NaiveDate::from_ymd_opt(2025, 3, 3).unwrap();
        let mut t = Task::new(id, id, day, day);
        t.status = status;
        t
    }

    fn package(id: &str, total: usize, completed: usize) -> WorkPackage {
        let tasks = (0..total)
            .map(|i| {
                let status = if i < completed {
                    TaskStatus::Completed
                } else {
                    TaskStatus::InProgress
                };
                task(&format!("{}-{}", id, i), status)
            })
            .collect();
        WorkPackage {
            id: id.to_string(),
            name: id.to_string(),
            tasks,
        }
    }

    #[test]
    fn test_materials_total() {
        assert_eq!(compute_materials_total(&[]), 0.0);
        assert_eq!(compute_materials_total(&[material(3.0, 10.0)]), 30.0);
        assert_eq!(
            compute_materials_total(&[material(3.0, 10.0), material(2.0, 2.5)]),
            35.0
        );
    }

    #[test]
    fn test_progress_empty_is_zero() {
        assert_eq!(compute_project_progress(&[]), 0);
        assert_eq!(compute_project_progress(&[package("wp", 0, 0)]), 0);
    }

    #[test]
    fn test_progress_across_packages() {
        // 20 tasks, 12 completed
        let packages = vec![package("a", 8, 8), package("b", 12, 4)];
        assert_eq!(compute_project_progress(&packages), 60);
        assert_eq!(work_package_progress(&packages[1]), 33);
    }

    #[test]
    fn test_progress_rounds_to_nearest() {
        // 2 / 3 = 66.67
        assert_eq!(compute_project_progress(&[package("a", 3, 2)]), 67);
        // 1 / 8 = 12.5
        assert_eq!(compute_project_progress(&[package("a", 8, 1)]), 13);
    }

    #[test]
    fn test_budget_rollup() {
        let mut t1 = task("t1", TaskStatus::NotStarted);
        t1.materials = Arc::new(vec![material(3.0, 10.0)]);
        let mut t2 = task("t2", TaskStatus::NotStarted);
        t2.materials = Arc::new(vec![material(1.0, 5.0), material(2.0, 1.0)]);

        let project = Project {
            name: "Office".to_string(),
            work_packages: vec![
                WorkPackage {
                    id: "wp1".to_string(),
                    name: "Design".to_string(),
                    tasks: vec![t1],
                },
                WorkPackage {
                    id: "wp2".to_string(),
                    name: "Build".to_string(),
                    tasks: vec![t2],
                },
            ],
        };
        assert_eq!(work_package_budget(&project.work_packages[1]), 7.0);
        assert_eq!(project_budget(&project), 37.0);
    }

    #[test]
    fn test_monthly_totals_and_fte() {
        let mut t = task("t1", TaskStatus::InProgress);
        let mut a = ResourceAssignment::new("Ana", "Architect", "Senior");
        a.allocation = Allocation([0.5; MONTHS]);
        let mut b = ResourceAssignment::new("Ben", "Engineer", "Junior");
        b.allocation.0[0] = 1.0;
        t.resources = Arc::new(vec![a.clone(), b]);

        let totals = monthly_totals(&t);
        assert_eq!(totals[0], 1.5);
        assert_eq!(totals[1], 0.5);
        assert_eq!(resource_fte(&a), 0.5);
    }
}
