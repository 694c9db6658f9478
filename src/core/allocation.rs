//! Task edits: allocation cells, materials, resources.
//!
//! Every operation borrows the current task and returns a new snapshot. The
//! collection that is not touched stays shared (`Arc`) with the input, so a
//! snapshot taken before an edit is still valid after it.
//!
//! Indices come from the collection the caller is looking at, so an
//! out-of-range index is a caller bug; it is logged and the task is returned
//! unchanged.

use crate::config::AllocationPolicy;
use crate::error::PlanResult;
use crate::types::{Allocation, Material, MaterialField, ResourceAssignment, Task, MONTHS};
use std::sync::Arc;
use tracing::warn;

/// Parse numeric text input; anything unparseable (or non-finite) is 0.
pub fn parse_number(input: &str) -> f64 {
    input
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Set one allocation cell, storing the parsed value verbatim (no range check).
pub fn set_allocation(task: &Task, resource_index: usize, month_index: usize, value: &str) -> Task {
    write_allocation(task, resource_index, month_index, parse_number(value))
}

/// Like [`set_allocation`], but runs the value through `policy` first.
pub fn set_allocation_checked(
    task: &Task,
    resource_index: usize,
    month_index: usize,
    value: &str,
    policy: AllocationPolicy,
) -> PlanResult<Task> {
    let value = policy.apply(parse_number(value))?;
    Ok(write_allocation(task, resource_index, month_index, value))
}

fn write_allocation(task: &Task, resource_index: usize, month_index: usize, value: f64) -> Task {
    if resource_index >= task.resources.len() || month_index >= MONTHS {
        warn!(
            task = %task.id,
            resource_index,
            month_index,
            "allocation edit out of range; ignored"
        );
        return task.clone();
    }

    let mut next = task.clone();
    Arc::make_mut(&mut next.resources)[resource_index].allocation.0[month_index] = value;
    next
}

/// Append a blank material with a fresh id.
pub fn add_material(task: &Task) -> Task {
    let mut next = task.clone();
    Arc::make_mut(&mut next.materials).push(Material::new());
    next
}

pub fn remove_material(task: &Task, index: usize) -> Task {
    if index >= task.materials.len() {
        warn!(task = %task.id, index, "remove_material out of range; ignored");
        return task.clone();
    }

    let mut next = task.clone();
    Arc::make_mut(&mut next.materials).remove(index);
    next
}

/// Set a single material field. Numeric fields parse `value`; non-numeric
/// input becomes 0.
pub fn change_material_field(task: &Task, index: usize, field: MaterialField, value: &str) -> Task {
    if index >= task.materials.len() {
        warn!(task = %task.id, index, "change_material_field out of range; ignored");
        return task.clone();
    }

    let mut next = task.clone();
    let material = &mut Arc::make_mut(&mut next.materials)[index];
    match field {
        MaterialField::Name => material.name = value.to_string(),
        MaterialField::Units => material.units = parse_number(value),
        MaterialField::UnitPrice => material.unit_price = parse_number(value),
    }
    next
}

/// Append a resource. Its allocation always starts at zero, whatever the
/// incoming value carries.
pub fn add_resource(task: &Task, resource: ResourceAssignment) -> Task {
    let mut next = task.clone();
    Arc::make_mut(&mut next.resources).push(ResourceAssignment {
        allocation: Allocation::zeroed(),
        ..resource
    });
    next
}

pub fn remove_resource(task: &Task, index: usize) -> Task {
    if index >= task.resources.len() {
        warn!(task = %task.id, index, "remove_resource out of range; ignored");
        return task.clone();
    }

    let mut next = task.clone();
    Arc::make_mut(&mut next.resources).remove(index);
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn task_with_one_resource() -> Task {
        let mut task = Task::new(
            "t1",
            "Survey",
            NaiveDate::from_ymd_opt(2025, 1, 6).unwrap(),
            NaiveDate::from_ymd_opt(2025, 2, 14).unwrap(),
        );
        task.resources = Arc::new(vec![ResourceAssignment::new("Ana", "Architect", "Senior")]);
        task.materials = Arc::new(vec![Material {
            id: "m1".to_string(),
            name: "Paint".to_string(),
            units: 3.0,
            unit_price: 10.0,
        }]);
        task
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("0.5"), 0.5);
        assert_eq!(parse_number(" 12 "), 12.0);
        assert_eq!(parse_number("abc"), 0.0);
        assert_eq!(parse_number(""), 0.0);
        assert_eq!(parse_number("NaN"), 0.0);
        assert_eq!(parse_number("inf"), 0.0);
    }

    #[test]
    fn test_set_allocation_single_cell() {
        let task = task_with_one_resource();
        let next = set_allocation(&task, 0, 0, "0.5");

        let mut expected = [0.0; MONTHS];
        expected[0] = 0.5;
        assert_eq!(next.resources[0].allocation.values(), &expected);
        // input snapshot untouched
        assert_eq!(task.resources[0].allocation, Allocation::zeroed());
        // materials shared, not copied
        assert!(Arc::ptr_eq(&task.materials, &next.materials));
    }

    #[test]
    fn test_set_allocation_is_permissive() {
        let task = task_with_one_resource();
        let next = set_allocation(&task, 0, 3, "1.5");
        assert_eq!(next.resources[0].allocation.get(3), Some(1.5));
    }

    #[test]
    fn test_set_allocation_checked_policies() {
        let task = task_with_one_resource();
        assert!(set_allocation_checked(&task, 0, 3, "1.5", AllocationPolicy::Reject).is_err());

        let clamped = set_allocation_checked(&task, 0, 3, "1.5", AllocationPolicy::Clamp).unwrap();
        assert_eq!(clamped.resources[0].allocation.get(3), Some(1.0));

        let kept = set_allocation_checked(&task, 0, 3, "1.5", AllocationPolicy::Permissive).unwrap();
        assert_eq!(kept.resources[0].allocation.get(3), Some(1.5));
    }

    #[test]
    fn test_set_allocation_out_of_range_is_noop() {
        let task = task_with_one_resource();
        assert_eq!(set_allocation(&task, 5, 0, "0.5"), task);
        assert_eq!(set_allocation(&task, 0, 12, "0.5"), task);
    }

    #[test]
    fn test_add_material_is_blank() {
        let task = task_with_one_resource();
        let next = add_material(&task);
        assert_eq!(next.materials.len(), 2);

        let added = &next.materials[1];
        assert!(!added.id.is_empty());
        assert_eq!(added.name, "");
        assert_eq!(added.units, 0.0);
        assert_eq!(added.unit_price, 0.0);
        assert!(Arc::ptr_eq(&task.resources, &next.resources));
    }

    #[test]
    fn test_remove_material() {
        let task = task_with_one_resource();
        let next = remove_material(&task, 0);
        assert!(next.materials.is_empty());
        assert_eq!(task.materials.len(), 1);

        assert_eq!(remove_material(&task, 1), task);
    }

    #[test]
    fn test_change_material_field() {
        let task = task_with_one_resource();

        let next = change_material_field(&task, 0, MaterialField::Name, "Primer");
        assert_eq!(next.materials[0].name, "Primer");

        let next = change_material_field(&next, 0, MaterialField::Units, "4");
        assert_eq!(next.materials[0].units, 4.0);

        let next = change_material_field(&next, 0, MaterialField::UnitPrice, "lots");
        assert_eq!(next.materials[0].unit_price, 0.0);
        // other fields untouched
        assert_eq!(next.materials[0].name, "Primer");
        assert_eq!(next.materials[0].id, "m1");
    }

    #[test]
    fn test_add_resource_resets_allocation() {
        let task = task_with_one_resource();
        let mut incoming = ResourceAssignment::new("Ben", "Engineer", "Junior");
        incoming.allocation = Allocation([1.0; MONTHS]);

        let next = add_resource(&task, incoming);
        assert_eq!(next.resources.len(), 2);
        assert_eq!(next.resources[1].name, "Ben");
        assert_eq!(next.resources[1].allocation, Allocation::zeroed());
    }

    #[test]
    fn test_add_then_remove_resource_restores_original() {
        let task = task_with_one_resource();
        let added = add_resource(&task, ResourceAssignment::new("Ben", "Engineer", "Junior"));
        let restored = remove_resource(&added, 1);
        assert_eq!(restored.resources, task.resources);
        assert_eq!(restored, task);
    }

    #[test]
    fn test_remove_resource_out_of_range_is_noop() {
        let task = task_with_one_resource();
        assert_eq!(remove_resource(&task, 3), task);
    }
}
