use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Months in an allocation vector
pub const MONTHS: usize = 12;

/// Short month labels, index 0 = January
pub const MONTH_LABELS: [&str; MONTHS] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

//==============================================================================
// Resource Allocation
//==============================================================================

/// Fraction of full-time allocation per calendar month.
///
/// The length is fixed by the type: a project file carrying any other number of
/// entries fails to deserialize. Values are expected in `[0, 1]` but the vector
/// itself does not enforce the range (see [`crate::config::AllocationPolicy`]).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Allocation(pub [f64; MONTHS]);

impl Allocation {
    pub fn zeroed() -> Self {
        Self([0.0; MONTHS])
    }

    pub fn get(&self, month: usize) -> Option<f64> {
        self.0.get(month).copied()
    }

    pub fn values(&self) -> &[f64; MONTHS] {
        &self.0
    }

    /// Sum of all months (person-months)
    pub fn total(&self) -> f64 {
        self.0.iter().sum()
    }

    /// Months whose value falls outside `[0, 1]`
    pub fn out_of_range_months(&self) -> Vec<usize> {
        self.0
            .iter()
            .enumerate()
            .filter(|(_, v)| !(0.0..=1.0).contains(*v))
            .map(|(i, _)| i)
            .collect()
    }
}

/// A person assigned to a task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceAssignment {
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub profile: String,
    #[serde(default)]
    pub allocation: Allocation,
}

impl ResourceAssignment {
    pub fn new(name: impl Into<String>, role: impl Into<String>, profile: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: role.into(),
            profile: profile.into(),
            allocation: Allocation::zeroed(),
        }
    }
}

//==============================================================================
// Materials
//==============================================================================

/// A purchasable line item on a task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub units: f64,
    #[serde(default)]
    pub unit_price: f64,
}

impl Material {
    /// Blank material with a freshly generated id
    pub fn new() -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: String::new(),
            units: 0.0,
            unit_price: 0.0,
        }
    }

    /// units × unit_price (never stored)
    pub fn line_total(&self) -> f64 {
        self.units * self.unit_price
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::new()
    }
}

/// Editable material fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterialField {
    Name,
    Units,
    UnitPrice,
}

impl std::str::FromStr for MaterialField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "name" => Ok(MaterialField::Name),
            "units" => Ok(MaterialField::Units),
            "unit_price" | "unitprice" | "price" => Ok(MaterialField::UnitPrice),
            other => Err(format!(
                "unknown material field '{}' (expected name, units or unit_price)",
                other
            )),
        }
    }
}

//==============================================================================
// Timeline
//==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
}

/// A task on the project timeline.
///
/// `resources` and `materials` sit behind `Arc` so that an edit to one
/// collection produces a snapshot that still shares the other with its
/// predecessor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub name: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub resources: Arc<Vec<ResourceAssignment>>,
    #[serde(default)]
    pub materials: Arc<Vec<Material>>,
}

impl Task {
    pub fn new(id: impl Into<String>, name: impl Into<String>, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            start,
            end,
            status: TaskStatus::NotStarted,
            resources: Arc::new(Vec::new()),
            materials: Arc::new(Vec::new()),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }

    /// Duration in days, inclusive of both ends
    pub fn duration_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkPackage {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    #[serde(default)]
    pub work_packages: Vec<WorkPackage>,
}

impl Project {
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.work_packages.iter().flat_map(|wp| wp.tasks.iter())
    }

    pub fn find_task(&self, task_id: &str) -> Option<&Task> {
        self.tasks().find(|t| t.id == task_id)
    }

    /// Copy of the project with `task` swapped in for the task sharing its id.
    /// Returns `None` when no task has that id.
    pub fn with_task(&self, task: Task) -> Option<Project> {
        let mut next = self.clone();
        let slot = next
            .work_packages
            .iter_mut()
            .flat_map(|wp| wp.tasks.iter_mut())
            .find(|t| t.id == task.id)?;
        *slot = task;
        Some(next)
    }
}
