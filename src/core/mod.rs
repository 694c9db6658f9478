//! Allocation model: task edits, derived totals, and the edit panel

pub mod allocation;
pub mod budget;
pub mod editor;

pub use allocation::{
    add_material, add_resource, change_material_field, remove_material, remove_resource,
    set_allocation, set_allocation_checked,
};
pub use budget::{
    compute_materials_total, compute_project_progress, monthly_totals, project_budget,
    resource_fte, task_budget, work_package_budget, work_package_progress,
};
pub use editor::{PanelState, TaskEditor};
