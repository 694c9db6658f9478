use crate::error::{PlanError, PlanResult};
use crate::types::{Project, MONTH_LABELS};
use jsonschema::JSONSchema;
use serde_yaml::Value;
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

/// Parse a project file.
///
/// The YAML is checked against the embedded project JSON Schema before it is
/// deserialized, so structural mistakes (unknown keys, a 13-entry allocation,
/// a misspelt status) are reported together rather than one at a time.
///
/// # Example
/// ```no_run
/// use planboard::parser::parse_project;
/// use std::path::Path;
///
/// let project = parse_project(Path::new("project.yaml"))?;
/// println!("Work packages: {}", project.work_packages.len());
/// # Ok::<(), planboard::error::PlanError>(())
/// ```
pub fn parse_project(path: &Path) -> PlanResult<Project> {
    let content = std::fs::read_to_string(path)?;
    parse_project_str(&content)
}

pub fn parse_project_str(content: &str) -> PlanResult<Project> {
    let yaml: Value = serde_yaml::from_str(content)?;
    validate_against_schema(&yaml)?;
    Ok(serde_yaml::from_value(yaml)?)
}

/// Validate YAML against the project JSON Schema
fn validate_against_schema(yaml: &Value) -> PlanResult<()> {
    let schema_str = include_str!("../../schema/project.schema.json");
    let schema_value: serde_json::Value = serde_json::from_str(schema_str)
        .map_err(|e| PlanError::Validation(format!("Failed to parse schema: {}", e)))?;

    let compiled_schema = JSONSchema::compile(&schema_value)
        .map_err(|e| PlanError::Validation(format!("Failed to compile schema: {}", e)))?;

    let json_value: serde_json::Value = serde_json::to_value(yaml)
        .map_err(|e| PlanError::Validation(format!("Failed to convert YAML to JSON: {}", e)))?;

    if let Err(errors) = compiled_schema.validate(&json_value) {
        let error_messages: Vec<String> = errors
            .map(|e| format!("  - {} (at {})", e, e.instance_path))
            .collect();
        return Err(PlanError::Validation(format!(
            "Schema validation failed:\n{}",
            error_messages.join("\n")
        )));
    }

    Ok(())
}

//==============================================================================
// Semantic checks
//==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Issue {
    pub severity: Severity,
    pub message: String,
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(f, "{}: {}", tag, self.message)
    }
}

/// Checks the schema cannot express.
///
/// Errors: duplicate task ids, a task ending before it starts, duplicate
/// material ids within a task. Warnings: allocation fractions outside
/// `[0, 1]`, negative units or prices.
pub fn check_project(project: &Project) -> Vec<Issue> {
    let mut issues = Vec::new();
    let mut task_ids = HashSet::new();

    let error = |message: String| Issue {
        severity: Severity::Error,
        message,
    };
    let warning = |message: String| Issue {
        severity: Severity::Warning,
        message,
    };

    for task in project.tasks() {
        if !task_ids.insert(task.id.as_str()) {
            issues.push(error(format!("duplicate task id '{}'", task.id)));
        }
        if task.end < task.start {
            issues.push(error(format!(
                "task '{}' ends ({}) before it starts ({})",
                task.id, task.end, task.start
            )));
        }

        for (i, resource) in task.resources.iter().enumerate() {
            for month in resource.allocation.out_of_range_months() {
                issues.push(warning(format!(
                    "task '{}' resource #{} ({}) has allocation {} in {} (expected 0..1)",
                    task.id,
                    i,
                    resource.name,
                    resource.allocation.0[month],
                    MONTH_LABELS[month]
                )));
            }
        }

        let mut material_ids = HashSet::new();
        for material in task.materials.iter() {
            if !material_ids.insert(material.id.as_str()) {
                issues.push(error(format!(
                    "task '{}' has duplicate material id '{}'",
                    task.id, material.id
                )));
            }
            if material.units < 0.0 || material.unit_price < 0.0 {
                issues.push(warning(format!(
                    "task '{}' material '{}' has a negative quantity or price",
                    task.id, material.id
                )));
            }
        }
    }

    issues
}
