//! Runtime settings shared by the importer, the allocation editor and the CLI.
//!
//! There is no settings file: defaults live here and the CLI overrides them
//! from flags or `PLANBOARD_*` environment variables.

use crate::error::{PlanError, PlanResult};
use clap::ValueEnum;

/// Nominal upload size guidance (10 MB). Exceeding it only logs a warning.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// Fixed file name of the downloaded import artifact
pub const EXPORT_FILE_NAME: &str = "converted_data.json";

/// What to do with an allocation fraction outside `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum AllocationPolicy {
    /// Accept and store the value verbatim
    Permissive,
    /// Clamp into `[0, 1]`
    Clamp,
    /// Refuse the edit with a validation error
    #[default]
    Reject,
}

impl AllocationPolicy {
    pub fn apply(self, value: f64) -> PlanResult<f64> {
        match self {
            AllocationPolicy::Permissive => Ok(value),
            AllocationPolicy::Clamp => Ok(value.clamp(0.0, 1.0)),
            AllocationPolicy::Reject if (0.0..=1.0).contains(&value) => Ok(value),
            AllocationPolicy::Reject => Err(PlanError::Validation(format!(
                "allocation {} is outside [0, 1]",
                value
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub allocation_policy: AllocationPolicy,
    pub max_upload_bytes: u64,
    pub export_file_name: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            allocation_policy: AllocationPolicy::default(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            export_file_name: EXPORT_FILE_NAME.to_string(),
        }
    }
}

impl Settings {
    pub fn with_policy(mut self, policy: AllocationPolicy) -> Self {
        self.allocation_policy = policy;
        self
    }
}
