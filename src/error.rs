use thiserror::Error;

pub type PlanResult<T> = Result<T, PlanError>;

#[derive(Error, Debug)]
pub enum PlanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The upload is not a spreadsheet workbook (by name or type)
    #[error("Unsupported file type: {0}")]
    Format(String),

    /// The upload looks like a workbook but cannot be decoded
    #[error("Workbook parse error: {0}")]
    Parse(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Excel export error: {0}")]
    Export(String),
}

impl PlanError {
    /// Short message suitable for an inline notice next to the upload area
    pub fn user_message(&self) -> String {
        match self {
            PlanError::Format(_) => "Please upload a valid Excel file (.xlsx or .xls)".to_string(),
            PlanError::Parse(_) => "Error parsing the Excel file. Check the file format.".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<rust_xlsxwriter::XlsxError> for PlanError {
    fn from(e: rust_xlsxwriter::XlsxError) -> Self {
        PlanError::Export(e.to_string())
    }
}
