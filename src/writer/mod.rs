use crate::error::PlanResult;
use crate::types::Project;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Write a project back to its YAML file.
///
/// When the file already exists it is first copied to `<name>.yaml.bak`.
/// Returns the backup path, if one was made.
pub fn write_project(path: &Path, project: &Project) -> PlanResult<Option<PathBuf>> {
    let backup = if path.exists() {
        let backup_path = path.with_extension("yaml.bak");
        fs::copy(path, &backup_path)?;
        debug!(backup = %backup_path.display(), "backup written");
        Some(backup_path)
    } else {
        None
    };

    fs::write(path, to_yaml(project)?)?;
    Ok(backup)
}

pub fn to_yaml(project: &Project) -> PlanResult<String> {
    Ok(serde_yaml::to_string(project)?)
}
