//! Import preview: the parsed workbook as ordered sheets of row records, its
//! JSON serialization, and the session state of one import screen.

use crate::config::Settings;
use crate::error::{PlanError, PlanResult};
use crate::excel::{check_upload, parse_workbook};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Largest integer an f64 represents exactly (2^53)
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

//==============================================================================
// Records
//==============================================================================

/// A single non-empty cell value
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Bool(bool),
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CellValue::Text(s) => serializer.serialize_str(s),
            CellValue::Bool(b) => serializer.serialize_bool(*b),
            // Integral values print as `3`, not `3.0`
            CellValue::Number(n) if n.fract() == 0.0 && n.abs() < MAX_SAFE_INTEGER => {
                serializer.serialize_i64(*n as i64)
            }
            CellValue::Number(n) => serializer.serialize_f64(*n),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

/// One data row: header → value, in column order. Empty cells are absent.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    cells: Vec<(String, CellValue)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Headers are unique per sheet, so this never shadows an earlier cell.
    pub fn push(&mut self, header: impl Into<String>, value: CellValue) {
        self.cells.push((header.into(), value));
    }

    pub fn get(&self, header: &str) -> Option<&CellValue> {
        self.cells.iter().find(|(h, _)| h == header).map(|(_, v)| v)
    }

    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(h, _)| h.as_str())
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (header, value) in &self.cells {
            map.serialize_entry(header, value)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SheetRecords {
    pub name: String,
    pub rows: Vec<Row>,
}

/// Parsed workbook, sheets in declared workbook order.
///
/// Serializes as a JSON object keyed by sheet name; an empty preview is `{}`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ImportPreview {
    pub sheets: Vec<SheetRecords>,
}

impl ImportPreview {
    pub fn sheet(&self, name: &str) -> Option<&SheetRecords> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn record_count(&self) -> usize {
        self.sheets.iter().map(|s| s.rows.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }
}

impl Serialize for ImportPreview {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.sheets.len()))?;
        for sheet in &self.sheets {
            map.serialize_entry(&sheet.name, &sheet.rows)?;
        }
        map.end()
    }
}

/// Pretty JSON (2-space indent). Copy and download both go through here, so
/// their output is byte-identical.
pub fn serialize(preview: &ImportPreview) -> PlanResult<String> {
    Ok(serde_json::to_string_pretty(preview)?)
}

//==============================================================================
// Session
//==============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    pub sheet_count: usize,
    pub record_count: usize,
    /// (sheet name, record count)
    pub per_sheet: Vec<(String, usize)>,
}

/// Preview state of one import screen.
///
/// A successful load replaces the preview (last write wins). A failed load
/// records a user-facing message and keeps whatever preview was there before.
#[derive(Debug, Default)]
pub struct ImportSession {
    settings: Settings,
    source: Option<String>,
    preview: Option<ImportPreview>,
    last_error: Option<String>,
}

impl ImportSession {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    pub fn load(
        &mut self,
        file_name: &str,
        mime: Option<&str>,
        bytes: &[u8],
    ) -> PlanResult<&ImportPreview> {
        if bytes.len() as u64 > self.settings.max_upload_bytes {
            warn!(
                file = file_name,
                size = bytes.len(),
                limit = self.settings.max_upload_bytes,
                "upload exceeds the recommended size"
            );
        }

        let parsed = check_upload(file_name, mime).and_then(|_| parse_workbook(bytes));
        match parsed {
            Ok(preview) => {
                info!(
                    file = file_name,
                    sheets = preview.sheets.len(),
                    records = preview.record_count(),
                    "workbook loaded"
                );
                self.source = Some(file_name.to_string());
                self.last_error = None;
                Ok(&*self.preview.insert(preview))
            }
            Err(e) => {
                match &e {
                    PlanError::Format(_) => debug!(file = file_name, "rejected upload: {}", e),
                    _ => error!(file = file_name, "failed to load workbook: {}", e),
                }
                self.last_error = Some(e.user_message());
                Err(e)
            }
        }
    }

    /// Read a file from disk and load it
    pub fn load_path(&mut self, path: &Path) -> PlanResult<&ImportPreview> {
        let bytes = fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.load(&file_name, None, &bytes)
    }

    pub fn clear(&mut self) {
        self.source = None;
        self.preview = None;
        self.last_error = None;
    }

    pub fn preview(&self) -> Option<&ImportPreview> {
        self.preview.as_ref()
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn summary(&self) -> Option<ImportSummary> {
        self.preview.as_ref().map(|p| ImportSummary {
            sheet_count: p.sheets.len(),
            record_count: p.record_count(),
            per_sheet: p
                .sheets
                .iter()
                .map(|s| (s.name.clone(), s.rows.len()))
                .collect(),
        })
    }

    /// Serialized preview, as placed on the clipboard
    pub fn copy_text(&self) -> PlanResult<String> {
        let preview = self
            .preview
            .as_ref()
            .ok_or_else(|| PlanError::Validation("no workbook loaded".to_string()))?;
        serialize(preview)
    }

    /// Write the serialized preview into `dir` under the fixed export name
    pub fn download(&self, dir: &Path) -> PlanResult<PathBuf> {
        let text = self.copy_text()?;
        let path = dir.join(&self.settings.export_file_name);
        fs::write(&path, text)?;
        debug!(path = %path.display(), "preview written");
        Ok(path)
    }
}
