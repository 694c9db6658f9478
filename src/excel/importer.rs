//! Workbook importer: spreadsheet bytes → ordered sheets of row records

use crate::error::{PlanError, PlanResult};
use crate::preview::{CellValue, ImportPreview, Row, SheetRecords};
use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use std::collections::{HashMap, HashSet};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Header name given to a header cell with no text
const EMPTY_HEADER: &str = "__EMPTY";

const ACCEPTED_EXTENSIONS: [&str; 2] = ["xlsx", "xls"];

const ACCEPTED_MIME_TYPES: [&str; 2] = [
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/vnd.ms-excel",
];

/// Informal type check on the upload's name and declared MIME type.
///
/// Either one matching is enough. This is not format validation; a file that
/// passes can still fail in [`parse_workbook`].
pub fn check_upload(file_name: &str, mime: Option<&str>) -> PlanResult<()> {
    let extension_ok = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| ACCEPTED_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false);
    let mime_ok = mime
        .map(|m| ACCEPTED_MIME_TYPES.contains(&m.trim()))
        .unwrap_or(false);

    if extension_ok || mime_ok {
        Ok(())
    } else {
        Err(PlanError::Format(file_name.to_string()))
    }
}

/// Parse workbook bytes into one record list per sheet.
///
/// The first row of each sheet's used range is the header row; every later
/// non-blank row becomes one record. Empty cells are left out of the record.
pub fn parse_workbook(bytes: &[u8]) -> PlanResult<ImportPreview> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| PlanError::Parse(format!("Failed to open workbook: {}", e)))?;

    let mut preview = ImportPreview::default();
    let sheet_names = workbook.sheet_names();
    for sheet_name in sheet_names {
        let range = workbook.worksheet_range(&sheet_name).map_err(|e| {
            PlanError::Parse(format!("Failed to read sheet '{}': {}", sheet_name, e))
        })?;
        let rows = sheet_to_records(&range);
        debug!(sheet = %sheet_name, records = rows.len(), "sheet converted");
        preview.sheets.push(SheetRecords {
            name: sheet_name,
            rows,
        });
    }

    Ok(preview)
}

/// Importer bound to a file on disk
pub struct WorkbookImporter {
    path: PathBuf,
}

impl WorkbookImporter {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn import(&self) -> PlanResult<ImportPreview> {
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        check_upload(&file_name, None)?;
        let bytes = std::fs::read(&self.path)?;
        parse_workbook(&bytes)
    }
}

fn sheet_to_records(range: &Range<Data>) -> Vec<Row> {
    let mut rows = range.rows();
    let headers = match rows.next() {
        Some(header_row) => header_names(header_row),
        None => return Vec::new(),
    };

    rows.filter_map(|cells| {
        let mut record = Row::new();
        for (header, cell) in headers.iter().zip(cells) {
            if let Some(value) = cell_value(cell) {
                record.push(header.clone(), value);
            }
        }
        (!record.is_empty()).then_some(record)
    })
    .collect()
}

/// Header text per column. Blank headers become `__EMPTY`; repeats of a name
/// get `_1`, `_2`, ... appended so every header in a sheet is unique.
fn header_names(cells: &[Data]) -> Vec<String> {
    let mut used: HashSet<String> = HashSet::new();
    let mut repeats: HashMap<String, usize> = HashMap::new();

    cells
        .iter()
        .map(|cell| {
            let base = match cell_value(cell) {
                Some(CellValue::Text(s)) => s,
                Some(_) => cell.to_string(),
                None => EMPTY_HEADER.to_string(),
            };

            let mut name = base.clone();
            while used.contains(&name) {
                let n = repeats.entry(base.clone()).or_insert(0);
                *n += 1;
                name = format!("{}_{}", base, n);
            }
            used.insert(name.clone());
            name
        })
        .collect()
}

/// `None` for cells that should be left out of a record
fn cell_value(cell: &Data) -> Option<CellValue> {
    match cell {
        Data::Empty => None,
        Data::String(s) if s.is_empty() => None,
        Data::String(s) => Some(CellValue::Text(s.clone())),
        Data::Int(i) => Some(CellValue::Number(*i as f64)),
        Data::Float(f) => Some(CellValue::Number(*f)),
        Data::Bool(b) => Some(CellValue::Bool(*b)),
        // Spreadsheet serial day number
        Data::DateTime(dt) => Some(CellValue::Number(dt.as_f64())),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Some(CellValue::Text(s.clone())),
        Data::Error(e) => Some(CellValue::Text(e.to_string())),
    }
}
