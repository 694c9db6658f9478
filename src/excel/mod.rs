//! Spreadsheet import/export
//!
//! - Import: workbook bytes (xlsx, xls, xlsb, ods) → ordered sheets of records
//! - Export: a task's allocation matrix and materials → .xlsx

mod exporter;
mod importer;

pub use exporter::{AllocationExporter, ALLOCATION_SHEET, MATERIALS_SHEET};
pub use importer::{check_upload, parse_workbook, WorkbookImporter};
