//! Planboard - project planning data model and spreadsheet import
//!
//! This library converts spreadsheet workbooks into ordered per-sheet record
//! lists, and models a project's tasks with their resource × month
//! allocations and materials.
//!
//! # Features
//!
//! - Workbook import (xlsx, xls, xlsb, ods) to deterministic pretty JSON
//! - Copy-on-write task edits (allocation cells, materials, resources)
//! - Budget and progress rollups
//! - Task edit panel with undo/redo
//! - Allocation matrix export to .xlsx
//!
//! # Example
//!
//! ```no_run
//! use planboard::excel::parse_workbook;
//! use planboard::preview::serialize;
//!
//! let bytes = std::fs::read("roster.xlsx")?;
//! let preview = parse_workbook(&bytes)?;
//!
//! println!("Sheets: {}", preview.sheets.len());
//! println!("{}", serialize(&preview)?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod excel;
pub mod parser;
pub mod preview;
pub mod types;
pub mod writer;

// Re-export commonly used types
pub use error::{PlanError, PlanResult};
pub use preview::{CellValue, ImportPreview, ImportSession, Row, SheetRecords};
pub use types::{Allocation, Material, Project, ResourceAssignment, Task, WorkPackage};
