//! CLI command handlers

pub mod commands;

pub use commands::{
    allocate, export, import, material, resource, summary, validate, watch, MaterialEdit,
    ResourceEdit,
};
