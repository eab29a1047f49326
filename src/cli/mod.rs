//! CLI command handlers

pub mod commands;

pub use commands::{analyze, columns, OutputFormat};
