//! Spreadsheet/CSV ingestion
//!
//! Turns ad-platform exports into canonical records:
//! - Source gate: format detection, extension allow-list, size limit
//! - Reader: first sheet of a workbook, or naive comma-split text
//! - Column resolver: variant headers → canonical fields
//! - Value parser: locale-tolerant numbers and dates

pub mod columns;
pub mod normalizer;
pub mod reader;
pub mod source;
pub mod values;

pub use columns::{ColumnLookup, ColumnMap, ColumnResolver, ResolvedColumn};
pub use normalizer::{
    ingest_bytes, ingest_file, inspect_file, ColumnReport, IngestedData, Normalizer,
};
pub use reader::{read_rows, RawRow, RawSheet};
pub use source::{check_size, check_source, SourceFormat, MAX_SOURCE_BYTES};
pub use values::{parse_date, parse_number, serial_to_date, try_parse_number, RawCell};
