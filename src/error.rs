use crate::types::{CanonicalField, ComparisonMode};
use thiserror::Error;

pub type RoasResult<T> = Result<T, RoasError>;

#[derive(Error, Debug)]
pub enum RoasError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not parse source: {0}")]
    StructuralParse(String),

    #[error("Missing required columns: {}", join_fields(.missing))]
    Schema { missing: Vec<CanonicalField> },

    #[error("Row {row}: invalid {field}: {message}")]
    RowValue {
        row: usize,
        field: CanonicalField,
        message: String,
    },

    #[error(
        "Not enough data for a {mode} comparison: current period has {current_dates} date(s), previous period has {previous_dates}"
    )]
    InsufficientData {
        mode: ComparisonMode,
        current_dates: usize,
        previous_dates: usize,
    },

    #[error("Unsupported file format: {0} (expected .xlsx, .xls or .csv)")]
    UnsupportedFormat(String),

    #[error("Source is {size} bytes, above the {limit} byte limit")]
    SourceTooLarge { size: u64, limit: u64 },

    #[error("Export error: {0}")]
    Export(String),
}

impl RoasError {
    /// Stable tag for callers that branch on the failure class.
    pub fn kind(&self) -> &'static str {
        match self {
            RoasError::Io(_) => "io",
            RoasError::StructuralParse(_) => "structural_parse",
            RoasError::Schema { .. } => "schema",
            RoasError::RowValue { .. } => "row_value",
            RoasError::InsufficientData { .. } => "insufficient_data",
            RoasError::UnsupportedFormat(_) => "unsupported_format",
            RoasError::SourceTooLarge { .. } => "source_too_large",
            RoasError::Export(_) => "export",
        }
    }

    /// True for failures caused by the uploaded content itself.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            RoasError::StructuralParse(_) | RoasError::Schema { .. } | RoasError::RowValue { .. }
        )
    }
}

fn join_fields(fields: &[CanonicalField]) -> String {
    fields
        .iter()
        .map(|f| f.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
