//! Ingestion normalizer - raw rows → canonical records, all-or-nothing

use crate::error::{RoasError, RoasResult};
use crate::ingest::columns::{ColumnLookup, ColumnMap, ColumnResolver};
use crate::ingest::reader::{read_rows, RawRow, RawSheet, EMPTY_CELL};
use crate::ingest::source::{check_source, SourceFormat};
use crate::ingest::values::{parse_date, parse_number, try_parse_number, RawCell};
use crate::types::{CanonicalField, CanonicalRecord};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

/// Normalized content of one source
#[derive(Debug, Clone, Serialize)]
pub struct IngestedData {
    pub format: SourceFormat,
    pub columns: ColumnMap,
    /// Records in source row order
    pub records: Vec<CanonicalRecord>,
    /// Data rows seen, including skipped blank rows
    pub rows_read: usize,
    pub blank_rows: usize,
}

/// Header mapping of a source, reported without converting any data row
#[derive(Debug, Clone, Serialize)]
pub struct ColumnReport {
    pub format: SourceFormat,
    pub columns: ColumnLookup,
    /// Required fields with no matching header
    pub missing: Vec<CanonicalField>,
    pub data_rows: usize,
    pub blank_rows: usize,
}

/// Turns spreadsheet/CSV sources into [`CanonicalRecord`]s
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    resolver: ColumnResolver,
}

impl Normalizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resolver(resolver: ColumnResolver) -> Self {
        Self { resolver }
    }

    /// Read a file to completion, then normalize it.
    pub async fn ingest_file(&self, path: &Path) -> RoasResult<IngestedData> {
        let format = check_source(path).await?;
        let bytes = tokio::fs::read(path).await?;
        debug!(path = %path.display(), bytes = bytes.len(), "read source");
        self.ingest_bytes(&bytes, format)
    }

    pub fn ingest_bytes(&self, bytes: &[u8], format: SourceFormat) -> RoasResult<IngestedData> {
        let sheet = read_rows(bytes, format)?;
        let (columns, records, blank_rows) = self.normalize(&sheet)?;

        info!(
            format = %format,
            rows = sheet.rows.len(),
            records = records.len(),
            blank_rows,
            "ingested source"
        );

        Ok(IngestedData {
            format,
            columns,
            records,
            rows_read: sheet.rows.len(),
            blank_rows,
        })
    }

    /// Read a file and match its headers. Data rows are counted, not parsed.
    pub async fn inspect_file(&self, path: &Path) -> RoasResult<ColumnReport> {
        let format = check_source(path).await?;
        let bytes = tokio::fs::read(path).await?;
        self.inspect_bytes(&bytes, format)
    }

    pub fn inspect_bytes(&self, bytes: &[u8], format: SourceFormat) -> RoasResult<ColumnReport> {
        let sheet = read_rows(bytes, format)?;
        let columns = self.resolver.lookup(&sheet.headers);
        let missing = columns.missing_required();
        let blank_rows = sheet.rows.iter().filter(|row| row.is_blank()).count();

        debug!(
            format = %format,
            found = columns.found.len(),
            missing = missing.len(),
            "inspected headers"
        );

        Ok(ColumnReport {
            format,
            columns,
            missing,
            data_rows: sheet.rows.len() - blank_rows,
            blank_rows,
        })
    }

    /// Resolve columns once, then convert every non-blank row.
    ///
    /// The first bad row aborts the whole sheet.
    pub fn normalize(
        &self,
        sheet: &RawSheet,
    ) -> RoasResult<(ColumnMap, Vec<CanonicalRecord>, usize)> {
        let columns = self.resolver.resolve(&sheet.headers)?;

        let mut records = Vec::with_capacity(sheet.rows.len());
        let mut blank_rows = 0;
        for row in &sheet.rows {
            if row.is_blank() {
                blank_rows += 1;
                continue;
            }
            records.push(record_from_row(row, &columns)?);
        }

        Ok((columns, records, blank_rows))
    }
}

/// Ingest a file with the default column aliases.
pub async fn ingest_file(path: &Path) -> RoasResult<IngestedData> {
    Normalizer::new().ingest_file(path).await
}

/// Match a file's headers with the default column aliases.
pub async fn inspect_file(path: &Path) -> RoasResult<ColumnReport> {
    Normalizer::new().inspect_file(path).await
}

/// Ingest in-memory content with the default column aliases.
pub fn ingest_bytes(bytes: &[u8], format: SourceFormat) -> RoasResult<IngestedData> {
    Normalizer::new().ingest_bytes(bytes, format)
}

fn record_from_row(row: &RawRow, columns: &ColumnMap) -> RoasResult<CanonicalRecord> {
    let date_cell = cell_for(row, columns, CanonicalField::Date);
    let date = parse_date(date_cell).ok_or_else(|| RoasError::RowValue {
        row: row.number,
        field: CanonicalField::Date,
        message: if date_cell.is_empty() {
            "date cell is empty".to_string()
        } else {
            format!("'{}' is not a recognizable date", date_cell.to_text())
        },
    })?;

    Ok(CanonicalRecord {
        date,
        ad_spend: required_number(row, columns, CanonicalField::AdSpend)?,
        revenue: required_number(row, columns, CanonicalField::Revenue)?,
        conversions: required_number(row, columns, CanonicalField::Conversions)?,
        clicks: required_number(row, columns, CanonicalField::Clicks)?,
        impressions: parse_number(cell_for(row, columns, CanonicalField::Impressions)),
    })
}

fn cell_for<'a>(row: &'a RawRow, columns: &ColumnMap, field: CanonicalField) -> &'a RawCell {
    match columns.index(field) {
        Some(index) => row.cell(index),
        None => &EMPTY_CELL,
    }
}

fn required_number(row: &RawRow, columns: &ColumnMap, field: CanonicalField) -> RoasResult<f64> {
    let cell = cell_for(row, columns, field);
    try_parse_number(cell).ok_or_else(|| RoasError::RowValue {
        row: row.number,
        field,
        message: format!("'{}' is not a number", cell.to_text()),
    })
}
