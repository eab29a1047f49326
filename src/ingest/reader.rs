//! Raw row extraction - workbook (.xlsx/.xls, first sheet) or CSV → header + cells

use crate::error::{RoasError, RoasResult};
use crate::ingest::source::SourceFormat;
use crate::ingest::values::RawCell;
use calamine::{Data, Range, Reader, Xls, Xlsx};
use encoding_rs::EUC_KR;
use std::io::{Cursor, Read, Seek};

const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// Stand-in for cells past the end of a short row
pub(crate) static EMPTY_CELL: RawCell = RawCell::Empty;

/// One data row with its 1-based position in the source (header = row 1)
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    pub number: usize,
    pub cells: Vec<RawCell>,
}

impl RawRow {
    pub fn cell(&self, index: usize) -> &RawCell {
        self.cells.get(index).unwrap_or(&EMPTY_CELL)
    }

    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(RawCell::is_empty)
    }
}

/// Header row plus data rows of a single table
#[derive(Debug, Clone, PartialEq)]
pub struct RawSheet {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

/// Decode a whole source into rows.
pub fn read_rows(bytes: &[u8], format: SourceFormat) -> RoasResult<RawSheet> {
    match format {
        SourceFormat::Xlsx => {
            let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))
                .map_err(|e| structural(format, format!("failed to open workbook: {}", e)))?;
            sheet_from_range(&first_sheet(&mut workbook, format)?)
        }
        SourceFormat::Xls => {
            let mut workbook: Xls<_> = Xls::new(Cursor::new(bytes))
                .map_err(|e| structural(format, format!("failed to open workbook: {}", e)))?;
            sheet_from_range(&first_sheet(&mut workbook, format)?)
        }
        SourceFormat::Csv => read_csv(bytes),
    }
}

fn structural(format: SourceFormat, message: String) -> RoasError {
    RoasError::StructuralParse(format!("{}: {}", format, message))
}

fn first_sheet<RS, R>(workbook: &mut R, format: SourceFormat) -> RoasResult<Range<Data>>
where
    RS: Read + Seek,
    R: Reader<RS>,
    R::Error: std::fmt::Display,
{
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| structural(format, "workbook has no sheets".to_string()))?
        .map_err(|e| structural(format, format!("failed to read first sheet: {}", e)))?;

    if range.is_empty() {
        return Err(structural(format, "first sheet is empty".to_string()));
    }
    Ok(range)
}

fn sheet_from_range(range: &Range<Data>) -> RoasResult<RawSheet> {
    // Range starts at the first used cell, which need not be A1
    let (start_row, _) = range.start().unwrap_or((0, 0));
    let mut rows = range.rows();

    let headers = rows
        .next()
        .map(|header| header.iter().map(|cell| cell.to_string().trim().to_string()).collect())
        .unwrap_or_default();

    let rows = rows
        .enumerate()
        .map(|(i, cells)| RawRow {
            number: start_row as usize + i + 2,
            cells: cells.iter().map(to_raw_cell).collect(),
        })
        .collect();

    Ok(RawSheet { headers, rows })
}

fn to_raw_cell(cell: &Data) -> RawCell {
    match cell {
        Data::Int(i) => RawCell::Number(*i as f64),
        Data::Float(f) => RawCell::Number(*f),
        Data::String(s) if s.trim().is_empty() => RawCell::Empty,
        Data::String(s) => RawCell::Text(s.clone()),
        Data::Bool(b) => RawCell::Text(b.to_string()),
        Data::DateTime(dt) => RawCell::DateSerial(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => RawCell::Text(s.clone()),
        Data::Error(_) | Data::Empty => RawCell::Empty,
    }
}

/// Naive CSV: split on every comma and drop double quotes.
///
/// Quoted fields containing commas are not supported and will shift columns.
fn read_csv(bytes: &[u8]) -> RoasResult<RawSheet> {
    let text = decode_text(bytes)?;

    let mut lines = text
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty());

    let headers = match lines.next() {
        Some((_, line)) => split_line(line)
            .into_iter()
            .map(|cell| cell.to_text())
            .collect(),
        None => {
            return Err(structural(
                SourceFormat::Csv,
                "no header row found".to_string(),
            ))
        }
    };

    let rows = lines
        .map(|(i, line)| RawRow {
            number: i + 1,
            cells: split_line(line),
        })
        .collect();

    Ok(RawSheet { headers, rows })
}

fn split_line(line: &str) -> Vec<RawCell> {
    line.split(',')
        .map(|field| RawCell::from(field.replace('"', "").trim()))
        .collect()
}

/// UTF-8 (BOM optional), falling back to EUC-KR for legacy Korean exports
fn decode_text(bytes: &[u8]) -> RoasResult<String> {
    let bytes = bytes.strip_prefix(&UTF8_BOM).unwrap_or(bytes);
    if let Ok(text) = std::str::from_utf8(bytes) {
        return Ok(text.to_string());
    }

    let (text, _, had_errors) = EUC_KR.decode(bytes);
    if had_errors {
        return Err(structural(
            SourceFormat::Csv,
            "text is neither UTF-8 nor EUC-KR".to_string(),
        ));
    }
    Ok(text.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_read_csv_headers_and_row_numbers() {
        let csv = "date,cost,revenue\n2024-01-01,100,300\n\n2024-01-02,\"1,000\",600\n";
        let sheet = read_rows(csv.as_bytes(), SourceFormat::Csv).unwrap();

        assert_eq!(sheet.headers, vec!["date", "cost", "revenue"]);
        assert_eq!(sheet.rows.len(), 2);
        assert_eq!(sheet.rows[0].number, 2);
        // blank line 3 is skipped but numbering follows the file
        assert_eq!(sheet.rows[1].number, 4);
    }

    #[test]
    fn test_read_csv_naive_split_shifts_quoted_commas() {
        let csv = "date,cost\n2024-01-01,\"1,000\"\n";
        let sheet = read_rows(csv.as_bytes(), SourceFormat::Csv).unwrap();
        let row = &sheet.rows[0];
        assert_eq!(row.cells.len(), 3);
        assert_eq!(row.cell(1), &RawCell::Text("1".to_string()));
        assert_eq!(row.cell(2), &RawCell::Text("000".to_string()));
    }

    #[test]
    fn test_read_csv_strips_bom_and_crlf() {
        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend_from_slice(b"date,cost\r\n2024-01-01,5\r\n");
        let sheet = read_rows(&bytes, SourceFormat::Csv).unwrap();
        assert_eq!(sheet.headers, vec!["date", "cost"]);
        assert_eq!(sheet.rows[0].cell(1), &RawCell::Text("5".to_string()));
    }

    #[test]
    fn test_read_csv_euc_kr_fallback() {
        let (encoded, _, _) = EUC_KR.encode("일자,광고비\n2024-01-01,100\n");
        assert!(std::str::from_utf8(&encoded).is_err());

        let sheet = read_rows(&encoded, SourceFormat::Csv).unwrap();
        assert_eq!(sheet.headers, vec!["일자", "광고비"]);
    }

    #[test]
    fn test_read_csv_empty_source() {
        let err = read_rows(b"\n  \n", SourceFormat::Csv).unwrap_err();
        assert_eq!(err.kind(), "structural_parse");
    }

    #[test]
    fn test_corrupt_workbook_is_structural_error() {
        let err = read_rows(b"PK\x03\x04 not really a zip", SourceFormat::Xlsx).unwrap_err();
        assert_eq!(err.kind(), "structural_parse");

        let err = read_rows(b"plain text", SourceFormat::Xls).unwrap_err();
        assert_eq!(err.kind(), "structural_parse");
    }

    #[test]
    fn test_blank_row_detection() {
        let row = RawRow {
            number: 3,
            cells: vec![RawCell::Empty, RawCell::Text("  ".to_string())],
        };
        assert!(row.is_blank());
        assert_eq!(row.cell(10), &RawCell::Empty);
    }

    #[test]
    fn test_to_raw_cell() {
        assert_eq!(to_raw_cell(&Data::Int(3)), RawCell::Number(3.0));
        assert_eq!(to_raw_cell(&Data::Float(1.5)), RawCell::Number(1.5));
        assert_eq!(to_raw_cell(&Data::String(" ".to_string())), RawCell::Empty);
        assert_eq!(to_raw_cell(&Data::Empty), RawCell::Empty);
    }
}
