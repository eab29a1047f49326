//! Locale-tolerant cell value parsing
//!
//! Ad-platform exports mix native spreadsheet numbers, date serials and
//! formatted strings ("₩1,234", "(1.000,50)", "2024. 1. 2."). Everything here is
//! pure and never panics: numbers fall back to 0, dates to `None`.

use chrono::{Duration, NaiveDate};
use regex::Regex;
use std::sync::OnceLock;

/// Currency markers stripped before numeric parsing
const CURRENCY_MARKS: [char; 7] = ['₩', '￦', '$', '€', '£', '¥', '원'];

/// Largest serial Excel can represent (9999-12-31)
const MAX_DATE_SERIAL: f64 = 2_958_466.0;

/// Numeric cells in this range are compact `YYYYMMDD` dates, not serials
const COMPACT_DATE_RANGE: std::ops::RangeInclusive<f64> = 19_000_101.0..=99_991_231.0;

/// Untyped value as read from a spreadsheet or CSV cell
#[derive(Debug, Clone, PartialEq)]
pub enum RawCell {
    Empty,
    Text(String),
    Number(f64),
    /// Native date cell, kept as its spreadsheet serial
    DateSerial(f64),
}

impl RawCell {
    pub fn is_empty(&self) -> bool {
        match self {
            RawCell::Empty => true,
            RawCell::Text(s) => s.trim().is_empty(),
            RawCell::Number(_) | RawCell::DateSerial(_) => false,
        }
    }

    /// Header-style rendering of the cell
    pub fn to_text(&self) -> String {
        match self {
            RawCell::Empty => String::new(),
            RawCell::Text(s) => s.trim().to_string(),
            RawCell::Number(n) | RawCell::DateSerial(n) => n.to_string(),
        }
    }
}

impl From<&str> for RawCell {
    fn from(s: &str) -> Self {
        if s.trim().is_empty() {
            RawCell::Empty
        } else {
            RawCell::Text(s.to_string())
        }
    }
}

//==============================================================================
// Numbers
//==============================================================================

/// Parse a cell as a number, yielding 0 for empty or non-numeric input.
pub fn parse_number(cell: &RawCell) -> f64 {
    try_parse_number(cell).unwrap_or(0.0)
}

/// Strict variant of [`parse_number`]: `None` when the cell holds text that is
/// not a number. Empty cells parse as 0.
pub fn try_parse_number(cell: &RawCell) -> Option<f64> {
    match cell {
        RawCell::Empty => Some(0.0),
        RawCell::Number(n) => n.is_finite().then_some(*n),
        RawCell::DateSerial(_) => None,
        RawCell::Text(s) if s.trim().is_empty() => Some(0.0),
        RawCell::Text(s) => parse_number_str(s),
    }
}

/// Parse a formatted numeric string.
///
/// When both `,` and `.` appear, whichever comes last is the decimal point.
/// A lone separator type is a decimal point only if it is a single dot;
/// commas and repeated dots are thousands separators.
pub fn parse_number_str(raw: &str) -> Option<f64> {
    let mut s: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && !CURRENCY_MARKS.contains(c))
        .collect();

    let mut negative = false;
    if s.len() >= 2 && s.starts_with('(') && s.ends_with(')') {
        negative = true;
        s = s[1..s.len() - 1].to_string();
    }

    let normalized = match (s.rfind(','), s.rfind('.')) {
        (Some(comma), Some(dot)) if comma > dot => s.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => s.replace(',', ""),
        (Some(_), None) => s.replace(',', ""),
        (None, Some(_)) if s.matches('.').count() > 1 => s.replace('.', ""),
        _ => s,
    };

    if normalized.is_empty() {
        return None;
    }

    let value: f64 = normalized.parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    Some(if negative { -value } else { value })
}

//==============================================================================
// Dates
//==============================================================================

/// Parse a cell as a calendar date. `None` means the value is not a date.
pub fn parse_date(cell: &RawCell) -> Option<NaiveDate> {
    match cell {
        RawCell::Empty => None,
        RawCell::Number(n) => compact_number_to_date(*n).or_else(|| serial_to_date(*n)),
        RawCell::DateSerial(n) => serial_to_date(*n),
        RawCell::Text(s) => parse_date_str(s),
    }
}

/// Convert a spreadsheet date serial (1900 date system) to a date.
///
/// Serial 1 is 1900-01-01. Excel counts a nonexistent 1900-02-29 as serial 60,
/// so serials from 61 on are offset from 1899-12-30.
pub fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 || serial >= MAX_DATE_SERIAL {
        return None;
    }
    let days = serial.floor() as i64;
    let base = if days < 60 {
        NaiveDate::from_ymd_opt(1899, 12, 31)?
    } else {
        NaiveDate::from_ymd_opt(1899, 12, 30)?
    };
    base.checked_add_signed(Duration::days(days))
}

/// Parse the textual date forms found in ad-platform exports.
pub fn parse_date_str(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    // YYYY-MM-DD, YYYY/MM/DD, YYYY.MM.DD, "2024년 1월 2일", datetime prefixes
    if let Some(caps) = ymd_pattern().captures(s) {
        return ymd(&caps[1], &caps[2], &caps[3]);
    }

    // MM/DD/YYYY
    if let Some(caps) = mdy_pattern().captures(s) {
        return ymd(&caps[3], &caps[1], &caps[2]);
    }

    if let Some(date) = compact_ymd(s) {
        return Some(date);
    }

    // Serial number stored as text (CSV re-exports of spreadsheets). A bare
    // year such as "2024" is not a serial.
    if let Ok(serial) = s.parse::<f64>() {
        let whole_digits = s
            .split('.')
            .next()
            .map(|whole| whole.chars().filter(char::is_ascii_digit).count())
            .unwrap_or(0);
        return if whole_digits > 4 || s.contains('.') {
            serial_to_date(serial)
        } else {
            None
        };
    }

    const FALLBACK_FORMATS: [&str; 6] = [
        "%b %d, %Y",
        "%B %d, %Y",
        "%d %b %Y",
        "%d %B %Y",
        "%a, %d %b %Y",
        "%d-%b-%Y",
    ];
    FALLBACK_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| {
            chrono::DateTime::parse_from_rfc2822(s)
                .ok()
                .map(|dt| dt.date_naive())
        })
}

/// Compact `YYYYMMDD`
fn compact_ymd(s: &str) -> Option<NaiveDate> {
    if s.len() != 8 || !s.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    ymd(&s[0..4], &s[4..6], &s[6..8])
}

fn compact_number_to_date(n: f64) -> Option<NaiveDate> {
    if n.fract() != 0.0 || !COMPACT_DATE_RANGE.contains(&n) {
        return None;
    }
    compact_ymd(&(n as u32).to_string())
}

fn ymd(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}

fn ymd_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(\d{4})\s*[-/.년]\s*(\d{1,2})\s*[-/.월]\s*(\d{1,2})(?:\s*일|\.)?(?:$|[\sT])")
            .expect("valid y-m-d pattern")
    })
}

fn mdy_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{4})(?:$|\s)").expect("valid m/d/y pattern")
    })
}
