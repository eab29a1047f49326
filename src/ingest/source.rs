//! Source format detection and upload constraints

use crate::error::{RoasError, RoasResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Largest accepted source file (10 MiB)
pub const MAX_SOURCE_BYTES: u64 = 10 * 1024 * 1024;

const ZIP_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];
const OLE_MAGIC: [u8; 4] = [0xD0, 0xCF, 0x11, 0xE0];

/// Encodings the normalizer can read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    /// Office Open XML workbook
    Xlsx,
    /// Legacy BIFF workbook
    Xls,
    /// Comma-separated text
    Csv,
}

impl SourceFormat {
    /// Format from a file extension on the allow-list
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "xlsx" | "xlsm" => Some(SourceFormat::Xlsx),
            "xls" => Some(SourceFormat::Xls),
            "csv" => Some(SourceFormat::Csv),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> RoasResult<Self> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        Self::from_extension(ext).ok_or_else(|| {
            RoasError::UnsupportedFormat(if ext.is_empty() {
                path.display().to_string()
            } else {
                format!(".{}", ext)
            })
        })
    }

    /// Guess the format from leading magic bytes; anything else is text.
    pub fn sniff(bytes: &[u8]) -> Self {
        if bytes.starts_with(&ZIP_MAGIC) {
            SourceFormat::Xlsx
        } else if bytes.starts_with(&OLE_MAGIC) {
            SourceFormat::Xls
        } else {
            SourceFormat::Csv
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SourceFormat::Xlsx => "xlsx",
            SourceFormat::Xls => "xls",
            SourceFormat::Csv => "csv",
        };
        f.write_str(s)
    }
}

/// Check extension and size before reading a source from disk.
pub async fn check_source(path: &Path) -> RoasResult<SourceFormat> {
    let format = SourceFormat::from_path(path)?;
    let size = tokio::fs::metadata(path).await?.len();
    check_size(size)?;
    Ok(format)
}

pub fn check_size(size: u64) -> RoasResult<()> {
    if size > MAX_SOURCE_BYTES {
        return Err(RoasError::SourceTooLarge {
            size,
            limit: MAX_SOURCE_BYTES,
        });
    }
    Ok(())
}
