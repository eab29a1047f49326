//! RoasLens - ROAS change analysis for ad-platform spreadsheet exports
//!
//! Reads a daily performance export (.xlsx, .xls or .csv), maps its
//! platform-specific headers onto canonical fields, compares the most recent
//! day or week against the one before it and explains the ROAS movement with
//! a small rule engine.
//!
//! # Features
//!
//! - Header aliases for Korean and English exports (Naver, Kakao, Google, Meta)
//! - Locale-tolerant numbers (currency marks, thousands separators) and dates
//! - Day-over-day and week-over-week comparison windows
//! - Aggregated ROAS, CVR, CPC, AOV, CTR and CPA with signed deltas
//! - Deterministic positive / negative / neutral insights
//!
//! # Example
//!
//! ```no_run
//! use roaslens::analysis::analyze_file;
//! use roaslens::types::ComparisonMode;
//! use std::path::Path;
//!
//! # async fn run() -> roaslens::RoasResult<()> {
//! let result = analyze_file(Path::new("report.xlsx"), ComparisonMode::Week).await?;
//!
//! println!("ROAS: {:.2} → {:.2}", result.comparison.previous.roas, result.comparison.current.roas);
//! println!("{}", result.analysis.main_reason);
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod api;
pub mod cli;
pub mod error;
pub mod ingest;
pub mod types;

// Re-export commonly used types
pub use error::{RoasError, RoasResult};
pub use types::{
    AggregatedMetrics, AnalysisResult, CanonicalField, CanonicalRecord, ComparisonMode, Insight,
    InsightType, Metric, MetricDelta, Period,
};
