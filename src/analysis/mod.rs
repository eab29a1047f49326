//! ROAS comparison pipeline
//!
//! Canonical records → current/previous windows → aggregated metrics →
//! deltas → rule-based insight.

pub mod insight;
pub mod metrics;
pub mod period;

pub use insight::explain;
pub use metrics::{aggregate, compare, delta};
pub use period::{split, PeriodSplit};

use crate::error::{RoasError, RoasResult};
use crate::ingest;
use crate::types::{AnalysisResult, CanonicalRecord, Comparison, ComparisonMode, PeriodReport};
use std::path::Path;
use tracing::info;

/// Compare the most recent window of `records` against the one before it.
///
/// Fails with [`RoasError::InsufficientData`] when either window is empty.
pub fn analyze(records: &[CanonicalRecord], mode: ComparisonMode) -> RoasResult<AnalysisResult> {
    let windows = split(records, mode);
    if windows.is_insufficient() {
        return Err(RoasError::InsufficientData {
            mode,
            current_dates: windows.current.date_count(),
            previous_dates: windows.previous.date_count(),
        });
    }
    let PeriodSplit { current, previous } = windows;

    let current_metrics = aggregate(&current.records);
    let previous_metrics = aggregate(&previous.records);
    let deltas = compare(&current_metrics, &previous_metrics);
    let insight = explain(&current_metrics, &previous_metrics, &deltas);

    info!(
        mode = %mode,
        roas_current = current_metrics.roas,
        roas_previous = previous_metrics.roas,
        insight = ?insight.insight_type,
        "analysis complete"
    );

    Ok(AnalysisResult {
        current: PeriodReport::new(current, current_metrics),
        previous: PeriodReport::new(previous, previous_metrics),
        comparison: Comparison {
            current: current_metrics,
            previous: previous_metrics,
            comparison: deltas,
        },
        analysis: insight,
    })
}

/// Ingest a source file and analyze it in one step.
pub async fn analyze_file(path: &Path, mode: ComparisonMode) -> RoasResult<AnalysisResult> {
    let data = ingest::ingest_file(path).await?;
    analyze(&data.records, mode)
}
