//! Period splitting - current vs. previous comparison windows

use crate::types::{CanonicalRecord, ComparisonMode, Period};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Both sides of a comparison
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PeriodSplit {
    pub current: Period,
    pub previous: Period,
}

impl PeriodSplit {
    /// True when either window has no records
    pub fn is_insufficient(&self) -> bool {
        self.current.is_empty() || self.previous.is_empty()
    }
}

/// Split records into the most recent window and the one before it.
///
/// Same-day rows are kept as separate records. Windows are counted in
/// distinct dates, so a short history leaves the previous (or both) windows
/// partially filled or empty.
pub fn split(records: &[CanonicalRecord], mode: ComparisonMode) -> PeriodSplit {
    let mut by_date: BTreeMap<NaiveDate, Vec<&CanonicalRecord>> = BTreeMap::new();
    for record in records {
        by_date.entry(record.date).or_default().push(record);
    }

    // Most recent first
    let dates: Vec<NaiveDate> = by_date.keys().rev().copied().collect();
    let window = mode.window_len();

    let current_dates = dates.iter().take(window).copied().collect::<Vec<_>>();
    let previous_dates = dates
        .iter()
        .skip(window)
        .take(window)
        .copied()
        .collect::<Vec<_>>();

    if mode == ComparisonMode::Week && dates.len() < window * 2 {
        warn!(
            distinct_dates = dates.len(),
            needed = window * 2,
            "not enough history to fill both weekly windows"
        );
    }

    let current = build_period(&by_date, &current_dates);
    let previous = build_period(&by_date, &previous_dates);

    for (name, period) in [("current", &current), ("previous", &previous)] {
        debug!(
            mode = %mode,
            window = name,
            start = ?period.start_date,
            end = ?period.end_date,
            dates = period.date_count(),
            records = period.records.len(),
            "period boundaries"
        );
    }

    PeriodSplit { current, previous }
}

fn build_period(by_date: &BTreeMap<NaiveDate, Vec<&CanonicalRecord>>, dates: &[NaiveDate]) -> Period {
    let mut ascending = dates.to_vec();
    ascending.sort();

    let records = ascending
        .iter()
        .filter_map(|date| by_date.get(date))
        .flat_map(|day| day.iter().map(|r| (*r).clone()))
        .collect();

    Period {
        start_date: ascending.first().copied(),
        end_date: ascending.last().copied(),
        records,
    }
}
