//! Derived marketing metrics and period-over-period deltas

use crate::types::{AggregatedMetrics, CanonicalRecord, Direction, Metric, MetricDelta, MetricDeltas};
use tracing::debug;

/// Sum a record set and derive its ratio metrics.
pub fn aggregate(records: &[CanonicalRecord]) -> AggregatedMetrics {
    let (ad_spend, revenue, conversions, clicks, impressions) = records.iter().fold(
        (0.0, 0.0, 0.0, 0.0, 0.0),
        |(s, r, cv, cl, im), rec| {
            (
                s + rec.ad_spend,
                r + rec.revenue,
                cv + rec.conversions,
                cl + rec.clicks,
                im + rec.impressions,
            )
        },
    );

    let metrics = AggregatedMetrics {
        ad_spend,
        revenue,
        conversions,
        clicks,
        impressions,
        roas: ratio(revenue, ad_spend),
        cvr: ratio(conversions, clicks) * 100.0,
        cpc: ratio(ad_spend, clicks),
        aov: ratio(revenue, conversions),
        ctr: ratio(clicks, impressions) * 100.0,
        cpa: ratio(ad_spend, conversions),
    };

    debug!(
        records = records.len(),
        ad_spend = metrics.ad_spend,
        revenue = metrics.revenue,
        conversions = metrics.conversions,
        clicks = metrics.clicks,
        impressions = metrics.impressions,
        roas = metrics.roas,
        "aggregated metrics"
    );

    metrics
}

/// Delta of every compared metric, current against previous.
pub fn compare(current: &AggregatedMetrics, previous: &AggregatedMetrics) -> MetricDeltas {
    Metric::ALL
        .iter()
        .map(|&metric| (metric, delta(current.value(metric), previous.value(metric))))
        .collect()
}

/// Change between two values; percentage is 0 when there is no baseline.
pub fn delta(current: f64, previous: f64) -> MetricDelta {
    let value = current - previous;
    let percentage = if previous == 0.0 {
        0.0
    } else {
        value / previous * 100.0
    };
    let direction = if current > previous {
        Direction::Increase
    } else if current < previous {
        Direction::Decrease
    } else {
        Direction::Neutral
    };

    MetricDelta {
        value,
        percentage,
        direction,
    }
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}
