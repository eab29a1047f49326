use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

//==============================================================================
// Canonical Schema
//==============================================================================

/// Fields every ingested row is normalized onto
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CanonicalField {
    Date,
    AdSpend,
    Revenue,
    Conversions,
    Clicks,
    Impressions,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 6] = [
        CanonicalField::Date,
        CanonicalField::AdSpend,
        CanonicalField::Revenue,
        CanonicalField::Conversions,
        CanonicalField::Clicks,
        CanonicalField::Impressions,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalField::Date => "date",
            CanonicalField::AdSpend => "adSpend",
            CanonicalField::Revenue => "revenue",
            CanonicalField::Conversions => "conversions",
            CanonicalField::Clicks => "clicks",
            CanonicalField::Impressions => "impressions",
        }
    }

    /// Impressions is the only field a source may omit.
    pub fn is_required(&self) -> bool {
        !matches!(self, CanonicalField::Impressions)
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One normalized row of advertising performance data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalRecord {
    pub date: NaiveDate,
    pub ad_spend: f64,
    pub revenue: f64,
    pub conversions: f64,
    pub clicks: f64,
    #[serde(default)]
    pub impressions: f64,
}

//==============================================================================
// Periods
//==============================================================================

/// Granularity of a period-over-period comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComparisonMode {
    /// Most recent date vs. the date before it
    #[default]
    Day,
    /// Most recent 7 dates vs. the 7 dates before them
    Week,
}

impl ComparisonMode {
    /// Number of distinct dates in each comparison window
    pub fn window_len(&self) -> usize {
        match self {
            ComparisonMode::Day => 1,
            ComparisonMode::Week => 7,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonMode::Day => "day",
            ComparisonMode::Week => "week",
        }
    }
}

impl fmt::Display for ComparisonMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComparisonMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "day" | "daily" | "dod" => Ok(ComparisonMode::Day),
            "week" | "weekly" | "wow" => Ok(ComparisonMode::Week),
            other => Err(format!(
                "Unknown comparison mode '{}'. Use 'day' or 'week'",
                other
            )),
        }
    }
}

/// A date-ordered slice of records forming one side of a comparison
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Period {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub records: Vec<CanonicalRecord>,
}

impl Period {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of distinct dates covered by the period
    pub fn date_count(&self) -> usize {
        let mut dates: Vec<NaiveDate> = self.records.iter().map(|r| r.date).collect();
        dates.dedup();
        dates.len()
    }
}

//==============================================================================
// Metrics
//==============================================================================

/// Summed totals of a record set plus the ratios derived from them
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedMetrics {
    pub ad_spend: f64,
    pub revenue: f64,
    pub conversions: f64,
    pub clicks: f64,
    pub impressions: f64,
    pub roas: f64,
    pub cvr: f64,
    pub cpc: f64,
    pub aov: f64,
    pub ctr: f64,
    pub cpa: f64,
}

impl AggregatedMetrics {
    pub fn value(&self, metric: Metric) -> f64 {
        match metric {
            Metric::AdSpend => self.ad_spend,
            Metric::Revenue => self.revenue,
            Metric::Roas => self.roas,
            Metric::Conversions => self.conversions,
            Metric::Cvr => self.cvr,
            Metric::Clicks => self.clicks,
            Metric::Cpc => self.cpc,
            Metric::Aov => self.aov,
            Metric::Ctr => self.ctr,
            Metric::Cpa => self.cpa,
        }
    }
}

/// Metrics compared between periods, in report order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Metric {
    AdSpend,
    Revenue,
    Roas,
    Conversions,
    Cvr,
    Clicks,
    Cpc,
    Aov,
    Ctr,
    Cpa,
}

impl Metric {
    pub const ALL: [Metric; 10] = [
        Metric::AdSpend,
        Metric::Revenue,
        Metric::Roas,
        Metric::Conversions,
        Metric::Cvr,
        Metric::Clicks,
        Metric::Cpc,
        Metric::Aov,
        Metric::Ctr,
        Metric::Cpa,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::AdSpend => "adSpend",
            Metric::Revenue => "revenue",
            Metric::Roas => "roas",
            Metric::Conversions => "conversions",
            Metric::Cvr => "cvr",
            Metric::Clicks => "clicks",
            Metric::Cpc => "cpc",
            Metric::Aov => "aov",
            Metric::Ctr => "ctr",
            Metric::Cpa => "cpa",
        }
    }

    /// Human-facing label used in reports
    pub fn label(&self) -> &'static str {
        match self {
            Metric::AdSpend => "Ad spend",
            Metric::Revenue => "Revenue",
            Metric::Roas => "ROAS",
            Metric::Conversions => "Conversions",
            Metric::Cvr => "CVR (%)",
            Metric::Clicks => "Clicks",
            Metric::Cpc => "CPC",
            Metric::Aov => "AOV",
            Metric::Ctr => "CTR (%)",
            Metric::Cpa => "CPA",
        }
    }

    /// Cost metrics improve when they go down
    pub fn lower_is_better(&self) -> bool {
        matches!(self, Metric::Cpc | Metric::Cpa)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Increase,
    Decrease,
    #[default]
    Neutral,
}

/// Period-over-period change of a single metric
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricDelta {
    /// current - previous
    pub value: f64,
    /// Relative change in percent, 0 when previous is 0
    pub percentage: f64,
    pub direction: Direction,
}

pub type MetricDeltas = BTreeMap<Metric, MetricDelta>;

//==============================================================================
// Insight
//==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightType {
    Positive,
    Negative,
    #[default]
    Neutral,
}

/// Rule-based explanation of a ROAS movement
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insight {
    #[serde(rename = "type")]
    pub insight_type: InsightType,
    pub main_reason: String,
    pub contributing_factors: Vec<String>,
    pub recommendations: Vec<String>,
}

//==============================================================================
// Analysis Output
//==============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodReport {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub data: Vec<CanonicalRecord>,
    pub aggregated: AggregatedMetrics,
}

impl PeriodReport {
    pub fn new(period: Period, aggregated: AggregatedMetrics) -> Self {
        Self {
            start_date: period.start_date,
            end_date: period.end_date,
            data: period.records,
            aggregated,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub current: AggregatedMetrics,
    pub previous: AggregatedMetrics,
    pub comparison: MetricDeltas,
}

/// Everything handed to the presentation layer for one analysis request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub current: PeriodReport,
    pub previous: PeriodReport,
    pub comparison: Comparison,
    pub analysis: Insight,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comparison_mode_from_str() {
        assert_eq!("day".parse::<ComparisonMode>(), Ok(ComparisonMode::Day));
        assert_eq!(" WEEK ".parse::<ComparisonMode>(), Ok(ComparisonMode::Week));
        assert_eq!("wow".parse::<ComparisonMode>(), Ok(ComparisonMode::Week));
        assert!("month".parse::<ComparisonMode>().is_err());
    }

    #[test]
    fn test_window_len() {
        assert_eq!(ComparisonMode::Day.window_len(), 1);
        assert_eq!(ComparisonMode::Week.window_len(), 7);
    }

    #[test]
    fn test_record_serializes_camel_case_iso_date() {
        let record = CanonicalRecord {
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            ad_spend: 100.0,
            revenue: 300.0,
            conversions: 10.0,
            clicks: 50.0,
            impressions: 1000.0,
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"date\":\"2024-01-02\""));
        assert!(json.contains("\"adSpend\":100.0"));
    }

    #[test]
    fn test_insight_type_field_renamed() {
        let insight = Insight {
            insight_type: InsightType::Positive,
            ..Default::default()
        };
        let json = serde_json::to_string(&insight).unwrap();
        assert!(json.contains("\"type\":\"positive\""));
        assert!(json.contains("\"mainReason\""));
    }

    #[test]
    fn test_deltas_serialize_with_metric_keys_in_order() {
        let mut deltas = MetricDeltas::new();
        deltas.insert(Metric::Cpa, MetricDelta::default());
        deltas.insert(Metric::AdSpend, MetricDelta::default());
        let json = serde_json::to_string(&deltas).unwrap();
        let ad = json.find("adSpend").unwrap();
        let cpa = json.find("cpa").unwrap();
        assert!(ad < cpa);
    }

    #[test]
    fn test_period_date_count() {
        let d1 = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let rec = |date| CanonicalRecord {
            date,
            ad_spend: 1.0,
            revenue: 1.0,
            conversions: 1.0,
            clicks: 1.0,
            impressions: 0.0,
        };
        let period = Period {
            start_date: Some(d1),
            end_date: Some(d2),
            records: vec![rec(d1), rec(d1), rec(d2)],
        };
        assert_eq!(period.date_count(), 2);
    }
}
