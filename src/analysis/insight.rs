//! Rule-based explanation of ROAS movement
//!
//! Rules compare the signed percentage change of each metric: "fell by more
//! than 5%" means `percentage <= -5`, "grew by more than 10%" means
//! `percentage >= 10`. Evaluation is a pure function of its inputs.

use crate::types::{AggregatedMetrics, Direction, Insight, InsightType, Metric, MetricDeltas};

/// |ROAS change| below this is reported as stable
const STABLE_ROAS_PCT: f64 = 1.0;
/// Moves of a main driver (revenue, spend, volume)
const MAJOR_MOVE_PCT: f64 = 10.0;
/// Moves of an efficiency ratio, and the "barely moved" bound for the other side
const MINOR_MOVE_PCT: f64 = 5.0;

/// Explain why ROAS moved between two periods.
pub fn explain(
    current: &AggregatedMetrics,
    previous: &AggregatedMetrics,
    deltas: &MetricDeltas,
) -> Insight {
    let changes = Changes::new(deltas);

    if changes.roas.abs() < STABLE_ROAS_PCT {
        return stable_insight();
    }

    let roas_direction = deltas
        .get(&Metric::Roas)
        .map(|d| d.direction)
        .unwrap_or_default();

    match roas_direction {
        Direction::Increase => explain_improvement(current, previous, &changes),
        Direction::Decrease => explain_decline(current, previous, &changes),
        // |change| >= 1% always has a direction; kept total for hand-built deltas
        Direction::Neutral => stable_insight(),
    }
}

fn stable_insight() -> Insight {
    Insight {
        insight_type: InsightType::Neutral,
        main_reason: "ROAS remained stable compared to the previous period.".to_string(),
        contributing_factors: Vec::new(),
        recommendations: vec![
            "Performance is steady; test new creatives or audiences to look for further upside."
                .to_string(),
        ],
    }
}

/// Signed percentage change per metric
struct Changes {
    ad_spend: f64,
    revenue: f64,
    roas: f64,
    conversions: f64,
    cvr: f64,
    clicks: f64,
    cpc: f64,
    aov: f64,
    ctr: f64,
}

impl Changes {
    fn new(deltas: &MetricDeltas) -> Self {
        let pct = |metric| deltas.get(&metric).map(|d| d.percentage).unwrap_or(0.0);
        Self {
            ad_spend: pct(Metric::AdSpend),
            revenue: pct(Metric::Revenue),
            roas: pct(Metric::Roas),
            conversions: pct(Metric::Conversions),
            cvr: pct(Metric::Cvr),
            clicks: pct(Metric::Clicks),
            cpc: pct(Metric::Cpc),
            aov: pct(Metric::Aov),
            ctr: pct(Metric::Ctr),
        }
    }
}

fn explain_improvement(
    current: &AggregatedMetrics,
    previous: &AggregatedMetrics,
    c: &Changes,
) -> Insight {
    let main_reason = if c.revenue >= MAJOR_MOVE_PCT && c.ad_spend < MINOR_MOVE_PCT {
        format!(
            "Revenue grew {:.1}% while ad spend changed only {:.1}%, lifting ROAS from {:.2} to {:.2}.",
            c.revenue, c.ad_spend, previous.roas, current.roas
        )
    } else if c.ad_spend <= -MAJOR_MOVE_PCT {
        format!(
            "Ad spend was cut by {:.1}% while revenue changed {:.1}%, improving ROAS from {:.2} to {:.2}.",
            -c.ad_spend, c.revenue, previous.roas, current.roas
        )
    } else if c.revenue > c.ad_spend {
        format!(
            "Revenue growth ({:.1}%) outpaced ad spend growth ({:.1}%), raising ROAS from {:.2} to {:.2}.",
            c.revenue, c.ad_spend, previous.roas, current.roas
        )
    } else {
        format!(
            "ROAS improved from {:.2} to {:.2} ({:+.1}%).",
            previous.roas, current.roas, c.roas
        )
    };

    let mut factors = Vec::new();
    let mut recommendations = Vec::new();

    if c.cvr >= MINOR_MOVE_PCT {
        factors.push(format!(
            "Conversion rate rose {:.1}% ({:.2}% → {:.2}%).",
            c.cvr, previous.cvr, current.cvr
        ));
        recommendations.push(
            "Keep the landing pages and offers that lifted conversion rate and roll them out to similar campaigns."
                .to_string(),
        );
    }
    if c.aov >= MINOR_MOVE_PCT {
        factors.push(format!(
            "Average order value rose {:.1}% ({:.0} → {:.0}).",
            c.aov, previous.aov, current.aov
        ));
        recommendations.push(
            "Lean into the bundles, upsells or product mix that raised average order value."
                .to_string(),
        );
    }
    if c.cpc <= -MINOR_MOVE_PCT {
        factors.push(format!(
            "Cost per click fell {:.1}% ({:.0} → {:.0}).",
            -c.cpc, previous.cpc, current.cpc
        ));
        recommendations.push(
            "Shift more budget toward the placements and keywords delivering cheaper clicks."
                .to_string(),
        );
    }
    if c.conversions >= MAJOR_MOVE_PCT {
        factors.push(format!(
            "Conversions grew {:.1}% ({:.0} → {:.0}).",
            c.conversions, previous.conversions, current.conversions
        ));
        recommendations.push(
            "Scale the campaigns driving conversion growth while watching CPA.".to_string(),
        );
    }
    if c.clicks >= MAJOR_MOVE_PCT && c.ad_spend < MINOR_MOVE_PCT {
        factors.push(format!(
            "Clicks grew {:.1}% with ad spend up only {:.1}%.",
            c.clicks, c.ad_spend
        ));
        recommendations.push(
            "Creatives are earning more clicks for the same budget; produce more variations in the same style."
                .to_string(),
        );
    }

    if factors.is_empty() {
        recommendations = vec![
            "Keep the current campaign setup and monitor ROAS daily.".to_string(),
            "Gradually raise budget on the best-performing campaigns to test how far they scale."
                .to_string(),
        ];
    }

    Insight {
        insight_type: InsightType::Positive,
        main_reason,
        contributing_factors: factors,
        recommendations,
    }
}

fn explain_decline(
    current: &AggregatedMetrics,
    previous: &AggregatedMetrics,
    c: &Changes,
) -> Insight {
    let main_reason = if c.ad_spend >= MAJOR_MOVE_PCT && c.revenue < MINOR_MOVE_PCT {
        format!(
            "Ad spend grew {:.1}% while revenue changed only {:.1}%, pulling ROAS from {:.2} down to {:.2}.",
            c.ad_spend, c.revenue, previous.roas, current.roas
        )
    } else if c.revenue <= -MAJOR_MOVE_PCT {
        format!(
            "Revenue fell {:.1}%, dropping ROAS from {:.2} to {:.2}.",
            -c.revenue, previous.roas, current.roas
        )
    } else if c.ad_spend > c.revenue {
        format!(
            "Ad spend growth ({:.1}%) outpaced revenue growth ({:.1}%), lowering ROAS from {:.2} to {:.2}.",
            c.ad_spend, c.revenue, previous.roas, current.roas
        )
    } else {
        format!(
            "ROAS declined from {:.2} to {:.2} ({:+.1}%).",
            previous.roas, current.roas, c.roas
        )
    };

    let mut factors = Vec::new();
    let mut recommendations = Vec::new();

    if c.cvr <= -MINOR_MOVE_PCT {
        factors.push(format!(
            "Conversion rate fell {:.1}% ({:.2}% → {:.2}%).",
            -c.cvr, previous.cvr, current.cvr
        ));
        recommendations.push(
            "Check landing page speed, checkout flow and offer changes that may have hurt conversion rate."
                .to_string(),
        );
    }
    if c.aov <= -MINOR_MOVE_PCT {
        factors.push(format!(
            "Average order value fell {:.1}% ({:.0} → {:.0}).",
            -c.aov, previous.aov, current.aov
        ));
        recommendations.push(
            "Review discounting and product mix; promote bundles or higher-value items.".to_string(),
        );
    }
    if c.cpc >= MINOR_MOVE_PCT {
        factors.push(format!(
            "Cost per click rose {:.1}% ({:.0} → {:.0}).",
            c.cpc, previous.cpc, current.cpc
        ));
        recommendations.push(
            "Revisit bids and targeting; pause placements where click costs climbed fastest."
                .to_string(),
        );
    }
    if c.conversions <= -MAJOR_MOVE_PCT {
        factors.push(format!(
            "Conversions fell {:.1}% ({:.0} → {:.0}).",
            -c.conversions, previous.conversions, current.conversions
        ));
        recommendations.push(
            "Find the campaigns that lost the most conversions and check for tracking or audience changes."
                .to_string(),
        );
    }
    if c.ctr <= -MINOR_MOVE_PCT {
        factors.push(format!(
            "Click-through rate fell {:.1}% ({:.2}% → {:.2}%).",
            -c.ctr, previous.ctr, current.ctr
        ));
        recommendations.push(
            "Refresh creatives showing fatigue and retest headlines and thumbnails.".to_string(),
        );
    }

    if factors.is_empty() {
        recommendations = vec![
            "Review campaign-level results to find the ad sets dragging ROAS down.".to_string(),
            "Check for tracking or attribution changes that may have affected reported revenue."
                .to_string(),
        ];
    }

    Insight {
        insight_type: InsightType::Negative,
        main_reason,
        contributing_factors: factors,
        recommendations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::metrics::compare;
    use crate::types::MetricDelta;

    fn metrics(
        ad_spend: f64,
        revenue: f64,
        conversions: f64,
        clicks: f64,
        impressions: f64,
    ) -> AggregatedMetrics {
        let ratio = |n: f64, d: f64| if d == 0.0 { 0.0 } else { n / d };
        AggregatedMetrics {
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
        }
    }

    fn run(current: AggregatedMetrics, previous: AggregatedMetrics) -> Insight {
        explain(&current, &previous, &compare(&current, &previous))
    }

    /// Flat metrics with only the ROAS delta set
    fn run_with_roas(percentage: f64, direction: Direction) -> Insight {
        let m = metrics(100.0, 300.0, 10.0, 50.0, 1000.0);
        let mut deltas = compare(&m, &m);
        deltas.insert(
            Metric::Roas,
            MetricDelta {
                value: percentage / 100.0,
                percentage,
                direction,
            },
        );
        explain(&m, &m, &deltas)
    }

    fn has_factor(insight: &Insight, prefix: &str) -> bool {
        insight.contributing_factors.iter().any(|f| f.starts_with(prefix))
    }

    #[test]
    fn test_stable_roas_is_neutral() {
        let previous = metrics(100.0, 300.0, 10.0, 50.0, 1000.0);
        let current = metrics(100.0, 301.0, 10.0, 50.0, 1000.0);
        let insight = run(current, previous);

        assert_eq!(insight.insight_type, InsightType::Neutral);
        assert!(insight.contributing_factors.is_empty());
        assert_eq!(insight.recommendations.len(), 1);
    }

    #[test]
    fn test_revenue_growth_with_flat_spend() {
        let previous = metrics(100.0, 300.0, 10.0, 50.0, 1000.0);
        let current = metrics(100.0, 600.0, 10.0, 50.0, 1000.0);
        let insight = run(current, previous);

        assert_eq!(insight.insight_type, InsightType::Positive);
        assert!(insight.main_reason.starts_with("Revenue grew 100.0%"));
        // AOV doubled
        assert_eq!(insight.contributing_factors.len(), 1);
        assert!(insight.contributing_factors[0].starts_with("Average order value rose"));
        assert_eq!(insight.recommendations.len(), 1);
    }

    #[test]
    fn test_spend_cut_reason() {
        let previous = metrics(200.0, 400.0, 10.0, 100.0, 1000.0);
        let current = metrics(100.0, 380.0, 10.0, 100.0, 1000.0);
        let insight = run(current, previous);

        assert_eq!(insight.insight_type, InsightType::Positive);
        assert!(insight.main_reason.starts_with("Ad spend was cut by 50.0%"));
        assert!(insight
            .contributing_factors
            .iter()
            .any(|f| f.starts_with("Cost per click fell")));
    }

    #[test]
    fn test_revenue_outpacing_spend_reason() {
        // spend +6% (not < 5), revenue +9% (not >= 10)
        let previous = metrics(100.0, 300.0, 10.0, 50.0, 1000.0);
        let current = metrics(106.0, 327.0, 10.5, 53.0, 1060.0);
        let insight = run(current, previous);

        assert_eq!(insight.insight_type, InsightType::Positive);
        assert!(insight
            .main_reason
            .starts_with("Revenue growth (9.0%) outpaced ad spend growth (6.0%)"));
    }

    #[test]
    fn test_positive_without_factors_uses_generic_recommendations() {
        let previous = metrics(100.0, 300.0, 10.0, 50.0, 1000.0);
        let current = metrics(106.0, 327.0, 10.5, 53.0, 1060.0);
        let insight = run(current, previous);

        assert!(insight.contributing_factors.is_empty());
        assert_eq!(insight.recommendations.len(), 2);
    }

    #[test]
    fn test_spend_growth_without_revenue_is_negative() {
        let previous = metrics(100.0, 300.0, 10.0, 50.0, 1000.0);
        let current = metrics(150.0, 300.0, 10.0, 50.0, 1000.0);
        let insight = run(current, previous);

        assert_eq!(insight.insight_type, InsightType::Negative);
        assert!(insight.main_reason.starts_with("Ad spend grew 50.0%"));
        assert!(insight
            .contributing_factors
            .iter()
            .any(|f| f.starts_with("Cost per click rose")));
    }

    #[test]
    fn test_revenue_drop_collects_independent_factors() {
        let previous = metrics(100.0, 500.0, 20.0, 100.0, 1000.0);
        let current = metrics(100.0, 300.0, 15.0, 100.0, 2000.0);
        let insight = run(current, previous);

        assert_eq!(insight.insight_type, InsightType::Negative);
        assert!(insight.main_reason.starts_with("Revenue fell 40.0%"));
        let factors = &insight.contributing_factors;
        assert!(factors.iter().any(|f| f.starts_with("Conversion rate fell")));
        assert!(factors.iter().any(|f| f.starts_with("Average order value fell")));
        assert!(factors.iter().any(|f| f.starts_with("Conversions fell")));
        assert!(factors.iter().any(|f| f.starts_with("Click-through rate fell")));
        assert_eq!(insight.recommendations.len(), factors.len());
    }

    #[test]
    fn test_threshold_is_inclusive_for_declines() {
        // CVR falls exactly 5%
        let previous = metrics(100.0, 300.0, 20.0, 100.0, 1000.0);
        let current = metrics(100.0, 290.0, 19.0, 100.0, 1000.0);
        let insight = run(current, previous);

        assert_eq!(insight.insight_type, InsightType::Negative);
        assert!(insight
            .contributing_factors
            .iter()
            .any(|f| f.starts_with("Conversion rate fell 5.0%")));
    }

    #[test]
    fn test_neutral_cutoff_at_one_percent() {
        let up = run_with_roas(1.0, Direction::Increase);
        assert_eq!(up.insight_type, InsightType::Positive);

        let down = run_with_roas(-1.0, Direction::Decrease);
        assert_eq!(down.insight_type, InsightType::Negative);

        let just_below = run_with_roas(0.99, Direction::Increase);
        assert_eq!(just_below.insight_type, InsightType::Neutral);
        assert_eq!(just_below, stable_insight());
    }

    #[test]
    fn test_directionless_roas_move_is_stable() {
        let insight = run_with_roas(5.0, Direction::Neutral);
        assert_eq!(insight, stable_insight());
        assert_eq!(insight.recommendations.len(), 1);
    }

    #[test]
    fn test_conversion_rate_rise_factor() {
        // conversions +8% on flat clicks, AOV unchanged
        let previous = metrics(1000.0, 3000.0, 100.0, 1000.0, 10000.0);
        let current = metrics(1000.0, 3240.0, 108.0, 1000.0, 10000.0);
        let insight = run(current, previous);

        assert_eq!(insight.insight_type, InsightType::Positive);
        assert_eq!(insight.contributing_factors.len(), 1);
        assert!(has_factor(&insight, "Conversion rate rose 8.0%"));
        assert!(insight.recommendations[0].contains("conversion rate"));
    }

    #[test]
    fn test_conversions_growth_factor_is_inclusive() {
        let previous = metrics(1000.0, 3000.0, 100.0, 1000.0, 10000.0);

        let at_bound = run(metrics(1000.0, 3300.0, 110.0, 1000.0, 10000.0), previous);
        assert!(has_factor(&at_bound, "Conversions grew 10.0% (100 → 110)"));

        let below = run(metrics(1000.0, 3270.0, 109.0, 1000.0, 10000.0), previous);
        assert_eq!(below.insight_type, InsightType::Positive);
        assert!(!has_factor(&below, "Conversions grew"));
    }

    #[test]
    fn test_click_growth_on_flat_spend_factor() {
        let previous = metrics(1000.0, 3000.0, 100.0, 1000.0, 10000.0);

        // clicks exactly +10%, spend +4%
        let at_bound = run(metrics(1040.0, 3300.0, 100.0, 1100.0, 11000.0), previous);
        assert_eq!(at_bound.insight_type, InsightType::Positive);
        assert!(has_factor(&at_bound, "Clicks grew 10.0% with ad spend up only 4.0%"));

        // spend +5% no longer counts as flat
        let spend_up = run(metrics(1050.0, 3300.0, 100.0, 1100.0, 11000.0), previous);
        assert_eq!(spend_up.insight_type, InsightType::Positive);
        assert!(!has_factor(&spend_up, "Clicks grew"));
    }

    #[test]
    fn test_spend_outpacing_revenue_reason() {
        // spend +8% (not >= 10), revenue +2% (not a fall)
        let previous = metrics(100.0, 300.0, 10.0, 50.0, 1000.0);
        let current = metrics(108.0, 306.0, 10.0, 50.0, 1000.0);
        let insight = run(current, previous);

        assert_eq!(insight.insight_type, InsightType::Negative);
        assert!(insight
            .main_reason
            .starts_with("Ad spend growth (8.0%) outpaced revenue growth (2.0%)"));
        assert!(has_factor(&insight, "Cost per click rose 8.0%"));
    }

    #[test]
    fn test_explain_is_deterministic() {
        let previous = metrics(120.0, 500.0, 20.0, 100.0, 1000.0);
        let current = metrics(100.0, 300.0, 15.0, 120.0, 2000.0);
        let deltas = compare(&current, &previous);

        let first = explain(&current, &previous, &deltas);
        let second = explain(&current, &previous, &deltas);
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }
}
