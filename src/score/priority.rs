//! Arbitrage metrics and the ranking priority score (SPEC_FULL.md §4.F points 5-6).

use rust_decimal::Decimal;

use crate::domain::{Metrics, RiskAssessment, TransactionCostAnalysis};

const PROFIT_NORMALIZATION: f64 = 0.10;
const ROI_NORMALIZATION: f64 = 1.0;
const PROFIT_WEIGHT: f64 = 0.4;
const ROI_WEIGHT: f64 = 0.3;
const RISK_WEIGHT: f64 = 0.2;
const CONFIDENCE_WEIGHT: f64 = 0.1;

/// Expected profit, ROI, and success probability for one position
/// (§4.F point 5).
#[must_use]
pub fn compute_metrics(
    spread: f64,
    position: Decimal,
    costs: &TransactionCostAnalysis,
    risk: &RiskAssessment,
    hours_to_close: f64,
) -> Metrics {
    let gross_profit = Decimal::try_from(spread).unwrap_or(Decimal::ZERO) * position;
    let net_profit = gross_profit - costs.total_cost;
    let profit_percentage = if position > Decimal::ZERO {
        (net_profit / position).to_string().parse().unwrap_or(0.0)
    } else {
        0.0
    };

    let days_to_close = (hours_to_close / 24.0).max(1.0 / 24.0);
    let annualized_roi = if days_to_close > 0.0 {
        profit_percentage * 365.0 / days_to_close
    } else {
        0.0
    };

    let success_probability = (1.0 - risk.overall_risk).max(0.5);

    Metrics {
        expected_profit_usd: net_profit,
        expected_profit_percentage: profit_percentage,
        annualized_roi,
        success_probability,
        execution_time_estimate_secs: (hours_to_close.min(24.0) * 3600.0).max(60.0) as u64,
    }
}

/// Weighted ranking score: profit (40%), ROI (30%), inverse risk (20%),
/// LLM confidence (10%) (§4.F point 6, testable property 6).
#[must_use]
pub fn priority_score(metrics: &Metrics, risk: &RiskAssessment, llm_confidence: f64) -> f64 {
    let profit_score = (metrics.expected_profit_percentage / PROFIT_NORMALIZATION).min(1.0).max(0.0);
    let roi_score = (metrics.annualized_roi / ROI_NORMALIZATION).min(1.0).max(0.0);
    let risk_score = (1.0 - risk.overall_risk).clamp(0.0, 1.0);

    let score = profit_score * PROFIT_WEIGHT
        + roi_score * ROI_WEIGHT
        + risk_score * RISK_WEIGHT
        + llm_confidence.clamp(0.0, 1.0) * CONFIDENCE_WEIGHT;
    (score * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RiskLevel;
    use rust_decimal_macros::dec;

    fn risk(overall: f64) -> RiskAssessment {
        RiskAssessment {
            liquidity_risk: 0.1,
            timing_risk: 0.1,
            execution_risk: 0.1,
            semantic_risk: 0.1,
            platform_risk: 0.1,
            overall_risk: overall,
            risk_level: RiskLevel::from_score(overall),
        }
    }

    #[test]
    fn higher_profit_pct_yields_higher_priority() {
        let costs = TransactionCostAnalysis {
            venue_a_fee: dec!(1),
            venue_b_fee: dec!(1),
            gas_estimate: dec!(0.5),
            slippage: dec!(0.5),
            total_cost: dec!(3),
            cost_percentage: 0.03,
        };
        let low = compute_metrics(0.03, dec!(1000), &costs, &risk(0.2), 240.0);
        let high = compute_metrics(0.10, dec!(1000), &costs, &risk(0.2), 240.0);
        assert!(priority_score(&high, &risk(0.2), 0.8) > priority_score(&low, &risk(0.2), 0.8));
    }

    #[test]
    fn higher_risk_never_increases_priority() {
        let costs = TransactionCostAnalysis {
            venue_a_fee: dec!(1),
            venue_b_fee: dec!(1),
            gas_estimate: dec!(0.5),
            slippage: dec!(0.5),
            total_cost: dec!(3),
            cost_percentage: 0.03,
        };
        let metrics = compute_metrics(0.06, dec!(1000), &costs, &risk(0.2), 240.0);
        assert!(priority_score(&metrics, &risk(0.2), 0.8) >= priority_score(&metrics, &risk(0.6), 0.8));
    }
}
