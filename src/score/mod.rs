//! Arbitrage Scorer — component F (SPEC_FULL.md §4.F).
//!
//! Classifies each adjudicated pair's arbitrage type, sizes a position,
//! prices transaction costs, assesses risk, and emits an
//! [`ArbitrageOpportunity`] gated on minimum profit and maximum risk.

pub mod cost;
pub mod priority;
pub mod risk;

use std::time::Instant;

use chrono::{DateTime, Utc};

use crate::config::{FunnelThresholds, ScoringConstants};
use crate::domain::{
    ArbitrageOpportunity, ArbitrageType, MarketPair, NormalizedMarket, OpportunityId, RecommendedAction,
    StageMetrics, Strategy,
};
use crate::llm::Adjudicated;

const SIMPLE_SPREAD_THRESHOLD: f64 = 0.05;
const TEMPORAL_TIME_DELTA_SECS: i64 = 86_400;
const LIQUIDITY_VOLUME_RATIO_THRESHOLD: f64 = 0.3;

fn volume_f64(market: &NormalizedMarket) -> f64 {
    market.volume.get().to_string().parse().unwrap_or(0.0)
}

/// Decision tree: spread-dominant → Simple; else time-misaligned →
/// Temporal; else volume-imbalanced → Liquidity; else CrossPlatform
/// (§4.F point 1).
#[must_use]
pub fn classify(pair: &MarketPair, a: &NormalizedMarket, b: &NormalizedMarket) -> ArbitrageType {
    let spread = pair.price_spread.unwrap_or(0.0);
    if spread >= SIMPLE_SPREAD_THRESHOLD {
        return ArbitrageType::Simple;
    }
    let time_delta = (a.close_time - b.close_time).num_seconds().abs();
    if time_delta > TEMPORAL_TIME_DELTA_SECS {
        return ArbitrageType::Temporal;
    }
    let vol_a = volume_f64(a);
    let vol_b = volume_f64(b);
    let max_vol = vol_a.max(vol_b);
    let ratio = if max_vol > 0.0 { vol_a.min(vol_b) / max_vol } else { 0.0 };
    if ratio < LIQUIDITY_VOLUME_RATIO_THRESHOLD {
        return ArbitrageType::Liquidity;
    }
    ArbitrageType::CrossPlatform
}

/// Buy the cheaper side, sell the dearer one; arbitrage is always
/// specified as a simultaneous hedge (§4.F point 1).
#[must_use]
fn build_strategy(a: &NormalizedMarket, b: &NormalizedMarket) -> Strategy {
    let price_a = a.yes_price();
    let price_b = b.yes_price();
    if price_a.get() <= price_b.get() {
        Strategy {
            buy_handle: a.handle.clone(),
            buy_price: price_a,
            sell_handle: b.handle.clone(),
            sell_price: price_b,
            simultaneous_hedge_required: true,
        }
    } else {
        Strategy {
            buy_handle: b.handle.clone(),
            buy_price: price_b,
            sell_handle: a.handle.clone(),
            sell_price: price_a,
            simultaneous_hedge_required: true,
        }
    }
}

fn hours_to_nearest_close(a: &NormalizedMarket, b: &NormalizedMarket, now: DateTime<Utc>) -> f64 {
    let secs_a = (a.close_time - now).num_seconds();
    let secs_b = (b.close_time - now).num_seconds();
    secs_a.min(secs_b).max(0) as f64 / 3600.0
}

fn expiry(a: &NormalizedMarket, b: &NormalizedMarket, now: DateTime<Utc>, max_execution_hours: i64) -> DateTime<Utc> {
    let market_close = a.close_time.min(b.close_time);
    let execution_deadline = now + chrono::Duration::hours(max_execution_hours);
    market_close.min(execution_deadline)
}

/// Score one adjudicated pair into an `ArbitrageOpportunity`, or `None` if
/// it fails the LLM confidence acceptance gate, the price-sanity guard, the
/// profit floor, or the risk cap ("Gate").
#[must_use]
pub fn score_one(
    adjudicated: &Adjudicated,
    a: &NormalizedMarket,
    b: &NormalizedMarket,
    now: DateTime<Utc>,
    funnel: &FunnelThresholds,
    scoring: &ScoringConstants,
) -> Option<ArbitrageOpportunity> {
    if !adjudicated.evaluation.meets_confidence_threshold(funnel.llm_confidence_threshold) {
        return None;
    }
    if adjudicated.evaluation.recommended_action == RecommendedAction::Reject {
        return None;
    }

    let pair = &adjudicated.pair;
    let spread = pair.price_spread.unwrap_or(0.0);

    let strategy = build_strategy(a, b);
    if strategy.buy_price.get() >= strategy.sell_price.get() {
        return None;
    }

    let arbitrage_type = classify(pair, a, b);
    let position = cost::position_size(a, b, spread, scoring);
    let costs = cost::transaction_costs(a, b, position, scoring);
    let risk_assessment = risk::assess(pair, a, b, adjudicated.evaluation.semantic_similarity);
    let hours_to_close = hours_to_nearest_close(a, b, now);
    let metrics = priority::compute_metrics(spread, position, &costs, &risk_assessment, hours_to_close);

    if metrics.expected_profit_usd <= rust_decimal::Decimal::ZERO {
        return None;
    }
    if metrics.expected_profit_percentage < funnel.min_profit_pct {
        return None;
    }
    if risk_assessment.risk_level > funnel.max_risk_level {
        return None;
    }

    let priority = priority::priority_score(&metrics, &risk_assessment, adjudicated.evaluation.confidence);

    Some(ArbitrageOpportunity {
        opportunity_id: OpportunityId::new(&a.handle, &b.handle),
        handle_a: a.handle.clone(),
        handle_b: b.handle.clone(),
        arbitrage_type,
        strategy,
        position_size: position,
        cost_analysis: costs,
        risk: risk_assessment,
        metrics,
        priority_score: priority,
        detected_at: now,
        expires_at: expiry(a, b, now, scoring.max_execution_hours),
    })
}

/// Run stage F over every adjudicated pair, then sort the survivors by
/// `priority_score` descending (§4.F "Ranking", testable property 6).
pub fn run(
    adjudicated: &[Adjudicated],
    market_a: impl Fn(&MarketPair) -> &NormalizedMarket,
    market_b: impl Fn(&MarketPair) -> &NormalizedMarket,
    now: DateTime<Utc>,
    funnel: &FunnelThresholds,
    scoring: &ScoringConstants,
) -> (Vec<ArbitrageOpportunity>, StageMetrics) {
    let start = Instant::now();
    let mut metrics = StageMetrics::new("arbitrage_scoring");
    metrics.input_count = adjudicated.len();

    let mut opportunities: Vec<ArbitrageOpportunity> = adjudicated
        .iter()
        .filter_map(|item| {
            let a = market_a(&item.pair);
            let b = market_b(&item.pair);
            score_one(item, a, b, now, funnel, scoring)
        })
        .collect();

    opportunities.sort_by(|a, b| {
        b.priority_score
            .partial_cmp(&a.priority_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.opportunity_id.as_str().cmp(b.opportunity_id.as_str()))
    });

    metrics.output_count = opportunities.len();
    metrics.duration = start.elapsed();
    (opportunities, metrics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FunnelThresholds, ScoringConstants};
    use crate::domain::LLMEvaluation;
    use crate::testkit::market_at;
    use crate::domain::Venue;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn adjudicated(a: &NormalizedMarket, b: &NormalizedMarket) -> Adjudicated {
        let mut pair = MarketPair::new("politics_us_election", a.handle.clone(), b.handle.clone());
        pair.price_spread = Some((a.yes_price().get() - b.yes_price().get()).to_string().parse().unwrap());
        Adjudicated {
            pair,
            evaluation: LLMEvaluation {
                confidence: 0.9,
                semantic_similarity: 0.9,
                arbitrage_viability: 0.9,
                reasoning: "matches".to_string(),
                recommended_action: RecommendedAction::Proceed,
                provider: "anthropic",
                model_version: "test".to_string(),
                timestamp: Utc::now(),
            },
        }
    }

    #[test]
    fn simple_arbitrage_classified_on_wide_spread() {
        let a = market_at(Venue::VenueA, "a1", "t", dec!(0.3), dec!(5000), Utc::now() + Duration::days(10));
        let b = market_at(Venue::VenueB, "b1", "t", dec!(0.6), dec!(5000), Utc::now() + Duration::days(10));
        let adj = adjudicated(&a, &b);
        assert_eq!(classify(&adj.pair, &a, &b), ArbitrageType::Simple);
    }

    #[test]
    fn opportunity_has_sane_prices_and_profit() {
        let a = market_at(Venue::VenueA, "a1", "t", dec!(0.3), dec!(5000), Utc::now() + Duration::days(10));
        let b = market_at(Venue::VenueB, "b1", "t", dec!(0.6), dec!(5000), Utc::now() + Duration::days(10));
        let adj = adjudicated(&a, &b);
        let opp = score_one(&adj, &a, &b, Utc::now(), &FunnelThresholds::default(), &ScoringConstants::default())
            .expect("should produce an opportunity");
        assert!(opp.has_sane_prices());
        assert!(opp.has_sane_profit(FunnelThresholds::default().min_profit_pct));
    }

    #[test]
    fn run_sorts_by_priority_descending() {
        let a1 = market_at(Venue::VenueA, "a1", "t1", dec!(0.3), dec!(5000), Utc::now() + Duration::days(10));
        let b1 = market_at(Venue::VenueB, "b1", "t1", dec!(0.6), dec!(5000), Utc::now() + Duration::days(10));
        let a2 = market_at(Venue::VenueA, "a2", "t2", dec!(0.45), dec!(5000), Utc::now() + Duration::days(10));
        let b2 = market_at(Venue::VenueB, "b2", "t2", dec!(0.52), dec!(5000), Utc::now() + Duration::days(10));
        let batch = vec![adjudicated(&a1, &b1), adjudicated(&a2, &b2)];
        let markets = [
            (a1.handle.clone(), a1.clone()),
            (b1.handle.clone(), b1.clone()),
            (a2.handle.clone(), a2.clone()),
            (b2.handle.clone(), b2.clone()),
        ];
        let lookup = |handle: &crate::domain::MarketHandle| {
            markets.iter().find(|(h, _)| h == handle).map(|(_, m)| m).unwrap()
        };
        let (opportunities, _) = run(
            &batch,
            |pair| lookup(&pair.handle_a),
            |pair| lookup(&pair.handle_b),
            Utc::now(),
            &FunnelThresholds::default(),
            &ScoringConstants::default(),
        );
        assert!(opportunities.windows(2).all(|w| w[0].priority_score >= w[1].priority_score));
    }

    #[test]
    fn low_confidence_evaluation_never_produces_an_opportunity() {
        let a = market_at(Venue::VenueA, "a1", "t", dec!(0.3), dec!(5000), Utc::now() + Duration::days(10));
        let b = market_at(Venue::VenueB, "b1", "t", dec!(0.6), dec!(5000), Utc::now() + Duration::days(10));
        let mut adj = adjudicated(&a, &b);
        adj.evaluation.confidence = 0.5;
        let result = score_one(&adj, &a, &b, Utc::now(), &FunnelThresholds::default(), &ScoringConstants::default());
        assert!(result.is_none());
    }

    #[test]
    fn rejected_recommendation_never_produces_an_opportunity_even_with_high_confidence() {
        let a = market_at(Venue::VenueA, "a1", "t", dec!(0.3), dec!(5000), Utc::now() + Duration::days(10));
        let b = market_at(Venue::VenueB, "b1", "t", dec!(0.6), dec!(5000), Utc::now() + Duration::days(10));
        let mut adj = adjudicated(&a, &b);
        adj.evaluation.recommended_action = RecommendedAction::Reject;
        let result = score_one(&adj, &a, &b, Utc::now(), &FunnelThresholds::default(), &ScoringConstants::default());
        assert!(result.is_none());
    }
}
