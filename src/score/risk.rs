//! Risk assessment (SPEC_FULL.md §4.F point 3): five weighted components
//! banded into a [`RiskLevel`].

use crate::domain::{MarketPair, NormalizedMarket, RiskAssessment, RiskLevel};

const LIQUIDITY_WEIGHT: f64 = 0.30;
const TIMING_WEIGHT: f64 = 0.25;
const EXECUTION_WEIGHT: f64 = 0.20;
const SEMANTIC_WEIGHT: f64 = 0.15;
const PLATFORM_WEIGHT: f64 = 0.10;
/// Constant base risk of operating across two distinct venues at all.
const BASE_PLATFORM_RISK: f64 = 0.1;

fn volume_f64(market: &NormalizedMarket) -> f64 {
    market.volume.get().to_string().parse().unwrap_or(0.0)
}

fn liquidity_risk(a: &NormalizedMarket, b: &NormalizedMarket) -> f64 {
    let min_volume = volume_f64(a).min(volume_f64(b));
    if min_volume > 10_000.0 {
        0.1
    } else if min_volume > 5_000.0 {
        0.2
    } else if min_volume > 1_000.0 {
        0.4
    } else if min_volume > 500.0 {
        0.6
    } else {
        0.9
    }
}

fn timing_risk(a: &NormalizedMarket, b: &NormalizedMarket) -> f64 {
    let hours = (a.close_time - b.close_time).num_seconds().abs() as f64 / 3600.0;
    if hours < 1.0 {
        0.1
    } else if hours < 24.0 {
        0.2
    } else if hours < 168.0 {
        0.4
    } else {
        0.7
    }
}

fn execution_risk(spread: f64) -> f64 {
    if spread < 0.02 {
        0.3
    } else if spread > 0.2 {
        0.4
    } else {
        0.2
    }
}

/// Assemble the full assessment for a pair, given its filter-stage spread
/// and the LLM's reported semantic similarity (its complement is the
/// correlation/semantic risk component).
#[must_use]
pub fn assess(pair: &MarketPair, a: &NormalizedMarket, b: &NormalizedMarket, semantic_similarity: f64) -> RiskAssessment {
    let spread = pair.price_spread.unwrap_or(0.0);
    let liquidity = liquidity_risk(a, b);
    let timing = timing_risk(a, b);
    let execution = execution_risk(spread);
    let semantic = (1.0 - semantic_similarity).clamp(0.0, 1.0);
    let platform = BASE_PLATFORM_RISK;

    let overall = LIQUIDITY_WEIGHT * liquidity
        + TIMING_WEIGHT * timing
        + EXECUTION_WEIGHT * execution
        + SEMANTIC_WEIGHT * semantic
        + PLATFORM_WEIGHT * platform;

    RiskAssessment {
        liquidity_risk: liquidity,
        timing_risk: timing,
        execution_risk: execution,
        semantic_risk: semantic,
        platform_risk: platform,
        overall_risk: overall,
        risk_level: RiskLevel::from_score(overall),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::market_at;
    use crate::domain::Venue;
    use chrono::{Duration, Utc};
    use rust_decimal_macros::dec;

    #[test]
    fn high_volume_tight_timing_yields_low_risk() {
        let a = market_at(Venue::VenueA, "a1", "t", dec!(0.4), dec!(50_000), Utc::now() + Duration::days(10));
        let b = market_at(Venue::VenueB, "b1", "t", dec!(0.45), dec!(50_000), Utc::now() + Duration::days(10));
        let mut pair = MarketPair::new("bucket", a.handle.clone(), b.handle.clone());
        pair.price_spread = Some(0.05);
        let assessment = assess(&pair, &a, &b, 0.95);
        assert_eq!(assessment.risk_level, RiskLevel::VeryLow);
    }

    #[test]
    fn low_volume_low_confidence_yields_high_risk() {
        let a = market_at(Venue::VenueA, "a1", "t", dec!(0.4), dec!(100), Utc::now() + Duration::days(30));
        let b = market_at(Venue::VenueB, "b1", "t", dec!(0.45), dec!(100), Utc::now() + Duration::days(30));
        let mut pair = MarketPair::new("bucket", a.handle.clone(), b.handle.clone());
        pair.price_spread = Some(0.05);
        let assessment = assess(&pair, &a, &b, 0.2);
        assert!(assessment.overall_risk > 0.4);
        assert_eq!(assessment.risk_level, RiskLevel::Medium);
    }
}
