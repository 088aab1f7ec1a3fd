//! Hierarchical Filter — component C (SPEC_FULL.md §4.C).
//!
//! Five ordered, per-pair predicates over one bucket's venue-A and venue-B
//! markets. Within a bucket, surviving `MarketPair`s preserve the
//! (venue-A index, venue-B index) enumeration order (§5 "Ordering
//! guarantees"). Each stage records input/output counts, duration, and a
//! rejection-reason frequency table (§4.C).

use std::time::Instant;

use crate::config::FunnelThresholds;
use crate::domain::{MarketPair, NormalizedMarket, RejectionReason, StageMetrics};

pub(crate) mod stopwords;
pub(crate) mod text;

const MIN_PRICE_BAND: f64 = 0.05;
const MAX_PRICE_BAND: f64 = 0.95;
const WIDE_SPREAD_PASS: f64 = 0.10;
const ARBITRAGE_FLOOR: f64 = 0.01;
const MIN_ARBITRAGE_POTENTIAL: f64 = 0.02;
const CLOSE_WITHIN_24H_BONUS: f64 = 0.2;

fn yes_price_f64(market: &NormalizedMarket) -> f64 {
    market.yes_price().get().to_string().parse().unwrap_or(0.0)
}

fn volume_f64(market: &NormalizedMarket) -> f64 {
    market.volume.get().to_string().parse().unwrap_or(0.0)
}

fn liquidity_score(volume: f64, price: f64) -> f64 {
    (volume * (1.0 - 2.0 * (price - 0.5).abs()) + 1.0).log10().clamp(0.0, 4.0) / 4.0
}

/// Stage 1 — Basic compatibility: price band, minimum volume, minimum
/// spread. Returns the computed spread on acceptance.
fn stage1_basic_compatibility(
    a: &NormalizedMarket,
    b: &NormalizedMarket,
    thresholds: &FunnelThresholds,
) -> Result<f64, RejectionReason> {
    let price_a = yes_price_f64(a);
    let price_b = yes_price_f64(b);
    if !(MIN_PRICE_BAND..=MAX_PRICE_BAND).contains(&price_a)
        || !(MIN_PRICE_BAND..=MAX_PRICE_BAND).contains(&price_b)
    {
        return Err(RejectionReason::PriceOutOfRange);
    }
    if volume_f64(a) < thresholds.min_volume || volume_f64(b) < thresholds.min_volume {
        return Err(RejectionReason::InsufficientVolume);
    }
    let spread = (price_a - price_b).abs();
    if spread < thresholds.min_spread {
        return Err(RejectionReason::InsufficientArbitrage);
    }
    Ok(spread)
}

/// Stage 2 — Text similarity: keep if Jaccard >= threshold OR spread >= 10%.
fn stage2_text_similarity(
    a: &NormalizedMarket,
    b: &NormalizedMarket,
    spread: f64,
    thresholds: &FunnelThresholds,
) -> Result<f64, RejectionReason> {
    let jaccard = text::title_jaccard(&a.title, &b.title, stopwords::is_stopword);
    if jaccard >= thresholds.min_text_sim || spread >= WIDE_SPREAD_PASS {
        Ok(jaccard)
    } else {
        Err(RejectionReason::WeakTextSimilarity)
    }
}

/// Stage 3 — Liquidity: mean per-side score and volume-imbalance check.
fn stage3_liquidity(
    a: &NormalizedMarket,
    b: &NormalizedMarket,
    thresholds: &FunnelThresholds,
) -> Result<f64, RejectionReason> {
    let vol_a = volume_f64(a);
    let vol_b = volume_f64(b);
    let score_a = liquidity_score(vol_a, yes_price_f64(a));
    let score_b = liquidity_score(vol_b, yes_price_f64(b));
    let mean_score = (score_a + score_b) / 2.0;
    if mean_score < thresholds.min_liquidity_score {
        return Err(RejectionReason::LowLiquidityScore);
    }
    let (min_vol, max_vol) = if vol_a < vol_b { (vol_a, vol_b) } else { (vol_b, vol_a) };
    if max_vol > 0.0 && min_vol / max_vol < 0.1 {
        return Err(RejectionReason::ExtremeVolumeImbalance);
    }
    Ok(mean_score)
}

/// Stage 4 — Time alignment: reject if close times differ by more than the
/// configured window; score decays linearly with a same-day bonus.
fn stage4_time_alignment(
    a: &NormalizedMarket,
    b: &NormalizedMarket,
    thresholds: &FunnelThresholds,
) -> Result<f64, RejectionReason> {
    let delta = (a.close_time - b.close_time).num_seconds().abs() as f64;
    let max_delta = (thresholds.max_time_delta_days * 86_400) as f64;
    if delta > max_delta {
        return Err(RejectionReason::TimeMisaligned);
    }
    let mut score = 1.0 - (delta / max_delta);
    if delta <= 86_400.0 {
        score += CLOSE_WITHIN_24H_BONUS;
    }
    Ok(score.clamp(0.0, 1.2))
}

/// Stage 5 — Arbitrage potential: `max(0, spread - 0.01)`, reject if below
/// the configured floor.
fn stage5_arbitrage_potential(spread: f64) -> Result<f64, RejectionReason> {
    let potential = (spread - ARBITRAGE_FLOOR).max(0.0);
    if potential < MIN_ARBITRAGE_POTENTIAL {
        return Err(RejectionReason::InsufficientArbitrage);
    }
    Ok(potential)
}

/// Run all five stages over one bucket's cross-venue product, preserving
/// enumeration order, and return surviving pairs plus one `StageMetrics`
/// per stage.
pub fn run_bucket(
    bucket_name: &str,
    venue_a_markets: &[&NormalizedMarket],
    venue_b_markets: &[&NormalizedMarket],
    thresholds: &FunnelThresholds,
) -> (Vec<MarketPair>, [StageMetrics; 5]) {
    let mut metrics: [StageMetrics; 5] = [
        StageMetrics::new("filter_stage1_basic_compatibility"),
        StageMetrics::new("filter_stage2_text_similarity"),
        StageMetrics::new("filter_stage3_liquidity"),
        StageMetrics::new("filter_stage4_time_alignment"),
        StageMetrics::new("filter_stage5_arbitrage_potential"),
    ];
    let total_candidates = venue_a_markets.len() * venue_b_markets.len();
    for m in metrics.iter_mut() {
        m.input_count = total_candidates;
    }

    let mut survivors = Vec::new();
    for a in venue_a_markets {
        for b in venue_b_markets {
            let spread = match stage1_basic_compatibility(a, b, thresholds) {
                Ok(s) => s,
                Err(reason) => {
                    metrics[0].record_rejection(reason);
                    continue;
                }
            };
            metrics[0].output_count += 1;

            let jaccard = match stage2_text_similarity(a, b, spread, thresholds) {
                Ok(j) => j,
                Err(reason) => {
                    metrics[1].record_rejection(reason);
                    continue;
                }
            };
            metrics[1].output_count += 1;

            let liquidity = match stage3_liquidity(a, b, thresholds) {
                Ok(l) => l,
                Err(reason) => {
                    metrics[2].record_rejection(reason);
                    continue;
                }
            };
            metrics[2].output_count += 1;

            let time_score = match stage4_time_alignment(a, b, thresholds) {
                Ok(t) => t,
                Err(reason) => {
                    metrics[3].record_rejection(reason);
                    continue;
                }
            };
            metrics[3].output_count += 1;

            let arb_potential = match stage5_arbitrage_potential(spread) {
                Ok(p) => p,
                Err(reason) => {
                    metrics[4].record_rejection(reason);
                    continue;
                }
            };
            metrics[4].output_count += 1;

            let mut pair = MarketPair::new(bucket_name, a.handle.clone(), b.handle.clone());
            pair.price_spread = Some(spread);
            pair.text_similarity = Some(jaccard);
            pair.liquidity_score = Some(liquidity);
            pair.time_alignment_score = Some(time_score);
            pair.arbitrage_potential = Some(arb_potential);
            survivors.push(pair);
        }
    }

    for m in metrics.iter_mut() {
        m.duration = Instant::now().elapsed();
    }
    (survivors, metrics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::market_at;
    use crate::domain::Venue;
    use chrono::{Duration, Utc};
    use rust_decimal_macros::dec;

    fn thresholds() -> FunnelThresholds {
        FunnelThresholds::default()
    }

    #[test]
    fn s1_simple_arbitrage_survives_all_stages() {
        let a = market_at(Venue::VenueA, "a1", "Will Candidate X win the 2024 election?", dec!(0.55), dec!(5000), Utc::now() + Duration::days(100));
        let b = market_at(Venue::VenueB, "b1", "2024 US presidential election winner: Candidate X", dec!(0.70), dec!(4800), Utc::now() + Duration::days(100));
        let (pairs, _) = run_bucket("politics_us_election", &[&a], &[&b], &thresholds());
        assert_eq!(pairs.len(), 1);
        let p = &pairs[0];
        assert!((p.price_spread.unwrap() - 0.15).abs() < 1e-9);
    }

    #[test]
    fn s2_below_spread_reject_counts_insufficient_arbitrage() {
        let a = market_at(Venue::VenueA, "a1", "Will Candidate X win the 2024 election?", dec!(0.55), dec!(5000), Utc::now() + Duration::days(100));
        let b = market_at(Venue::VenueB, "b1", "2024 US presidential election winner: Candidate X", dec!(0.56), dec!(4800), Utc::now() + Duration::days(100));
        let (pairs, metrics) = run_bucket("politics_us_election", &[&a], &[&b], &thresholds());
        assert!(pairs.is_empty());
        assert_eq!(metrics[0].rejection_reasons.get("insufficient_arbitrage"), Some(&1));
    }

    #[test]
    fn stage2_disjunction_admits_large_spread_weak_text() {
        let a = market_at(Venue::VenueA, "a1", "Will it rain in NYC on July 4?", dec!(0.30), dec!(2000), Utc::now() + Duration::days(5));
        let b = market_at(Venue::VenueB, "b1", "Will it rain in NYC in July?", dec!(0.70), dec!(2000), Utc::now() + Duration::days(5));
        // Title overlap is actually high here; construct a case with weak overlap but big spread instead.
        let c = market_at(Venue::VenueA, "c1", "Totally different wording entirely here", dec!(0.20), dec!(2000), Utc::now() + Duration::days(5));
        let (pairs, _) = run_bucket("weather_general", &[&a], &[&b], &thresholds());
        assert_eq!(pairs.len(), 1);
        let (pairs2, metrics2) = run_bucket("weather_general", &[&c], &[&b], &thresholds());
        // c vs b: spread = 0.5 >= 10% so passes stage 2 despite weak text overlap.
        assert_eq!(pairs2.len(), 1);
        assert_eq!(metrics2[1].output_count, 1);
    }

    #[test]
    fn time_misalignment_rejects_beyond_window() {
        let a = market_at(Venue::VenueA, "a1", "Will Candidate X win?", dec!(0.55), dec!(5000), Utc::now() + Duration::days(5));
        let b = market_at(Venue::VenueB, "b1", "Candidate X election winner", dec!(0.70), dec!(4800), Utc::now() + Duration::days(100));
        let (pairs, metrics) = run_bucket("politics_us_election", &[&a], &[&b], &thresholds());
        assert!(pairs.is_empty());
        assert_eq!(metrics[3].rejection_reasons.get("time_misaligned"), Some(&1));
    }

    #[test]
    fn enumeration_order_is_preserved() {
        let a1 = market_at(Venue::VenueA, "a1", "Candidate X wins race", dec!(0.55), dec!(5000), Utc::now() + Duration::days(50));
        let a2 = market_at(Venue::VenueA, "a2", "Candidate X wins race too", dec!(0.40), dec!(5000), Utc::now() + Duration::days(50));
        let b1 = market_at(Venue::VenueB, "b1", "Candidate X election race winner", dec!(0.70), dec!(4800), Utc::now() + Duration::days(50));
        let (pairs, _) = run_bucket("politics_us_election", &[&a1, &a2], &[&b1], &thresholds());
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].handle_a.external_id.as_str(), "a1");
        assert_eq!(pairs[1].handle_a.external_id.as_str(), "a2");
    }
}
