//! Position sizing and transaction cost modeling (SPEC_FULL.md §4.F points 2, 4).

use rust_decimal::Decimal;

use crate::config::ScoringConstants;
use crate::domain::{NormalizedMarket, TransactionCostAnalysis};

fn volume_f64(market: &NormalizedMarket) -> f64 {
    market.volume.get().to_string().parse().unwrap_or(0.0)
}

fn decimal_from_f64(value: f64) -> Decimal {
    Decimal::try_from(value).unwrap_or(Decimal::ZERO)
}

/// Simplified Kelly fraction from the estimated win rate and the price
/// spread as the per-unit payout (§4.F point 2).
fn kelly_fraction(win_rate: f64, spread: f64, cap: f64) -> f64 {
    if spread <= 0.0 {
        return 0.0;
    }
    let fraction = (win_rate * spread - (1.0 - win_rate)) / spread;
    fraction.clamp(0.0, cap)
}

/// Position size in USD: the minimum of the liquidity cap, the configured
/// hard cap, and the Kelly-fraction cap.
#[must_use]
pub fn position_size(a: &NormalizedMarket, b: &NormalizedMarket, spread: f64, scoring: &ScoringConstants) -> Decimal {
    let min_volume = volume_f64(a).min(volume_f64(b));
    let liquidity_cap = min_volume * scoring.liquidity_position_fraction;
    let kelly_cap = scoring.max_position_usd * kelly_fraction(scoring.kelly_win_rate, spread, scoring.kelly_fraction_cap);
    let optimal = liquidity_cap.min(scoring.max_position_usd).min(kelly_cap.max(0.0));
    decimal_from_f64(optimal.max(0.0)).round_dp(2)
}

/// Transaction costs: per-venue trading fee, flat gas estimate, and
/// volume-proportional slippage on each side (§4.F point 4).
#[must_use]
pub fn transaction_costs(
    a: &NormalizedMarket,
    b: &NormalizedMarket,
    position: Decimal,
    scoring: &ScoringConstants,
) -> TransactionCostAnalysis {
    let venue_a_fee = position * decimal_from_f64(scoring.venue_a_fee_pct);
    let venue_b_fee = position * decimal_from_f64(scoring.venue_b_fee_pct);
    let gas_estimate = decimal_from_f64(scoring.gas_estimate_usd);

    let position_f64: f64 = position.to_string().parse().unwrap_or(0.0);
    let vol_a = volume_f64(a).max(1.0);
    let vol_b = volume_f64(b).max(1.0);
    let slippage_rate_a = (position_f64 / vol_a * 0.5).min(0.01);
    let slippage_rate_b = (position_f64 / vol_b * 0.5).min(0.01);
    let slippage = position * decimal_from_f64(slippage_rate_a + slippage_rate_b);

    let total_cost = venue_a_fee + venue_b_fee + gas_estimate + slippage;
    let cost_percentage = if position > Decimal::ZERO {
        (total_cost / position).to_string().parse().unwrap_or(0.0)
    } else {
        0.0
    };

    TransactionCostAnalysis {
        venue_a_fee,
        venue_b_fee,
        gas_estimate,
        slippage,
        total_cost,
        cost_percentage,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::market_at;
    use crate::domain::Venue;
    use chrono::{Duration, Utc};
    use rust_decimal_macros::dec;

    fn scoring() -> ScoringConstants {
        ScoringConstants {
            kelly_win_rate: 0.8,
            kelly_fraction_cap: 0.25,
            liquidity_position_fraction: 0.2,
            max_position_usd: 10_000.0,
            venue_a_fee_pct: 0.02,
            venue_b_fee_pct: 0.01,
            gas_estimate_usd: 0.50,
            max_execution_hours: 24,
        }
    }

    #[test]
    fn position_never_exceeds_the_configured_cap() {
        let a = market_at(Venue::VenueA, "a1", "t", dec!(0.4), dec!(1_000_000), Utc::now() + Duration::days(10));
        let b = market_at(Venue::VenueB, "b1", "t", dec!(0.45), dec!(1_000_000), Utc::now() + Duration::days(10));
        let size = position_size(&a, &b, 0.05, &scoring());
        assert!(size <= decimal_from_f64(10_000.0));
    }

    #[test]
    fn zero_liquidity_yields_zero_position() {
        let a = market_at(Venue::VenueA, "a1", "t", dec!(0.4), dec!(0), Utc::now() + Duration::days(10));
        let b = market_at(Venue::VenueB, "b1", "t", dec!(0.45), dec!(0), Utc::now() + Duration::days(10));
        let size = position_size(&a, &b, 0.05, &scoring());
        assert_eq!(size, Decimal::ZERO);
    }

    #[test]
    fn costs_are_all_non_negative() {
        let a = market_at(Venue::VenueA, "a1", "t", dec!(0.4), dec!(5000), Utc::now() + Duration::days(10));
        let b = market_at(Venue::VenueB, "b1", "t", dec!(0.45), dec!(5000), Utc::now() + Duration::days(10));
        let position = position_size(&a, &b, 0.05, &scoring());
        let costs = transaction_costs(&a, &b, position, &scoring());
        assert!(costs.total_cost >= Decimal::ZERO);
        assert!(costs.venue_a_fee >= Decimal::ZERO);
    }
}
