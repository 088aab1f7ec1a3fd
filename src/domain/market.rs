//! `NormalizedMarket` — the stage-A contract (SPEC_FULL.md §3).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{ExternalId, MarketHandle, Venue};
use super::money::{Amount, Price};

/// The closed category vocabulary every raw venue category is mapped into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Politics,
    Economics,
    Sports,
    Cryptocurrency,
    Technology,
    Weather,
    Entertainment,
    Business,
    Science,
    Other,
}

impl Category {
    /// All variants, in a stable order used by keyword-fallback inference.
    pub const ALL: [Category; 10] = [
        Category::Politics,
        Category::Economics,
        Category::Sports,
        Category::Cryptocurrency,
        Category::Technology,
        Category::Weather,
        Category::Entertainment,
        Category::Business,
        Category::Science,
        Category::Other,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketStatus {
    Active,
    Closed,
    Suspended,
}

/// A single outcome leg: name, Yes-equivalent price, and its volume.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Outcome {
    pub name: String,
    pub price: Price,
    pub volume: Amount,
}

/// The stage-A contract. Identity is `(venue, external_id)`.
///
/// Invariants enforced at construction (`NormalizedMarket::validate`) and
/// assumed true by every later stage:
/// - prices/volumes finite and non-negative (guaranteed by the `Price`/
///   `Amount` newtypes);
/// - binary markets have exactly two outcomes, Yes-equivalent at index 0;
/// - `close_time > now` for markets considered active.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedMarket {
    pub handle: MarketHandle,
    pub title: String,
    pub description: Option<String>,
    pub category: Category,
    pub outcomes: Vec<Outcome>,
    pub volume: Amount,
    pub liquidity: Amount,
    pub close_time: DateTime<Utc>,
    pub status: MarketStatus,
    pub semantic_bucket: Option<String>,
    pub bucket_confidence: Option<f64>,
}

impl NormalizedMarket {
    #[must_use]
    pub fn venue(&self) -> Venue {
        self.handle.venue
    }

    #[must_use]
    pub fn external_id(&self) -> &ExternalId {
        &self.handle.external_id
    }

    #[must_use]
    pub fn is_binary(&self) -> bool {
        self.outcomes.len() == 2
    }

    /// The Yes-equivalent price: the binary convention's index-0 outcome.
    #[must_use]
    pub fn yes_price(&self) -> Price {
        self.outcomes
            .first()
            .map(|o| o.price)
            .unwrap_or_else(|| Price::clamped(rust_decimal::Decimal::ZERO))
    }

    #[must_use]
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.status == MarketStatus::Active && self.close_time > now
    }

    /// Reject reasons a market fails structural validation for, if any.
    ///
    /// This is distinct from normalizer *rejection* (§4.A) — this checks
    /// the invariants a `NormalizedMarket` must uphold once constructed,
    /// used by tests and by the normalizer as its own final assertion.
    #[must_use]
    pub fn violates_invariants(&self) -> bool {
        if self.is_binary() {
            let sum: rust_decimal::Decimal =
                self.outcomes.iter().map(|o| o.price.get()).sum();
            let tolerance = rust_decimal_macros::dec!(0.02);
            let one = rust_decimal::Decimal::ONE;
            if (sum - one).abs() > tolerance {
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn market(price_yes: rust_decimal::Decimal, price_no: rust_decimal::Decimal) -> NormalizedMarket {
        NormalizedMarket {
            handle: MarketHandle::new(Venue::VenueA, "m1"),
            title: "Will it happen?".into(),
            description: None,
            category: Category::Politics,
            outcomes: vec![
                Outcome { name: "Yes".into(), price: Price::clamped(price_yes), volume: Amount::non_negative(dec!(100)) },
                Outcome { name: "No".into(), price: Price::clamped(price_no), volume: Amount::non_negative(dec!(100)) },
            ],
            volume: Amount::non_negative(dec!(200)),
            liquidity: Amount::non_negative(dec!(150)),
            close_time: Utc::now() + chrono::Duration::days(30),
            status: MarketStatus::Active,
            semantic_bucket: None,
            bucket_confidence: None,
        }
    }

    #[test]
    fn binary_prices_summing_to_one_are_valid() {
        assert!(!market(dec!(0.4), dec!(0.6)).violates_invariants());
    }

    #[test]
    fn binary_prices_far_from_one_violate_invariant() {
        assert!(market(dec!(0.4), dec!(0.3)).violates_invariants());
    }

    #[test]
    fn yes_price_is_index_zero() {
        let m = market(dec!(0.4), dec!(0.6));
        assert_eq!(m.yes_price().get(), dec!(0.4));
    }

    #[test]
    fn is_active_requires_future_close_and_active_status() {
        let now = Utc::now();
        let mut m = market(dec!(0.4), dec!(0.6));
        assert!(m.is_active(now));
        m.status = MarketStatus::Closed;
        assert!(!m.is_active(now));
    }
}
