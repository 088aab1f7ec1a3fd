//! Fixture builders shared across unit and integration tests.
//!
//! Mirrors the teacher's `testkit` module: small constructors so tests read
//! as assertions on behavior, not boilerplate setup.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::domain::{
    Amount, Category, MarketHandle, MarketStatus, NormalizedMarket, Outcome, Price, Venue,
};

#[must_use]
pub fn market(venue: Venue, external_id: &str, title: &str) -> NormalizedMarket {
    market_at(venue, external_id, title, dec!(0.5), dec!(5000), Utc::now() + Duration::days(60))
}

#[must_use]
pub fn market_at(
    venue: Venue,
    external_id: &str,
    title: &str,
    yes_price: Decimal,
    volume: Decimal,
    close_time: DateTime<Utc>,
) -> NormalizedMarket {
    let no_price = Decimal::ONE - yes_price;
    NormalizedMarket {
        handle: MarketHandle::new(venue, external_id),
        title: title.to_string(),
        description: None,
        category: Category::Politics,
        outcomes: vec![
            Outcome { name: "Yes".into(), price: Price::clamped(yes_price), volume: Amount::non_negative(volume) },
            Outcome { name: "No".into(), price: Price::clamped(no_price), volume: Amount::non_negative(volume) },
        ],
        volume: Amount::non_negative(volume),
        liquidity: Amount::non_negative(volume * dec!(0.8)),
        close_time,
        status: MarketStatus::Active,
        semantic_bucket: None,
        bucket_confidence: None,
    }
}
