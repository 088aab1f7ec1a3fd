//! Feature extraction from a filtered `MarketPair` (SPEC_FULL.md §4.D point 2).

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::domain::{MLFeatures, MarketPair, NormalizedMarket};
use crate::filter::stopwords::is_stopword;
use crate::filter::text::title_jaccard;

/// Placeholder confidence for similarity search over historical pairs —
/// no historical pair store exists yet, so every pair gets the same
/// neutral default (mirrors the original engine's placeholder).
const SIMILAR_PAIR_DEFAULT_CONFIDENCE: f64 = 0.7;
const CLOSING_SOON_HOURS: f64 = 24.0;

fn content_words(title: &str) -> HashSet<String> {
    title
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty() && !is_stopword(w))
        .map(str::to_string)
        .collect()
}

fn cosine_bag_of_words(a: &str, b: &str) -> f64 {
    let words_a = content_words(a);
    let words_b = content_words(b);
    if words_a.is_empty() || words_b.is_empty() {
        return 0.0;
    }
    let intersection = words_a.intersection(&words_b).count() as f64;
    if intersection == 0.0 {
        return 0.0;
    }
    intersection / ((words_a.len() as f64) * (words_b.len() as f64)).sqrt()
}

fn overlapping_keyword_count(a: &str, b: &str) -> f64 {
    content_words(a).intersection(&content_words(b)).count() as f64
}

fn volume_ratio(a: &NormalizedMarket, b: &NormalizedMarket) -> f64 {
    let vol_a: f64 = a.volume.get().to_string().parse().unwrap_or(0.0);
    let vol_b: f64 = b.volume.get().to_string().parse().unwrap_or(0.0);
    let (min_vol, max_vol) = if vol_a < vol_b { (vol_a, vol_b) } else { (vol_b, vol_a) };
    if max_vol > 0.0 {
        min_vol / max_vol
    } else {
        0.0
    }
}

/// Build the contract feature vector for one pair. `bucket_success_rate`
/// comes from the caller (usually a lookup against recent run history);
/// absent history defaults to a neutral rate upstream of this function.
#[must_use]
pub fn extract_features(
    pair: &MarketPair,
    a: &NormalizedMarket,
    b: &NormalizedMarket,
    bucket_success_rate: f64,
    now: DateTime<Utc>,
) -> MLFeatures {
    let jaccard = pair.text_similarity.unwrap_or_else(|| title_jaccard(&a.title, &b.title, is_stopword));
    let cosine = cosine_bag_of_words(&a.title, &b.title);
    let keyword_overlap = overlapping_keyword_count(&a.title, &b.title);

    let price_a: f64 = a.yes_price().get().to_string().parse().unwrap_or(0.0);
    let price_b: f64 = b.yes_price().get().to_string().parse().unwrap_or(0.0);
    let abs_price_diff = (price_a - price_b).abs();

    let vol_ratio = volume_ratio(a, b);
    let category_match = a.category == b.category;

    let hours_between_close = (a.close_time - b.close_time).num_seconds().abs() as f64 / 3600.0;
    let closing_soon = |market: &NormalizedMarket| {
        (market.close_time - now).num_seconds() as f64 <= CLOSING_SOON_HOURS * 3600.0
    };
    let both_closing_soon = closing_soon(a) && closing_soon(b);

    let liquidity_score = pair.liquidity_score.unwrap_or(0.0);

    MLFeatures::new(
        jaccard,
        cosine,
        keyword_overlap,
        abs_price_diff,
        vol_ratio,
        category_match,
        hours_between_close,
        both_closing_soon,
        liquidity_score,
        bucket_success_rate,
        SIMILAR_PAIR_DEFAULT_CONFIDENCE,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::market_at;
    use crate::domain::Venue;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    #[test]
    fn identical_titles_maximize_text_features() {
        let a = market_at(Venue::VenueA, "a1", "Will Bitcoin hit $100k?", dec!(0.4), dec!(1000), Utc::now() + Duration::days(10));
        let b = market_at(Venue::VenueB, "b1", "Will Bitcoin hit $100k?", dec!(0.5), dec!(1000), Utc::now() + Duration::days(10));
        let pair = MarketPair::new("crypto_bitcoin", a.handle.clone(), b.handle.clone());
        let features = extract_features(&pair, &a, &b, 0.6, Utc::now());
        assert_eq!(features.token_set_jaccard(), 1.0);
        assert!(features.category_match());
    }

    #[test]
    fn volume_ratio_is_min_over_max() {
        let a = market_at(Venue::VenueA, "a1", "t", dec!(0.4), dec!(100), Utc::now() + Duration::days(10));
        let b = market_at(Venue::VenueB, "b1", "t", dec!(0.4), dec!(400), Utc::now() + Duration::days(10));
        let pair = MarketPair::new("bucket", a.handle.clone(), b.handle.clone());
        let features = extract_features(&pair, &a, &b, 0.6, Utc::now());
        assert!((features.volume_ratio() - 0.25).abs() < 1e-9);
    }
}
