//! Semantic Bucketer — component B (SPEC_FULL.md §4.B).
//!
//! Assigns each normalized market to 0-or-1 named bucket and emits
//! `BucketPair`s: per bucket containing markets from both venues, the
//! counts needed to estimate `pairs_possible`.

use std::collections::HashMap;
use std::time::Instant;

use tracing::debug;

use crate::config::{BucketDefinition, BucketTable};
use crate::domain::{Category, NormalizedMarket, RejectionReason, StageMetrics, Venue};

const HARD_FAIL: f64 = 0.0;
const KEYWORD_COVERAGE_MAX: f64 = 50.0;
const CATEGORY_EXACT: f64 = 30.0;
const CATEGORY_SUBSTRING: f64 = 15.0;
const MIN_DATE_BONUS: f64 = 20.0;
const PRIORITY_STEP: f64 = 5.0;
const WINNER_RAW_SCORE_MIN: f64 = 40.0;

#[derive(Debug, Clone)]
pub struct BucketPair {
    pub bucket_name: String,
    pub venue_a_count: usize,
    pub venue_b_count: usize,
    pub pairs_possible: u64,
}

fn title_has_keyword(title_lower: &str, keyword: &str) -> bool {
    title_lower.contains(keyword)
}

/// Score one market against one bucket definition (§4.B scoring rules).
/// Returns `None` on a hard fail (missing required keyword, or an
/// excluded keyword present).
fn score_bucket(market: &NormalizedMarket, def: &BucketDefinition) -> Option<f64> {
    let title_lower = market.title.to_lowercase();

    for required in &def.required_keywords {
        if !title_has_keyword(&title_lower, required) {
            return Some(HARD_FAIL);
        }
    }
    for excluded in &def.excluded_keywords {
        if title_has_keyword(&title_lower, excluded) {
            return Some(HARD_FAIL);
        }
    }

    let mut raw = 0.0;
    if !def.optional_keywords.is_empty() {
        let matches = def
            .optional_keywords
            .iter()
            .filter(|kw| title_has_keyword(&title_lower, kw))
            .count();
        raw += KEYWORD_COVERAGE_MAX * (matches as f64 / def.optional_keywords.len() as f64);
    }

    if !def.categories.is_empty() {
        if def.categories.contains(&market.category) {
            raw += CATEGORY_EXACT;
        } else if category_substring_match(&def.categories, market.category) {
            raw += CATEGORY_SUBSTRING;
        }
    }

    if let Some(min_date) = def.min_event_date {
        if market.close_time >= min_date {
            raw += MIN_DATE_BONUS;
        }
    }

    Some(raw)
}

fn category_substring_match(allowed: &[Category], actual: Category) -> bool {
    // Categories are a closed enum (no free-text substrings to compare), so
    // "substring" match degrades to same-family membership; Other never
    // substring-matches anything specific.
    allowed.contains(&actual) && !matches!(actual, Category::Other)
}

/// Assign `semantic_bucket`/`bucket_confidence` on every market in place.
pub fn assign_buckets(markets: &mut [NormalizedMarket], table: &BucketTable) {
    for market in markets.iter_mut() {
        let mut best: Option<(&BucketDefinition, f64, f64)> = None; // (def, raw, priority_adjusted)
        for def in &table.definitions {
            let Some(raw) = score_bucket(market, def) else { continue };
            if raw <= HARD_FAIL {
                continue;
            }
            let priority_adjusted = raw + (5.0 - f64::from(def.priority)) * PRIORITY_STEP;
            let better = match &best {
                Some((_, _, best_adjusted)) => priority_adjusted > *best_adjusted,
                None => true,
            };
            if better {
                best = Some((def, raw, priority_adjusted));
            }
        }

        match best {
            Some((def, raw, _)) if raw >= WINNER_RAW_SCORE_MIN => {
                market.semantic_bucket = Some(def.name.clone());
                market.bucket_confidence = Some((raw / 100.0).clamp(0.0, 1.0));
            }
            _ => {
                market.semantic_bucket = Some(BucketTable::MISCELLANEOUS.to_string());
                market.bucket_confidence = Some(0.0);
            }
        }
    }
}

/// Build bucket pairs from already-bucketed markets, ordered by
/// `pairs_possible` descending (§4.B "Emission order").
#[must_use]
pub fn bucket_pairs(markets: &[NormalizedMarket]) -> Vec<BucketPair> {
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    for market in markets {
        let Some(bucket) = market.semantic_bucket.as_deref() else { continue };
        if bucket == BucketTable::MISCELLANEOUS {
            continue;
        }
        let entry = counts.entry(bucket).or_insert((0, 0));
        match market.venue() {
            Venue::VenueA => entry.0 += 1,
            Venue::VenueB => entry.1 += 1,
        }
    }

    let mut pairs: Vec<BucketPair> = counts
        .into_iter()
        .filter(|(_, (a, b))| *a > 0 && *b > 0)
        .map(|(name, (a, b))| BucketPair {
            bucket_name: name.to_string(),
            venue_a_count: a,
            venue_b_count: b,
            pairs_possible: (a as u64) * (b as u64),
        })
        .collect();

    pairs.sort_by(|x, y| y.pairs_possible.cmp(&x.pairs_possible));
    pairs
}

/// Run the full bucketing stage over a batch, producing `StageMetrics` with
/// one rejection-reason entry (`miscellaneous_bucket`) for markets that
/// never join a cross-venue pair.
pub fn run(markets: &mut Vec<NormalizedMarket>, table: &BucketTable) -> (Vec<BucketPair>, StageMetrics) {
    let start = Instant::now();
    let mut metrics = StageMetrics::new("bucket");
    metrics.input_count = markets.len();

    assign_buckets(markets, table);

    for market in markets.iter() {
        if market.semantic_bucket.as_deref() == Some(BucketTable::MISCELLANEOUS) {
            metrics.record_rejection(RejectionReason::MiscellaneousBucket);
        }
    }

    let pairs = bucket_pairs(markets);
    metrics.output_count = pairs.iter().map(|p| p.pairs_possible as usize).sum();
    metrics.duration = start.elapsed();
    debug!(buckets = pairs.len(), pairs_possible = metrics.output_count, "bucketing complete");
    (pairs, metrics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::market_at;
    use chrono::{Duration, Utc};
    use rust_decimal_macros::dec;

    fn politics_table() -> BucketTable {
        BucketTable::seed()
    }

    #[test]
    fn market_with_no_keyword_hits_goes_to_miscellaneous() {
        let mut m = market_at(Venue::VenueA, "a1", "completely unrelated filler text", dec!(0.5), dec!(100), Utc::now() + Duration::days(10));
        assign_buckets(std::slice::from_mut(&mut m), &politics_table());
        assert_eq!(m.semantic_bucket.as_deref(), Some(BucketTable::MISCELLANEOUS));
    }

    #[test]
    fn market_matching_required_keyword_is_bucketed() {
        let mut m = market_at(Venue::VenueA, "a1", "Will Bitcoin hit $100k by year end?", dec!(0.5), dec!(100), Utc::now() + Duration::days(10));
        m.category = Category::Cryptocurrency;
        assign_buckets(std::slice::from_mut(&mut m), &politics_table());
        assert_eq!(m.semantic_bucket.as_deref(), Some("crypto_bitcoin"));
    }

    #[test]
    fn disjoint_topics_never_pair() {
        let mut markets = vec![
            market_at(Venue::VenueA, "a1", "Bitcoin above $100k by year end", dec!(0.4), dec!(5000), Utc::now() + Duration::days(30)),
            market_at(Venue::VenueB, "b1", "Super Bowl LIX winner: Chiefs", dec!(0.6), dec!(4000), Utc::now() + Duration::days(30)),
        ];
        markets[0].category = Category::Cryptocurrency;
        markets[1].category = Category::Sports;
        let table = politics_table();
        assign_buckets(&mut markets, &table);
        let pairs = bucket_pairs(&markets);
        assert!(pairs.is_empty());
    }

    #[test]
    fn bucket_pairs_ordered_by_pairs_possible_descending() {
        let mut markets = Vec::new();
        for i in 0..3 {
            markets.push(market_at(Venue::VenueA, &format!("a{i}"), "Will Bitcoin hit $100k?", dec!(0.4), dec!(1000), Utc::now() + Duration::days(10)));
        }
        for i in 0..2 {
            markets.push(market_at(Venue::VenueB, &format!("b{i}"), "Bitcoin price prediction", dec!(0.5), dec!(1000), Utc::now() + Duration::days(10)));
        }
        for i in 0..1 {
            markets.push(market_at(Venue::VenueA, &format!("c{i}"), "Congress midterm senate race", dec!(0.3), dec!(1000), Utc::now() + Duration::days(10)));
        }
        markets.push(market_at(Venue::VenueB, "c0b", "Senate congress race outlook", dec!(0.3), dec!(1000), Utc::now() + Duration::days(10)));

        let table = politics_table();
        assign_buckets(&mut markets, &table);
        let pairs = bucket_pairs(&markets);
        assert!(pairs.len() >= 2);
        assert!(pairs.windows(2).all(|w| w[0].pairs_possible >= w[1].pairs_possible));
    }
}
