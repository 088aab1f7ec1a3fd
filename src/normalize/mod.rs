//! Market Normalizer — component A (SPEC_FULL.md §4.A).
//!
//! Exposes [`normalize`], `raw → NormalizedMarket | rejection`. Individual
//! record rejection is logged and counted, never fatal — the batch entry
//! point [`normalize_batch`] accumulates a [`StageMetrics`] alongside the
//! accepted markets.

mod category;

use std::time::Instant;

use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use tracing::debug;

use crate::config::NormalizationConfig;
use crate::domain::{
    Amount, MarketStatus, NormalizedMarket, Outcome, Price, RawMarket, RejectionReason,
    StageMetrics, Venue,
};

pub use category::{infer_category_from_title, map_venue_category};

const MAX_TITLE_LEN: usize = 512;
const MAX_DESCRIPTION_LEN: usize = 4096;
const DATE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.fZ", "%Y-%m-%dT%H:%M:%S%z", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d"];

/// Collapse whitespace and strip non-printable characters, then truncate.
/// Non-ASCII characters are stripped too when `config.strip_non_ascii` is set
/// (§4.A point 2).
fn clean_text(raw: &str, max_len: usize, config: &NormalizationConfig) -> String {
    let collapsed = raw
        .split_whitespace()
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    let stripped: String = collapsed
        .chars()
        .filter(|c| !c.is_control())
        .filter(|c| !config.strip_non_ascii || c.is_ascii())
        .collect();
    stripped.chars().take(max_len).collect()
}

fn parse_close_time(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in DATE_FORMATS {
        if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
        if let Ok(naive_date) = chrono::NaiveDate::parse_from_str(raw, fmt) {
            return Some(Utc.from_utc_datetime(&naive_date.and_hms_opt(0, 0, 0).unwrap()));
        }
    }
    None
}

fn parse_decimal(value: &serde_json::Value) -> Option<Decimal> {
    match value {
        serde_json::Value::Number(n) => n.as_f64().and_then(|f| Decimal::try_from(f).ok()),
        serde_json::Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// Extract outcomes venue-specifically (§4.A point 5).
fn extract_outcomes(venue: Venue, payload: &serde_json::Value) -> Option<Vec<Outcome>> {
    match venue {
        Venue::VenueA => {
            // Convention A: often only a Yes price is quoted; synthesize No.
            if let Some(outcomes) = payload.get("outcomes").and_then(|v| v.as_array()) {
                return extract_outcome_list(outcomes);
            }
            let yes_price = payload.get("yes_price").and_then(parse_decimal)?;
            let yes_price = Price::clamped(yes_price);
            let volume = payload
                .get("volume")
                .and_then(parse_decimal)
                .map(Amount::non_negative)
                .unwrap_or_else(Amount::zero);
            Some(vec![
                Outcome { name: "Yes".into(), price: yes_price, volume },
                Outcome { name: "No".into(), price: yes_price.complement(), volume },
            ])
        }
        Venue::VenueB => {
            if let Some(outcomes) = payload.get("outcomes").and_then(|v| v.as_array()) {
                return extract_outcome_list(outcomes);
            }
            // Default to binary Yes/No when absent (§4.A point 5).
            let yes_price = payload
                .get("yes_price")
                .and_then(parse_decimal)
                .unwrap_or(Decimal::new(5, 1)); // 0.5
            let yes_price = Price::clamped(yes_price);
            let volume = payload
                .get("volume")
                .and_then(parse_decimal)
                .map(Amount::non_negative)
                .unwrap_or_else(Amount::zero);
            Some(vec![
                Outcome { name: "Yes".into(), price: yes_price, volume },
                Outcome { name: "No".into(), price: yes_price.complement(), volume },
            ])
        }
    }
}

fn extract_outcome_list(outcomes: &[serde_json::Value]) -> Option<Vec<Outcome>> {
    if outcomes.is_empty() {
        return None;
    }
    Some(
        outcomes
            .iter()
            .map(|o| {
                let name = o.get("name").and_then(|v| v.as_str()).unwrap_or("Outcome").to_string();
                let price = o.get("price").and_then(parse_decimal).unwrap_or(Decimal::new(5, 1));
                let volume = o.get("volume").and_then(parse_decimal).unwrap_or(Decimal::ZERO);
                Outcome {
                    name,
                    price: Price::clamped(price),
                    volume: Amount::non_negative(volume),
                }
            })
            .collect(),
    )
}

/// Derive liquidity as `mean(outcome_volume) * (1 - price_spread)`, bounded
/// by total volume (§4.A point 7).
fn derive_liquidity(outcomes: &[Outcome], total_volume: Decimal) -> Amount {
    if outcomes.is_empty() {
        return Amount::zero();
    }
    let mean_volume: Decimal =
        outcomes.iter().map(|o| o.volume.get()).sum::<Decimal>() / Decimal::from(outcomes.len());
    let price_spread = if outcomes.len() >= 2 {
        (outcomes[0].price.get() - outcomes[1].price.get()).abs()
    } else {
        Decimal::ZERO
    };
    let one = Decimal::ONE;
    let raw = mean_volume * (one - price_spread).max(Decimal::ZERO);
    Amount::non_negative(raw.min(total_volume))
}

/// Normalize one raw record. Returns the rejection reason on failure
/// (§4.A "Failure mode").
pub fn normalize(
    raw: &RawMarket,
    now: DateTime<Utc>,
    config: &NormalizationConfig,
) -> Result<NormalizedMarket, RejectionReason> {
    if raw.external_id.trim().is_empty() {
        return Err(RejectionReason::MissingExternalId);
    }

    let title = raw
        .raw_payload
        .get("title")
        .or_else(|| raw.raw_payload.get("question"))
        .and_then(|v| v.as_str())
        .map(|s| clean_text(s, MAX_TITLE_LEN, config))
        .unwrap_or_default();

    let description = raw
        .raw_payload
        .get("description")
        .and_then(|v| v.as_str())
        .map(|s| clean_text(s, MAX_DESCRIPTION_LEN, config))
        .filter(|s| !s.is_empty());

    let raw_category = raw.raw_payload.get("category").and_then(|v| v.as_str()).unwrap_or("");
    let category = map_venue_category(raw.venue, raw_category).unwrap_or_else(|| {
        let inferred = infer_category_from_title(&title);
        debug!(venue = %raw.venue, raw_category, ?inferred, "category unmapped, used keyword fallback");
        inferred
    });

    let close_time_raw = raw
        .raw_payload
        .get("close_time")
        .or_else(|| raw.raw_payload.get("end_date"))
        .and_then(|v| v.as_str())
        .ok_or(RejectionReason::UnparsableDate)?;
    let close_time = parse_close_time(close_time_raw).ok_or(RejectionReason::UnparsableDate)?;

    let min_date = now - Duration::days(365);
    let max_date = now + Duration::days(365 * 3 + 1);
    if close_time < min_date || close_time > max_date {
        return Err(RejectionReason::DateOutOfRange);
    }

    let outcomes = extract_outcomes(raw.venue, &raw.raw_payload).ok_or(RejectionReason::PriceOutOfRange)?;

    let total_volume = raw
        .raw_payload
        .get("volume")
        .and_then(parse_decimal)
        .map(Amount::non_negative)
        .unwrap_or_else(|| outcomes.iter().map(|o| o.volume).sum());

    let liquidity = raw
        .raw_payload
        .get("liquidity")
        .and_then(parse_decimal)
        .map(Amount::non_negative)
        .unwrap_or_else(|| derive_liquidity(&outcomes, total_volume.get()));

    let status = match raw.raw_payload.get("status").and_then(|v| v.as_str()) {
        Some("closed") => MarketStatus::Closed,
        Some("suspended") => MarketStatus::Suspended,
        _ if close_time <= now => MarketStatus::Closed,
        _ => MarketStatus::Active,
    };

    Ok(NormalizedMarket {
        handle: crate::domain::MarketHandle::new(raw.venue, raw.external_id.clone()),
        title,
        description,
        category,
        outcomes,
        volume: total_volume,
        liquidity,
        close_time,
        status,
        semantic_bucket: None,
        bucket_confidence: None,
    })
}

/// Normalize a batch, accumulating `StageMetrics` (one rejection-reason
/// histogram entry per failed record).
#[must_use]
pub fn normalize_batch(
    raws: &[RawMarket],
    now: DateTime<Utc>,
    config: &NormalizationConfig,
) -> (Vec<NormalizedMarket>, StageMetrics) {
    let start = Instant::now();
    let mut metrics = StageMetrics::new("normalize");
    metrics.input_count = raws.len();

    let mut accepted = Vec::with_capacity(raws.len());
    for raw in raws {
        match normalize(raw, now, config) {
            Ok(market) => accepted.push(market),
            Err(reason) => metrics.record_rejection(reason),
        }
    }
    metrics.output_count = accepted.len();
    metrics.duration = start.elapsed();
    (accepted, metrics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Category;
    use serde_json::json;

    fn raw(venue: Venue, id: &str, payload: serde_json::Value) -> RawMarket {
        RawMarket {
            venue,
            external_id: id.to_string(),
            raw_payload: payload,
            fetched_at: Utc::now(),
        }
    }

    #[test]
    fn rejects_missing_external_id() {
        let r = raw(Venue::VenueA, "", json!({}));
        assert_eq!(
            normalize(&r, Utc::now(), &NormalizationConfig::default()).unwrap_err(),
            RejectionReason::MissingExternalId
        );
    }

    #[test]
    fn rejects_unparsable_date() {
        let r = raw(Venue::VenueA, "m1", json!({"title": "t", "close_time": "not-a-date"}));
        assert_eq!(
            normalize(&r, Utc::now(), &NormalizationConfig::default()).unwrap_err(),
            RejectionReason::UnparsableDate
        );
    }

    #[test]
    fn rejects_date_out_of_range() {
        let r = raw(
            Venue::VenueA,
            "m1",
            json!({"title": "t", "close_time": "2099-01-01T00:00:00Z", "yes_price": 0.5}),
        );
        assert_eq!(
            normalize(&r, Utc::now(), &NormalizationConfig::default()).unwrap_err(),
            RejectionReason::DateOutOfRange
        );
    }

    #[test]
    fn synthesizes_no_outcome_for_venue_a_yes_only_quote() {
        let close = (Utc::now() + Duration::days(10)).to_rfc3339();
        let r = raw(
            Venue::VenueA,
            "m1",
            json!({"title": "Will X happen?", "close_time": close, "yes_price": 0.3, "volume": 1000}),
        );
        let market = normalize(&r, Utc::now(), &NormalizationConfig::default()).expect("should normalize");
        assert_eq!(market.outcomes.len(), 2);
        assert_eq!(market.outcomes[1].price.get(), rust_decimal_macros::dec!(0.7));
    }

    #[test]
    fn unmapped_category_falls_back_to_keyword_inference() {
        let close = (Utc::now() + Duration::days(10)).to_rfc3339();
        let r = raw(
            Venue::VenueB,
            "m1",
            json!({
                "question": "Will Bitcoin hit $100k?",
                "close_time": close,
                "category": "nonsense-category",
                "outcomes": [{"name": "Yes", "price": 0.4}, {"name": "No", "price": 0.6}],
            }),
        );
        let market = normalize(&r, Utc::now(), &NormalizationConfig::default()).expect("should normalize");
        assert_eq!(market.category, Category::Cryptocurrency);
    }

    #[test]
    fn batch_counts_rejections_without_failing_whole_batch() {
        let close = (Utc::now() + Duration::days(10)).to_rfc3339();
        let raws = vec![
            raw(Venue::VenueA, "", json!({})),
            raw(Venue::VenueA, "m1", json!({"title": "t", "close_time": close, "yes_price": 0.4})),
        ];
        let (accepted, metrics) = normalize_batch(&raws, Utc::now(), &NormalizationConfig::default());
        assert_eq!(accepted.len(), 1);
        assert_eq!(metrics.input_count, 2);
        assert_eq!(metrics.output_count, 1);
        assert_eq!(metrics.rejection_reasons.get("missing_external_id"), Some(&1));
    }

    #[test]
    fn strip_non_ascii_only_applies_when_configured() {
        let close = (Utc::now() + Duration::days(10)).to_rfc3339();
        let r = raw(Venue::VenueA, "m1", json!({"title": "Will Bitcoin hit \u{1F680} $100k?", "close_time": close, "yes_price": 0.4}));

        let kept = normalize(&r, Utc::now(), &NormalizationConfig::default()).expect("should normalize");
        assert!(kept.title.contains('\u{1F680}'));

        let stripped_config = NormalizationConfig { strip_non_ascii: true };
        let stripped = normalize(&r, Utc::now(), &stripped_config).expect("should normalize");
        assert!(stripped.title.is_ascii());
    }
}
