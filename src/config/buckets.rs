//! Static bucket definitions for the semantic bucketer (SPEC_FULL.md §4.B).
//!
//! Externally loadable via `[[buckets]]` tables in the pipeline TOML config;
//! `BucketTable::seed` carries the politics/crypto/sports/economics
//! definitions from `examples/original_source/.../engines/bucketing.py` as
//! sane out-of-the-box defaults.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::domain::Category;

#[derive(Debug, Clone, Deserialize)]
pub struct BucketDefinition {
    pub name: String,
    #[serde(default)]
    pub required_keywords: Vec<String>,
    #[serde(default)]
    pub optional_keywords: Vec<String>,
    #[serde(default)]
    pub excluded_keywords: Vec<String>,
    #[serde(default)]
    pub categories: Vec<Category>,
    /// 1 is highest priority.
    pub priority: u8,
    #[serde(default)]
    pub min_event_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub price_range: Option<(f64, f64)>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct BucketTable {
    #[serde(rename = "buckets")]
    pub definitions: Vec<BucketDefinition>,
}

impl BucketTable {
    /// The sentinel bucket name never emitted for cross-venue comparison.
    pub const MISCELLANEOUS: &'static str = "miscellaneous";

    #[must_use]
    pub fn seed() -> Self {
        let kw = |words: &[&str]| words.iter().map(|w| w.to_string()).collect::<Vec<_>>();
        Self {
            definitions: vec![
                BucketDefinition {
                    name: "politics_us_election".into(),
                    required_keywords: vec![],
                    optional_keywords: kw(&[
                        "election", "president", "presidential", "candidate", "electoral",
                        "vote", "ballot", "nominee",
                    ]),
                    excluded_keywords: vec![],
                    categories: vec![Category::Politics],
                    priority: 1,
                    min_event_date: None,
                    price_range: None,
                },
                BucketDefinition {
                    name: "politics_congress".into(),
                    required_keywords: vec![],
                    optional_keywords: kw(&[
                        "congress", "senate", "house", "representative", "senator", "midterm",
                    ]),
                    excluded_keywords: vec![],
                    categories: vec![Category::Politics],
                    priority: 2,
                    min_event_date: None,
                    price_range: None,
                },
                BucketDefinition {
                    name: "crypto_bitcoin".into(),
                    required_keywords: kw(&["bitcoin", "btc"]),
                    optional_keywords: kw(&["bitcoin", "btc", "price", "halving", "etf"]),
                    excluded_keywords: vec![],
                    categories: vec![Category::Cryptocurrency],
                    priority: 1,
                    min_event_date: None,
                    price_range: Some((1_000.0, 500_000.0)),
                },
                BucketDefinition {
                    name: "crypto_ethereum".into(),
                    required_keywords: kw(&["ethereum", "eth"]),
                    optional_keywords: kw(&["ethereum", "eth", "ether", "merge", "staking"]),
                    excluded_keywords: vec![],
                    categories: vec![Category::Cryptocurrency],
                    priority: 1,
                    min_event_date: None,
                    price_range: None,
                },
                BucketDefinition {
                    name: "crypto_general".into(),
                    required_keywords: vec![],
                    optional_keywords: kw(&["crypto", "cryptocurrency", "coin", "token", "defi", "nft"]),
                    excluded_keywords: vec![],
                    categories: vec![Category::Cryptocurrency],
                    priority: 3,
                    min_event_date: None,
                    price_range: None,
                },
                BucketDefinition {
                    name: "sports_nfl".into(),
                    required_keywords: vec![],
                    optional_keywords: kw(&["nfl", "super bowl", "football", "playoffs"]),
                    excluded_keywords: vec![],
                    categories: vec![Category::Sports],
                    priority: 1,
                    min_event_date: None,
                    price_range: None,
                },
                BucketDefinition {
                    name: "sports_soccer".into(),
                    required_keywords: vec![],
                    optional_keywords: kw(&["world cup", "fifa", "soccer", "uefa", "premier league"]),
                    excluded_keywords: vec![],
                    categories: vec![Category::Sports],
                    priority: 2,
                    min_event_date: None,
                    price_range: None,
                },
                BucketDefinition {
                    name: "economics_fed_rates".into(),
                    required_keywords: kw(&["fed", "rate"]),
                    optional_keywords: kw(&[
                        "federal reserve", "interest rate", "rate hike", "rate cut", "fomc",
                    ]),
                    excluded_keywords: vec![],
                    categories: vec![Category::Economics],
                    priority: 1,
                    min_event_date: None,
                    price_range: None,
                },
                BucketDefinition {
                    name: "economics_inflation".into(),
                    required_keywords: vec![],
                    optional_keywords: kw(&["inflation", "cpi", "consumer price index"]),
                    excluded_keywords: vec![],
                    categories: vec![Category::Economics],
                    priority: 2,
                    min_event_date: None,
                    price_range: None,
                },
                BucketDefinition {
                    name: "weather_general".into(),
                    required_keywords: vec![],
                    optional_keywords: kw(&["rain", "snow", "hurricane", "temperature", "weather"]),
                    excluded_keywords: vec![],
                    categories: vec![Category::Weather],
                    priority: 3,
                    min_event_date: None,
                    price_range: None,
                },
            ],
        }
    }
}
