//! `MarketPair` — the stage-C/D/E working unit (SPEC_FULL.md §3).

use super::id::MarketHandle;
use super::market::NormalizedMarket;

/// Both sides of a candidate cross-venue match plus the bucket they share.
///
/// Fields beyond `bucket`/`handle_a`/`handle_b` are lazily populated by the
/// filter stage; each field's presence is a precondition for the stage that
/// follows it (§3). We model that with `Option`s rather than separate types
/// per stage so a `MarketPair` can flow unchanged through the funnel, the
/// way the teacher's `MarketPair` carries derived fields directly.
#[derive(Debug, Clone)]
pub struct MarketPair {
    pub bucket: String,
    pub handle_a: MarketHandle,
    pub handle_b: MarketHandle,

    /// Populated by filter stage 2.
    pub text_similarity: Option<f64>,
    /// Populated by filter stage 3.
    pub liquidity_score: Option<f64>,
    /// Populated by filter stage 4.
    pub time_alignment_score: Option<f64>,
    /// Populated by filter stage 1 (absolute Yes-equivalent price gap).
    pub price_spread: Option<f64>,
    /// Populated by filter stage 5.
    pub arbitrage_potential: Option<f64>,
}

impl MarketPair {
    #[must_use]
    pub fn new(bucket: impl Into<String>, handle_a: MarketHandle, handle_b: MarketHandle) -> Self {
        Self {
            bucket: bucket.into(),
            handle_a,
            handle_b,
            text_similarity: None,
            liquidity_score: None,
            time_alignment_score: None,
            price_spread: None,
            arbitrage_potential: None,
        }
    }

    #[must_use]
    pub fn pair_fingerprint(&self, a: &NormalizedMarket, b: &NormalizedMarket) -> String {
        // Content hash of (venue ids, titles) per the GLOSSARY definition —
        // the LLM cache key, independent of wall-clock or run ordering.
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.handle_a.to_string().as_bytes());
        hasher.update(a.title.as_bytes());
        hasher.update(self.handle_b.to_string().as_bytes());
        hasher.update(b.title.as_bytes());
        hasher.finalize().to_hex().to_string()
    }
}
