//! `MLFeatures` — fixed-length, stably-ordered feature vector (SPEC_FULL.md §3).
//!
//! Ordering is part of the model contract: never reorder without
//! retraining. The wrapper type makes reordering a compile error for
//! anything outside this module — callers use named accessors, not indices.

pub const FEATURE_COUNT: usize = 11;

/// The model-contract feature vector for one `MarketPair`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MLFeatures {
    values: [f64; FEATURE_COUNT],
}

/// Index of each named feature within the contract vector. Keep in sync
/// with `MLFeatures::new`'s parameter order.
#[derive(Debug, Clone, Copy)]
#[repr(usize)]
enum Slot {
    TokenSetJaccard = 0,
    CosineBagOfWords = 1,
    OverlappingKeywordCount = 2,
    AbsPriceDifference = 3,
    VolumeRatio = 4,
    CategoryMatch = 5,
    HoursBetweenClose = 6,
    BothClosingWithin24h = 7,
    LiquidityScore = 8,
    BucketHistoricalSuccessRate = 9,
    SimilarPairHistoricalConfidence = 10,
}

impl MLFeatures {
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        token_set_jaccard: f64,
        cosine_bag_of_words: f64,
        overlapping_keyword_count: f64,
        abs_price_difference: f64,
        volume_ratio: f64,
        category_match: bool,
        hours_between_close: f64,
        both_closing_within_24h: bool,
        liquidity_score: f64,
        bucket_historical_success_rate: f64,
        similar_pair_historical_confidence: f64,
    ) -> Self {
        let mut values = [0.0; FEATURE_COUNT];
        values[Slot::TokenSetJaccard as usize] = token_set_jaccard;
        values[Slot::CosineBagOfWords as usize] = cosine_bag_of_words;
        values[Slot::OverlappingKeywordCount as usize] = overlapping_keyword_count;
        values[Slot::AbsPriceDifference as usize] = abs_price_difference;
        values[Slot::VolumeRatio as usize] = volume_ratio;
        values[Slot::CategoryMatch as usize] = if category_match { 1.0 } else { 0.0 };
        values[Slot::HoursBetweenClose as usize] = hours_between_close;
        values[Slot::BothClosingWithin24h as usize] = if both_closing_within_24h { 1.0 } else { 0.0 };
        values[Slot::LiquidityScore as usize] = liquidity_score;
        values[Slot::BucketHistoricalSuccessRate as usize] = bucket_historical_success_rate;
        values[Slot::SimilarPairHistoricalConfidence as usize] = similar_pair_historical_confidence;
        Self { values }
    }

    #[must_use]
    pub fn token_set_jaccard(&self) -> f64 {
        self.values[Slot::TokenSetJaccard as usize]
    }

    #[must_use]
    pub fn cosine_bag_of_words(&self) -> f64 {
        self.values[Slot::CosineBagOfWords as usize]
    }

    #[must_use]
    pub fn abs_price_difference(&self) -> f64 {
        self.values[Slot::AbsPriceDifference as usize]
    }

    #[must_use]
    pub fn volume_ratio(&self) -> f64 {
        self.values[Slot::VolumeRatio as usize]
    }

    #[must_use]
    pub fn category_match(&self) -> bool {
        self.values[Slot::CategoryMatch as usize] != 0.0
    }

    /// The raw vector, in contract order, for serialization into a
    /// `MLPrediction` snapshot or for feeding a loaded model artifact.
    #[must_use]
    pub fn as_slice(&self) -> &[f64; FEATURE_COUNT] {
        &self.values
    }
}
