//! ML Worthiness Scorer — component D (SPEC_FULL.md §4.D).
//!
//! Predicts whether a surviving `MarketPair` is worth the cost of an LLM
//! call. [`WorthinessScorer`] is the seam: [`HeuristicScorer`] needs no
//! trained model and is always available; [`ArtifactScorer`] loads a
//! versioned linear-weight artifact and refuses to run if its feature
//! schema doesn't match the contract in [`crate::domain::features`].

mod artifact;
mod extract;

use std::time::Instant;

use async_trait::async_trait;

use crate::domain::{MLFeatures, MLPrediction, MarketPair, NormalizedMarket, StageMetrics};
use crate::error::Result;

pub use artifact::{ArtifactScorer, ModelArtifact};
pub use extract::extract_features;

/// Text-similarity weight in the heuristic score (§4.D "Heuristic fallback").
const TEXT_SIM_WEIGHT: f64 = 0.4;
const PRICE_DIFF_WEIGHT: f64 = 0.3;
const CATEGORY_MATCH_WEIGHT: f64 = 0.2;
const VOLUME_RATIO_WEIGHT: f64 = 0.1;
/// Price differences beyond this are fully saturated in the heuristic.
const PRICE_DIFF_SATURATION: f64 = 0.10;

#[async_trait]
pub trait WorthinessScorer: Send + Sync {
    async fn score(&self, features: MLFeatures) -> Result<MLPrediction>;

    fn model_version(&self) -> &str;

    async fn score_batch(&self, batch: &[MLFeatures]) -> Result<Vec<MLPrediction>> {
        let mut out = Vec::with_capacity(batch.len());
        for features in batch {
            out.push(self.score(*features).await?);
        }
        Ok(out)
    }
}

/// The always-available heuristic: `0.4*text_sim + 0.3*price_score +
/// 0.2*category_match + 0.1*volume_ratio`, scaled to `[0,1]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicScorer;

impl HeuristicScorer {
    #[must_use]
    pub fn heuristic_score(features: &MLFeatures) -> f64 {
        let text_score = features.token_set_jaccard();
        let price_score = (features.abs_price_difference() / PRICE_DIFF_SATURATION).min(1.0);
        let category_score = if features.category_match() { 1.0 } else { 0.0 };
        let volume_score = features.volume_ratio();

        (TEXT_SIM_WEIGHT * text_score
            + PRICE_DIFF_WEIGHT * price_score
            + CATEGORY_MATCH_WEIGHT * category_score
            + VOLUME_RATIO_WEIGHT * volume_score)
            .clamp(0.0, 1.0)
    }
}

#[async_trait]
impl WorthinessScorer for HeuristicScorer {
    async fn score(&self, features: MLFeatures) -> Result<MLPrediction> {
        let worthiness = Self::heuristic_score(&features);
        Ok(MLPrediction {
            // Conservative estimate, matching the heuristic fallback's
            // discount on its own confidence.
            confidence: worthiness * 0.8,
            llm_worthiness: worthiness,
            features,
            model_version: "heuristic".to_string(),
        })
    }

    fn model_version(&self) -> &str {
        "heuristic"
    }
}

/// Run stage D over every surviving pair: extract features, score, and
/// split by `ml_threshold` (§4.D "Gate").
pub async fn run(
    scorer: &dyn WorthinessScorer,
    pairs: &[MarketPair],
    market_a: impl Fn(&MarketPair) -> &NormalizedMarket,
    market_b: impl Fn(&MarketPair) -> &NormalizedMarket,
    bucket_success_rate: impl Fn(&str) -> f64,
    now: chrono::DateTime<chrono::Utc>,
    ml_threshold: f64,
) -> (Vec<(MarketPair, MLPrediction)>, StageMetrics) {
    let start = Instant::now();
    let mut metrics = StageMetrics::new("ml_worthiness");
    metrics.input_count = pairs.len();

    let mut advanced = Vec::new();
    for pair in pairs {
        let a = market_a(pair);
        let b = market_b(pair);
        let features = extract_features(pair, a, b, bucket_success_rate(&pair.bucket), now);
        let prediction = match scorer.score(features).await {
            Ok(p) => p,
            Err(_) => {
                metrics.record_rejection(crate::domain::RejectionReason::LowLiquidityScore);
                continue;
            }
        };
        if prediction.meets_threshold(ml_threshold) {
            advanced.push((pair.clone(), prediction));
        }
    }

    metrics.output_count = advanced.len();
    metrics.duration = start.elapsed();
    (advanced, metrics)
}
