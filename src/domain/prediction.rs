//! `MLPrediction` — stage-D output (SPEC_FULL.md §3 / §4.D).

use super::features::MLFeatures;

#[derive(Debug, Clone)]
pub struct MLPrediction {
    pub llm_worthiness: f64,
    pub confidence: f64,
    pub features: MLFeatures,
    pub model_version: String,
}

impl MLPrediction {
    #[must_use]
    pub fn meets_threshold(&self, ml_threshold: f64) -> bool {
        self.llm_worthiness >= ml_threshold
    }
}
