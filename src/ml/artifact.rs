//! Versioned model artifact loading (SPEC_FULL.md §4.D point 4).
//!
//! The pipeline never ships a trained classifier — there is no training
//! harness here, only inference. A `ModelArtifact` is a serialized linear
//! combination over the contract feature vector, versioned so an operator
//! can swap models without recompiling, and schema-checked so an artifact
//! trained against a different feature contract is refused rather than
//! silently misscored.

use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;

use crate::domain::{FEATURE_COUNT, MLFeatures, MLPrediction};
use crate::error::{Error, Result};

use super::WorthinessScorer;

#[derive(Debug, Clone, Deserialize)]
pub struct ModelArtifact {
    pub version: String,
    pub feature_count: usize,
    pub weights: Vec<f64>,
    pub bias: f64,
    /// Confidence is reported as `min(0.9, worthiness + confidence_bonus)`,
    /// matching the conservative-estimate convention of the heuristic path.
    #[serde(default = "default_confidence_bonus")]
    pub confidence_bonus: f64,
}

fn default_confidence_bonus() -> f64 {
    0.1
}

impl ModelArtifact {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let artifact: Self = toml::from_str(&text)?;
        artifact.validate()?;
        Ok(artifact)
    }

    fn validate(&self) -> Result<()> {
        if self.feature_count != FEATURE_COUNT || self.weights.len() != FEATURE_COUNT {
            return Err(Error::ModelArtifact(format!(
                "artifact {} declares {} features, contract requires {FEATURE_COUNT}",
                self.version, self.feature_count,
            )));
        }
        Ok(())
    }

    fn logit(&self, features: &MLFeatures) -> f64 {
        let dot: f64 = self
            .weights
            .iter()
            .zip(features.as_slice().iter())
            .map(|(w, x)| w * x)
            .sum();
        dot + self.bias
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// A `WorthinessScorer` backed by a loaded [`ModelArtifact`].
pub struct ArtifactScorer {
    artifact: ModelArtifact,
}

impl ArtifactScorer {
    #[must_use]
    pub fn new(artifact: ModelArtifact) -> Self {
        Self { artifact }
    }
}

#[async_trait]
impl WorthinessScorer for ArtifactScorer {
    async fn score(&self, features: MLFeatures) -> Result<MLPrediction> {
        let worthiness = sigmoid(self.artifact.logit(&features));
        let confidence = (worthiness + self.artifact.confidence_bonus).min(0.9);
        Ok(MLPrediction {
            llm_worthiness: worthiness,
            confidence,
            features,
            model_version: self.artifact.version.clone(),
        })
    }

    fn model_version(&self) -> &str {
        &self.artifact.version
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact(weights: Vec<f64>) -> ModelArtifact {
        ModelArtifact {
            version: "test-v1".to_string(),
            feature_count: weights.len(),
            weights,
            bias: 0.0,
            confidence_bonus: 0.1,
        }
    }

    #[test]
    fn mismatched_feature_count_is_refused() {
        let bad = artifact(vec![0.0; FEATURE_COUNT - 1]);
        assert!(bad.validate().is_err());
    }

    #[test]
    fn matching_feature_count_validates() {
        let good = artifact(vec![0.1; FEATURE_COUNT]);
        assert!(good.validate().is_ok());
    }
}
