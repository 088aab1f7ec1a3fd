//! `LLMEvaluation` — stage-E output (SPEC_FULL.md §3 / §4.E).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecommendedAction {
    Proceed,
    Investigate,
    Reject,
}

/// The structured JSON schema the LLM prompt demands (§4.E "Prompt shape").
/// This is the one dynamic-map trust boundary in the pipeline: parsing a
/// provider's JSON text into this type is where untyped data is validated
/// into the typed domain.
#[derive(Debug, Clone, Deserialize)]
pub struct LlmResponseSchema {
    pub confidence: f64,
    pub semantic_similarity: f64,
    pub arbitrage_viability: f64,
    pub reasoning: String,
    pub recommended_action: RecommendedAction,
}

#[derive(Debug, Clone)]
pub struct LLMEvaluation {
    pub confidence: f64,
    pub semantic_similarity: f64,
    pub arbitrage_viability: f64,
    pub reasoning: String,
    pub recommended_action: RecommendedAction,
    pub provider: &'static str,
    pub model_version: String,
    pub timestamp: DateTime<Utc>,
}

impl LLMEvaluation {
    #[must_use]
    pub fn from_schema(
        schema: LlmResponseSchema,
        provider: &'static str,
        model_version: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            confidence: schema.confidence.clamp(0.0, 1.0),
            semantic_similarity: schema.semantic_similarity.clamp(0.0, 1.0),
            arbitrage_viability: schema.arbitrage_viability.clamp(0.0, 1.0),
            reasoning: schema.reasoning,
            recommended_action: schema.recommended_action,
            provider,
            model_version: model_version.into(),
            timestamp,
        }
    }

    /// A fallback evaluation for malformed JSON (§4.E, §7 "persistent
    /// external errors"): heavily de-prioritized downstream but not an
    /// error — the pair still proceeds.
    #[must_use]
    pub fn fallback_malformed(raw_text: &str, provider: &'static str, timestamp: DateTime<Utc>) -> Self {
        const TRUNCATE_AT: usize = 500;
        let truncated: String = raw_text.chars().take(TRUNCATE_AT).collect();
        Self {
            confidence: 0.5,
            semantic_similarity: 0.0,
            arbitrage_viability: 0.0,
            reasoning: truncated,
            recommended_action: RecommendedAction::Investigate,
            provider,
            model_version: "unknown".to_string(),
            timestamp,
        }
    }

    /// A fallback evaluation for a per-call failure (network error, timeout
    /// exhausted retries) — `confidence = 0` so it can never pass stage F's
    /// acceptance threshold under any default configuration (§7).
    #[must_use]
    pub fn fallback_failed(reason: &str, provider: &'static str, timestamp: DateTime<Utc>) -> Self {
        Self {
            confidence: 0.0,
            semantic_similarity: 0.0,
            arbitrage_viability: 0.0,
            reasoning: format!("call failed: {reason}"),
            recommended_action: RecommendedAction::Reject,
            provider,
            model_version: "unknown".to_string(),
            timestamp,
        }
    }

    #[must_use]
    pub fn meets_confidence_threshold(&self, threshold: f64) -> bool {
        self.confidence >= threshold
    }
}
