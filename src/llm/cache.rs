//! Pair-fingerprint-keyed LLM evaluation cache (SPEC_FULL.md §4.E point 5).
//!
//! Keyed by [`MarketPair::pair_fingerprint`], not by run id or wall-clock,
//! so a re-run against the same content never re-pays for an LLM call
//! (testable property 7, scenario S5).

use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::domain::LLMEvaluation;

struct Entry {
    evaluation: LLMEvaluation,
    expires_at: Instant,
}

/// Shared across every concurrent LLM call in a run (and, if the caller
/// keeps it around, across runs).
pub struct EvaluationCache {
    entries: DashMap<String, Entry>,
    ttl: Duration,
}

impl EvaluationCache {
    #[must_use]
    pub fn new(ttl_hours: i64) -> Self {
        Self {
            entries: DashMap::new(),
            ttl: Duration::from_secs((ttl_hours.max(0) as u64) * 3600),
        }
    }

    #[must_use]
    pub fn get(&self, fingerprint: &str) -> Option<LLMEvaluation> {
        let entry = self.entries.get(fingerprint)?;
        if entry.expires_at <= Instant::now() {
            drop(entry);
            self.entries.remove(fingerprint);
            return None;
        }
        Some(entry.evaluation.clone())
    }

    pub fn set(&self, fingerprint: String, evaluation: LLMEvaluation) {
        self.entries.insert(
            fingerprint,
            Entry {
                evaluation,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    /// Drop every entry whose TTL has lapsed; returns how many were removed.
    pub fn delete_expired(&self) -> usize {
        let now = Instant::now();
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|e| e.expires_at <= now)
            .map(|e| e.key().clone())
            .collect();
        for key in &expired {
            self.entries.remove(key);
        }
        expired.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RecommendedAction;
    use chrono::Utc;

    fn sample_eval() -> LLMEvaluation {
        LLMEvaluation {
            confidence: 0.9,
            semantic_similarity: 0.8,
            arbitrage_viability: 0.7,
            reasoning: "looks good".to_string(),
            recommended_action: RecommendedAction::Proceed,
            provider: "anthropic",
            model_version: "test".to_string(),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn cached_entry_replays_without_recomputation() {
        let cache = EvaluationCache::new(24);
        cache.set("fp1".to_string(), sample_eval());
        let hit = cache.get("fp1").expect("should hit");
        assert_eq!(hit.confidence, 0.9);
    }

    #[test]
    fn miss_returns_none() {
        let cache = EvaluationCache::new(24);
        assert!(cache.get("unknown").is_none());
    }

    #[test]
    fn zero_ttl_expires_immediately() {
        let cache = EvaluationCache::new(0);
        cache.set("fp1".to_string(), sample_eval());
        assert!(cache.get("fp1").is_none());
    }
}
