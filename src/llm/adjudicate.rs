//! LLM Adjudicator orchestration (SPEC_FULL.md §4.E) — cache lookups,
//! rate-limited/bounded-concurrency calls with retry, a per-batch spend
//! cap, and the structured-JSON trust boundary.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

use crate::config::LlmConfig;
use crate::domain::{LLMEvaluation, LlmResponseSchema, MarketPair, NormalizedMarket, StageMetrics};

use super::cache::EvaluationCache;
use super::provider::LlmProvider;
use super::rate_limit::RateLimiter;

const INITIAL_BACKOFF: Duration = Duration::from_millis(500);
const MAX_BACKOFF: Duration = Duration::from_secs(8);
const BACKOFF_MULTIPLIER: f64 = 2.0;

/// Render the structured-output prompt for one candidate pair (§4.E
/// "Prompt shape").
fn build_prompt(pair: &MarketPair, a: &NormalizedMarket, b: &NormalizedMarket, ml_worthiness: f64) -> String {
    format!(
        "You are adjudicating whether two prediction-market listings refer to the same \
         underlying event, for cross-venue arbitrage detection.\n\n\
         Bucket: {bucket}\n\
         Price spread: {spread}\n\
         ML worthiness score: {ml_worthiness:.3}\n\n\
         Market A: \"{title_a}\" (category {category_a:?}, price {price_a}, volume {volume_a}, closes {close_a})\n\
         Market B: \"{title_b}\" (category {category_b:?}, price {price_b}, volume {volume_b}, closes {close_b})\n\n\
         Respond with a single JSON object matching exactly this schema, no prose:\n\
         {{\"confidence\": <0-1>, \"semantic_similarity\": <0-1>, \"arbitrage_viability\": <0-1>, \
         \"reasoning\": <string>, \"recommended_action\": \"PROCEED\"|\"INVESTIGATE\"|\"REJECT\"}}",
        bucket = pair.bucket,
        spread = pair.price_spread.unwrap_or(0.0),
        title_a = a.title,
        category_a = a.category,
        price_a = a.yes_price().get(),
        volume_a = a.volume.get(),
        close_a = a.close_time,
        title_b = b.title,
        category_b = b.category,
        price_b = b.yes_price().get(),
        volume_b = b.volume.get(),
        close_b = b.close_time,
    )
}

async fn call_with_retry(
    provider: &dyn LlmProvider,
    prompt: &str,
    config: &LlmConfig,
) -> crate::error::Result<String> {
    let mut delay = INITIAL_BACKOFF;
    let mut attempt = 0;
    loop {
        attempt += 1;
        let call = timeout(
            Duration::from_millis(config.request_timeout_ms),
            provider.complete(prompt),
        )
        .await;
        match call {
            Ok(Ok(text)) => return Ok(text),
            Ok(Err(err)) if attempt >= config.retry_attempts => return Err(err),
            Err(_elapsed) if attempt >= config.retry_attempts => {
                return Err(crate::error::Error::Stage {
                    stage: "llm_adjudication",
                    reason: "request timed out after all retries".to_string(),
                });
            }
            _ => {
                warn!(attempt, provider = provider.name(), "LLM call failed, retrying");
                sleep(delay).await;
                delay = delay.mul_f64(BACKOFF_MULTIPLIER).min(MAX_BACKOFF);
            }
        }
    }
}

/// One evaluated pair, paired with its recommendation for downstream
/// scoring gating.
pub struct Adjudicated {
    pub pair: MarketPair,
    pub evaluation: LLMEvaluation,
}

/// Run stage E: cache-first, bounded-concurrency, rate-limited, spend-capped
/// evaluation of every pair the ML stage advanced.
#[allow(clippy::too_many_arguments)]
pub async fn run(
    provider: &dyn LlmProvider,
    cache: &EvaluationCache,
    rate_limiter: &RateLimiter,
    config: &LlmConfig,
    concurrency: usize,
    pairs: Vec<(MarketPair, &NormalizedMarket, &NormalizedMarket, f64)>,
    cancel: &tokio_util::sync::CancellationToken,
) -> (Vec<Adjudicated>, StageMetrics) {
    let start = Instant::now();
    let mut metrics = StageMetrics::new("llm_adjudication");
    metrics.input_count = pairs.len();

    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let spend_budget_calls =
        (config.max_cost_per_batch_usd / config.estimated_cost_per_call_usd.max(1e-9)).floor() as u32;
    let calls_made = AtomicU32::new(0);

    let mut results = Vec::with_capacity(pairs.len());
    let mut truncated = 0usize;

    // Sequential outer loop over a bounded semaphore keeps call ordering
    // simple to reason about while still allowing overlap; each body await
    // only holds its own permit.
    for (pair, a, b, ml_worthiness) in pairs {
        if cancel.is_cancelled() {
            break;
        }

        let fingerprint = pair.pair_fingerprint(a, b);
        if let Some(cached) = cache.get(&fingerprint) {
            debug!(fingerprint = %fingerprint, "LLM cache hit");
            results.push(Adjudicated { pair, evaluation: cached });
            continue;
        }

        if calls_made.load(Ordering::Relaxed) >= spend_budget_calls {
            truncated += 1;
            continue;
        }

        let _permit = semaphore.acquire().await.expect("semaphore never closed");
        rate_limiter.acquire().await;
        calls_made.fetch_add(1, Ordering::Relaxed);

        let prompt = build_prompt(&pair, a, b, ml_worthiness);
        let now = chrono::Utc::now();
        let evaluation = match call_with_retry(provider, &prompt, config).await {
            Ok(raw) => match serde_json::from_str::<LlmResponseSchema>(&raw) {
                Ok(schema) => LLMEvaluation::from_schema(schema, provider.name(), config.model.clone(), now),
                Err(_) => LLMEvaluation::fallback_malformed(&raw, provider.name(), now),
            },
            Err(err) => LLMEvaluation::fallback_failed(&err.to_string(), provider.name(), now),
        };

        cache.set(fingerprint, evaluation.clone());
        results.push(Adjudicated { pair, evaluation });
    }

    if truncated > 0 {
        warn!(truncated, "LLM batch spend cap reached; remaining pairs skipped this run");
    }

    metrics.output_count = results.len();
    metrics.duration = start.elapsed();
    (results, metrics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LlmConfig;
    use crate::domain::RecommendedAction;
    use crate::testkit::market;
    use crate::domain::Venue;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;

    struct StubProvider {
        calls: AtomicUsize,
        response: String,
    }

    #[async_trait]
    impl LlmProvider for StubProvider {
        fn name(&self) -> &'static str {
            "stub"
        }
        async fn complete(&self, _prompt: &str) -> crate::error::Result<String> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            Ok(self.response.clone())
        }
    }

    fn config() -> LlmConfig {
        LlmConfig::default()
    }

    #[tokio::test]
    async fn cache_hit_never_calls_provider() {
        let a = market(Venue::VenueA, "a1", "same title");
        let b = market(Venue::VenueB, "b1", "same title");
        let pair = MarketPair::new("bucket", a.handle.clone(), b.handle.clone());
        let fingerprint = pair.pair_fingerprint(&a, &b);

        let cache = EvaluationCache::new(24);
        cache.set(
            fingerprint,
            LLMEvaluation {
                confidence: 0.9,
                semantic_similarity: 0.9,
                arbitrage_viability: 0.9,
                reasoning: "cached".to_string(),
                recommended_action: RecommendedAction::Proceed,
                provider: "anthropic",
                model_version: "test".to_string(),
                timestamp: chrono::Utc::now(),
            },
        );

        let provider = StubProvider { calls: AtomicUsize::new(0), response: "{}".to_string() };
        let rate_limiter = RateLimiter::new(60);
        let cancel = tokio_util::sync::CancellationToken::new();

        let (results, _) = run(
            &provider,
            &cache,
            &rate_limiter,
            &config(),
            4,
            vec![(pair, &a, &b, 0.8)],
            &cancel,
        )
        .await;

        assert_eq!(provider.calls.load(Ordering::Relaxed), 0);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].evaluation.reasoning, "cached");
    }

    #[tokio::test]
    async fn malformed_json_falls_back_without_failing_the_batch() {
        let a = market(Venue::VenueA, "a1", "title one");
        let b = market(Venue::VenueB, "b1", "title two");
        let pair = MarketPair::new("bucket", a.handle.clone(), b.handle.clone());

        let provider = StubProvider { calls: AtomicUsize::new(0), response: "not json".to_string() };
        let cache = EvaluationCache::new(24);
        let rate_limiter = RateLimiter::new(60);
        let cancel = tokio_util::sync::CancellationToken::new();

        let (results, _) = run(
            &provider,
            &cache,
            &rate_limiter,
            &config(),
            4,
            vec![(pair, &a, &b, 0.8)],
            &cancel,
        )
        .await;

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].evaluation.recommended_action, RecommendedAction::Investigate);
    }
}
