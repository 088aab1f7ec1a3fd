//! Pipeline Orchestrator — component G (SPEC_FULL.md §4.G).
//!
//! Wires normalize → bucket → filter → ml → llm → score into one run and
//! assembles a [`PipelineExecution`]. Extraction, normalization, and
//! bucketing run once over the whole pull; filtering then runs per bucket
//! (§4.C "Ordering guarantees" — enumeration order is per-bucket) before the
//! survivors are pooled back into single ML/LLM/scoring passes.

use std::collections::HashMap;
use std::time::Instant;

use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::PipelineConfig;
use crate::domain::{
    MarketHandle, MarketPair, NormalizedMarket, PipelineExecution, RunStatus, StageMetrics, Venue,
};
use crate::error::{Error, Result};
use crate::llm::{EvaluationCache, LlmProvider, RateLimiter};
use crate::ml::WorthinessScorer;
use crate::port::{Clock, Extractor, Store};
use crate::{bucket, filter, ml, normalize, score};

/// Every collaborator and config the orchestrator drives (SPEC_FULL.md §6).
/// Borrowed rather than owned: callers (the CLI, tests) control lifetime and
/// can share one `EvaluationCache`/`RateLimiter` across repeated runs.
pub struct PipelineOrchestrator<'a> {
    pub extractor: &'a dyn Extractor,
    pub store: &'a dyn Store,
    pub clock: &'a dyn Clock,
    pub scorer: &'a dyn WorthinessScorer,
    pub llm_provider: &'a dyn LlmProvider,
    pub llm_cache: &'a EvaluationCache,
    pub rate_limiter: &'a RateLimiter,
    pub config: &'a PipelineConfig,
}

fn merge_metrics(into: &mut StageMetrics, from: &StageMetrics) {
    into.input_count += from.input_count;
    into.output_count += from.output_count;
    into.duration += from.duration;
    into.partial = into.partial || from.partial;
    into.failed = into.failed || from.failed;
    for (reason, count) in &from.rejection_reasons {
        *into.rejection_reasons.entry(*reason).or_insert(0) += count;
    }
}

impl<'a> PipelineOrchestrator<'a> {
    /// Run the full funnel once, end to end, and persist its outputs.
    ///
    /// `fail_on_stage_error` (§6 "Orchestration") governs what a stage
    /// failure does: `false` (the default) lets the run continue with
    /// whatever the stage did produce, recording the failure on its
    /// `StageMetrics`; `true` aborts the run at that stage with
    /// [`RunStatus::Failed`].
    pub async fn run(&self, cancel: &CancellationToken) -> Result<PipelineExecution> {
        let started_at = self.clock.now();
        let run_start = Instant::now();
        let execution_id = Uuid::new_v4();
        info!(%execution_id, "pipeline run starting");

        let deadline = std::time::Duration::from_secs(self.config.orchestration.stage_soft_deadline_secs);
        let max_markets = Some(self.config.orchestration.max_markets_per_venue);

        let mut execution = PipelineExecution::pending(execution_id, started_at);

        // --- Extraction (A's input) ---
        let (raw_a, raw_b, extraction_metrics) =
            self.extract(deadline, max_markets).await;
        execution.stage_metrics.push(extraction_metrics.clone());
        if extraction_metrics.failed && self.config.orchestration.fail_on_stage_error {
            return Ok(self.finish_failed(execution, run_start));
        }

        let mut raws = raw_a;
        raws.extend(raw_b);

        // --- A: normalize ---
        let (mut markets, normalize_metrics) =
            normalize::normalize_batch(&raws, started_at, &self.config.normalization);
        execution.stage_metrics.push(normalize_metrics.clone());
        if normalize_metrics.failed && self.config.orchestration.fail_on_stage_error {
            return Ok(self.finish_failed(execution, run_start));
        }

        // --- B: bucket ---
        let (bucket_pairs, bucket_metrics) = bucket::run(&mut markets, &self.config.buckets);
        execution.stage_metrics.push(bucket_metrics.clone());
        if bucket_metrics.failed && self.config.orchestration.fail_on_stage_error {
            return Ok(self.finish_failed(execution, run_start));
        }

        let registry: HashMap<MarketHandle, NormalizedMarket> =
            markets.iter().map(|m| (m.handle.clone(), m.clone())).collect();
        let market_a = |pair: &MarketPair| registry.get(&pair.handle_a).expect("handle_a always in registry");
        let market_b = |pair: &MarketPair| registry.get(&pair.handle_b).expect("handle_b always in registry");

        // --- C: filter, one bucket at a time, enumeration order preserved within each ---
        let mut filter_stage_metrics: [StageMetrics; 5] = [
            StageMetrics::new("filter_stage1_basic_compatibility"),
            StageMetrics::new("filter_stage2_text_similarity"),
            StageMetrics::new("filter_stage3_liquidity"),
            StageMetrics::new("filter_stage4_time_alignment"),
            StageMetrics::new("filter_stage5_arbitrage_potential"),
        ];
        let mut all_pairs: Vec<MarketPair> = Vec::new();
        let mut bucket_success_rate: HashMap<String, f64> = HashMap::new();

        for bp in &bucket_pairs {
            let venue_a_markets: Vec<&NormalizedMarket> = markets
                .iter()
                .filter(|m| m.venue() == Venue::VenueA && m.semantic_bucket.as_deref() == Some(bp.bucket_name.as_str()))
                .collect();
            let venue_b_markets: Vec<&NormalizedMarket> = markets
                .iter()
                .filter(|m| m.venue() == Venue::VenueB && m.semantic_bucket.as_deref() == Some(bp.bucket_name.as_str()))
                .collect();

            let (survivors, stage_metrics) =
                filter::run_bucket(&bp.bucket_name, &venue_a_markets, &venue_b_markets, &self.config.funnel);
            for (acc, stage) in filter_stage_metrics.iter_mut().zip(stage_metrics.iter()) {
                merge_metrics(acc, stage);
            }
            let considered = (venue_a_markets.len() * venue_b_markets.len()).max(1) as f64;
            bucket_success_rate.insert(bp.bucket_name.clone(), survivors.len() as f64 / considered);
            all_pairs.extend(survivors);
        }
        for stage in &filter_stage_metrics {
            execution.stage_metrics.push(stage.clone());
        }
        let filter_failed = filter_stage_metrics.iter().any(|m| m.failed);
        if filter_failed && self.config.orchestration.fail_on_stage_error {
            return Ok(self.finish_failed(execution, run_start));
        }

        // --- D: ML worthiness ---
        let bucket_success_rate_fn = |bucket: &str| *bucket_success_rate.get(bucket).unwrap_or(&0.5);
        let (ml_advanced, ml_metrics) = ml::run(
            self.scorer,
            &all_pairs,
            market_a,
            market_b,
            bucket_success_rate_fn,
            started_at,
            self.config.funnel.ml_threshold,
        )
        .await;
        execution.stage_metrics.push(ml_metrics.clone());
        if ml_metrics.failed && self.config.orchestration.fail_on_stage_error {
            return Ok(self.finish_failed(execution, run_start));
        }

        // --- E: LLM adjudication ---
        let llm_input: Vec<(MarketPair, &NormalizedMarket, &NormalizedMarket, f64)> = ml_advanced
            .into_iter()
            .map(|(pair, prediction)| {
                let a = market_a(&pair);
                let b = market_b(&pair);
                (pair, a, b, prediction.llm_worthiness)
            })
            .collect();
        let (adjudicated, llm_metrics) = crate::llm::run(
            self.llm_provider,
            self.llm_cache,
            self.rate_limiter,
            &self.config.llm,
            self.config.concurrency.llm_concurrency,
            llm_input,
            cancel,
        )
        .await;
        execution.stage_metrics.push(llm_metrics.clone());
        if llm_metrics.failed && self.config.orchestration.fail_on_stage_error {
            return Ok(self.finish_failed(execution, run_start));
        }

        // --- F: arbitrage scoring ---
        let (opportunities, score_metrics) = score::run(
            &adjudicated,
            market_a,
            market_b,
            started_at,
            &self.config.funnel,
            &self.config.scoring,
        );
        execution.stage_metrics.push(score_metrics.clone());

        execution.ranked_opportunities = opportunities;
        execution.status = if cancel.is_cancelled() { RunStatus::Cancelled } else { RunStatus::Completed };
        execution.finished_at = Some(self.clock.now());
        execution.wall_time = Some(run_start.elapsed());

        if let Err(err) = self.store.put_markets(&markets).await {
            warn!(error = %err, "failed to persist normalized markets");
        }
        if let Err(err) = self.store.put_opportunities(&execution.ranked_opportunities).await {
            warn!(error = %err, "failed to persist opportunities");
        }
        if let Err(err) = self.store.put_execution(&execution).await {
            warn!(error = %err, "failed to persist execution record");
        }

        info!(
            %execution_id,
            markets = markets.len(),
            opportunities = execution.ranked_opportunities.len(),
            status = ?execution.status,
            "pipeline run complete"
        );

        Ok(execution)
    }

    async fn extract(
        &self,
        deadline: std::time::Duration,
        max_markets: Option<usize>,
    ) -> (Vec<crate::domain::RawMarket>, Vec<crate::domain::RawMarket>, StageMetrics) {
        let mut metrics = StageMetrics::new("extraction");

        let fetch_a = timeout(deadline, self.extractor.fetch_markets(Venue::VenueA, max_markets));
        let fetch_b = timeout(deadline, self.extractor.fetch_markets(Venue::VenueB, max_markets));
        let (result_a, result_b) = tokio::join!(fetch_a, fetch_b);

        let raw_a = match result_a {
            Ok(Ok(markets)) => markets,
            Ok(Err(err)) => {
                warn!(error = %err, venue = %Venue::VenueA, "extraction failed");
                metrics.failed = true;
                Vec::new()
            }
            Err(_elapsed) => {
                warn!(venue = %Venue::VenueA, "extraction timed out");
                metrics.partial = true;
                Vec::new()
            }
        };
        let raw_b = match result_b {
            Ok(Ok(markets)) => markets,
            Ok(Err(err)) => {
                warn!(error = %err, venue = %Venue::VenueB, "extraction failed");
                metrics.failed = true;
                Vec::new()
            }
            Err(_elapsed) => {
                warn!(venue = %Venue::VenueB, "extraction timed out");
                metrics.partial = true;
                Vec::new()
            }
        };

        metrics.output_count = raw_a.len() + raw_b.len();
        (raw_a, raw_b, metrics)
    }

    fn finish_failed(&self, mut execution: PipelineExecution, run_start: Instant) -> PipelineExecution {
        execution.status = RunStatus::Failed;
        execution.finished_at = Some(self.clock.now());
        execution.wall_time = Some(run_start.elapsed());
        execution
    }
}

/// Surface a stage failure as a crate [`Error`] when the caller needs a
/// `Result`-shaped outcome rather than a `Failed` [`PipelineExecution`]
/// (§7 "Error handling design").
pub fn require_completed(execution: PipelineExecution) -> Result<PipelineExecution> {
    if execution.status == RunStatus::Failed {
        return Err(Error::Stage { stage: "pipeline", reason: "one or more stages failed".to_string() });
    }
    Ok(execution)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use crate::domain::RawMarket;
    use crate::llm::EvaluationCache;
    use crate::ml::HeuristicScorer;
    use crate::port::{FixedClock, FixtureExtractor, InMemoryStore};
    use async_trait::async_trait;
    use chrono::{Duration, Utc};
    use serde_json::json;

    struct StubProvider;

    #[async_trait]
    impl LlmProvider for StubProvider {
        fn name(&self) -> &'static str {
            "stub"
        }
        async fn complete(&self, _prompt: &str) -> Result<String> {
            Ok(r#"{"confidence": 0.9, "semantic_similarity": 0.9, "arbitrage_viability": 0.9, "reasoning": "matches", "recommended_action": "PROCEED"}"#.to_string())
        }
    }

    fn raw(venue: Venue, id: &str, title: &str, price: f64, volume: f64, close: chrono::DateTime<Utc>) -> RawMarket {
        RawMarket {
            venue,
            external_id: id.to_string(),
            raw_payload: json!({
                "title": title,
                "yes_price": price,
                "volume": volume,
                "close_time": close.to_rfc3339(),
                "category": "politics",
            }),
            fetched_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn end_to_end_run_produces_sorted_opportunities() {
        let close = Utc::now() + Duration::days(30);
        let fixtures = vec![
            raw(Venue::VenueA, "a1", "Will Candidate X win the 2024 election?", 0.30, 5000.0, close),
            raw(Venue::VenueB, "b1", "2024 presidential election winner: Candidate X", 0.65, 4800.0, close),
        ];
        let extractor = FixtureExtractor::new(fixtures);
        let store = InMemoryStore::new();
        let clock = FixedClock::new(Utc::now());
        let scorer = HeuristicScorer;
        let provider = StubProvider;
        let cache = EvaluationCache::new(24);
        let rate_limiter = RateLimiter::new(600);
        let config = PipelineConfig::default();

        let orchestrator = PipelineOrchestrator {
            extractor: &extractor,
            store: &store,
            clock: &clock,
            scorer: &scorer,
            llm_provider: &provider,
            llm_cache: &cache,
            rate_limiter: &rate_limiter,
            config: &config,
        };

        let cancel = CancellationToken::new();
        let execution = orchestrator.run(&cancel).await.expect("run should succeed");

        assert_eq!(execution.status, RunStatus::Completed);
        assert!(execution.is_priority_sorted());
        assert_eq!(execution.ranked_opportunities.len(), 1);
        assert_eq!(store.get_markets().await.unwrap().len(), 2);
        assert_eq!(store.get_executions().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn disjoint_topics_yield_no_opportunities() {
        let close = Utc::now() + Duration::days(30);
        let fixtures = vec![
            raw(Venue::VenueA, "a1", "Bitcoin above $100k by year end", 0.40, 5000.0, close),
            raw(Venue::VenueB, "b1", "Super Bowl LIX winner: Chiefs", 0.60, 4000.0, close),
        ];
        let extractor = FixtureExtractor::new(fixtures);
        let store = InMemoryStore::new();
        let clock = FixedClock::new(Utc::now());
        let scorer = HeuristicScorer;
        let provider = StubProvider;
        let cache = EvaluationCache::new(24);
        let rate_limiter = RateLimiter::new(600);
        let config = PipelineConfig::default();

        let orchestrator = PipelineOrchestrator {
            extractor: &extractor,
            store: &store,
            clock: &clock,
            scorer: &scorer,
            llm_provider: &provider,
            llm_cache: &cache,
            rate_limiter: &rate_limiter,
            config: &config,
        };

        let cancel = CancellationToken::new();
        let execution = orchestrator.run(&cancel).await.expect("run should succeed");
        assert!(execution.ranked_opportunities.is_empty());
    }
}
