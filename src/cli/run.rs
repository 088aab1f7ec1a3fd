//! Handler for the `run` subcommand.

use serde::Deserialize;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::cli::{output, RunArgs};
use crate::config::PipelineConfig;
use crate::domain::{RawMarket, Venue};
use crate::error::Result;
use crate::llm::{self, EvaluationCache, RateLimiter};
use crate::ml::HeuristicScorer;
use crate::orchestrator::PipelineOrchestrator;
use crate::port::{Extractor, FixtureExtractor, InMemoryStore, SystemClock};

/// One entry in a `--fixtures` JSON file: the record shape an `Extractor`
/// must produce, independent of how it was actually fetched.
#[derive(Debug, Deserialize)]
struct FixtureRecord {
    venue: Venue,
    external_id: String,
    payload: serde_json::Value,
}

fn load_fixtures(path: &std::path::Path) -> Result<Vec<RawMarket>> {
    let text = std::fs::read_to_string(path)?;
    let records: Vec<FixtureRecord> = serde_json::from_str(&text)?;
    let now = chrono::Utc::now();
    Ok(records
        .into_iter()
        .map(|r| RawMarket {
            venue: r.venue,
            external_id: r.external_id,
            raw_payload: r.payload,
            fetched_at: now,
        })
        .collect())
}

/// Execute the `run` subcommand: load config and fixtures, drive one pass of
/// the funnel end to end, and print the ranked opportunities.
pub async fn execute(config_path: &std::path::Path, args: &RunArgs, log_level: Option<&str>) -> Result<()> {
    let mut config = PipelineConfig::load(config_path)?;

    if args.json_logs {
        config.logging.format = crate::config::LogFormat::Json;
    }
    if let Some(level) = log_level {
        config.logging.level = level.to_string();
    }
    if let Some(min_profit_pct) = args.min_profit_pct {
        config.funnel.min_profit_pct = min_profit_pct;
    }
    if args.fail_on_stage_error {
        config.orchestration.fail_on_stage_error = true;
    }

    config.init_logging();

    let markets = load_fixtures(&args.fixtures)?;
    info!(fixtures = markets.len(), path = %args.fixtures.display(), "loaded fixture markets");

    let extractor = FixtureExtractor::new(markets);
    let store = InMemoryStore::new();
    let clock = SystemClock;
    let scorer = HeuristicScorer;
    let llm_provider = llm::from_config(&config)?;
    let llm_cache = EvaluationCache::new(config.llm.cache_ttl_hours);
    let rate_limiter = RateLimiter::new(config.concurrency.llm_rate_per_min);
    let cancel = CancellationToken::new();

    let orchestrator = PipelineOrchestrator {
        extractor: &extractor as &dyn Extractor,
        store: &store,
        clock: &clock,
        scorer: &scorer,
        llm_provider: llm_provider.as_ref(),
        llm_cache: &llm_cache,
        rate_limiter: &rate_limiter,
        config: &config,
    };

    let cancel_for_run = cancel.clone();
    let run_future = orchestrator.run(&cancel_for_run);
    tokio::pin!(run_future);

    let execution = tokio::select! {
        result = &mut run_future => result?,
        _ = signal::ctrl_c() => {
            info!("shutdown signal received, cancelling run");
            cancel.cancel();
            run_future.await?
        }
    };

    output::section("Run Summary");
    output::field("status", format!("{:?}", execution.status));
    output::field("opportunities", execution.ranked_opportunities.len());
    for metrics in &execution.stage_metrics {
        output::field(
            &metrics.stage_name,
            format!("{} -> {}", metrics.input_count, metrics.output_count),
        );
    }

    if execution.ranked_opportunities.is_empty() {
        output::warning("no arbitrage opportunities found this run");
    } else if args.json_output {
        println!("{}", serde_json::to_string_pretty(&JsonOpportunities(&execution.ranked_opportunities))?);
    } else {
        output::section("Ranked Opportunities");
        println!("{}", output::opportunity_table(&execution.ranked_opportunities));
    }

    if execution.status == crate::domain::RunStatus::Failed {
        error!("pipeline run ended in a failed status");
        std::process::exit(1);
    }

    Ok(())
}

/// Minimal JSON projection of the ranked opportunities, since
/// `ArbitrageOpportunity` itself carries no `Serialize` (it is never stored
/// as wire data, only as an in-process/persisted record).
struct JsonOpportunities<'a>(&'a [crate::domain::ArbitrageOpportunity]);

impl serde::Serialize for JsonOpportunities<'_> {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeSeq;
        let mut seq = serializer.serialize_seq(Some(self.0.len()))?;
        for opp in self.0 {
            seq.serialize_element(&serde_json::json!({
                "opportunity_id": opp.opportunity_id.as_str(),
                "arbitrage_type": format!("{:?}", opp.arbitrage_type),
                "priority_score": opp.priority_score,
                "expected_profit_usd": opp.metrics.expected_profit_usd.to_string(),
                "expected_profit_percentage": opp.metrics.expected_profit_percentage,
                "risk_level": format!("{:?}", opp.risk.risk_level),
                "expires_at": opp.expires_at.to_rfc3339(),
            }))?;
        }
        seq.end()
    }
}
