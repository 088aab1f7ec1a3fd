//! Handler for the `check` subcommand: validate config, bucket table, and
//! provider reachability without spending LLM budget.

use crate::cli::{output, CheckArgs};
use crate::config::PipelineConfig;
use crate::error::Result;

/// Execute the `check` subcommand.
pub fn execute(config_path: &std::path::Path, args: &CheckArgs) -> Result<()> {
    output::section("Configuration Check");
    output::field("config", config_path.display());

    let config = match PipelineConfig::load(config_path) {
        Ok(config) => {
            output::success("configuration file is valid");
            config
        }
        Err(err) => {
            output::error(&err.to_string());
            return Err(err);
        }
    };

    output::section("Summary");
    output::field("buckets", config.buckets.definitions.len());
    output::field("funnel.min_profit_pct", config.funnel.min_profit_pct);
    output::field("funnel.max_risk_level", format!("{:?}", config.funnel.max_risk_level));
    output::field("llm.provider", format!("{:?}", config.llm.provider));
    output::field("llm.model", &config.llm.model);
    output::field(
        "orchestration.fail_on_stage_error",
        config.orchestration.fail_on_stage_error,
    );

    if config.buckets.definitions.is_empty() {
        output::warning("bucket table is empty, every pair will fall into the miscellaneous bucket");
    } else {
        output::success("bucket table is non-empty");
    }

    if !args.skip_llm {
        match config.llm_api_key() {
            Ok(_) => output::success("LLM provider API key present in environment"),
            Err(err) => output::warning(&format!("LLM provider API key missing: {err}")),
        }
    }

    output::success("configuration check complete");
    Ok(())
}
