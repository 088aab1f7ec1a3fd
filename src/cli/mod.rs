//! Command-line interface definitions.

pub mod check;
pub mod output;
pub mod run;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Cross-venue prediction-market arbitrage funnel.
#[derive(Parser, Debug)]
#[command(name = "edgefinder")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to the pipeline configuration file.
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Override the configured log level (trace, debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Execute one pipeline pass against configured extractors.
    Run(RunArgs),

    /// Validate config, bucket table, and provider reachability without spending LLM budget.
    Check(CheckArgs),
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// JSON file of raw market records to feed both venues (extractor transport is
    /// out of scope; this crate consumes whatever record shape an extractor produces).
    #[arg(long)]
    pub fixtures: PathBuf,

    /// Use JSON log format instead of pretty.
    #[arg(long)]
    pub json_logs: bool,

    /// Override the minimum profit percentage gate.
    #[arg(long)]
    pub min_profit_pct: Option<f64>,

    /// Abort the run on the first stage failure instead of continuing best-effort.
    #[arg(long)]
    pub fail_on_stage_error: bool,

    /// Print the ranked opportunity table as JSON instead of a formatted table.
    #[arg(long)]
    pub json_output: bool,
}

/// Arguments for the `check` subcommand.
#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// Skip the LLM provider API-key presence check.
    #[arg(long)]
    pub skip_llm: bool,
}
