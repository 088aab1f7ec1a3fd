//! A five-stage cascaded funnel for finding cross-venue arbitrage between
//! two prediction-market venues.
//!
//! Raw listings flow through [`normalize`] (component A), [`bucket`]
//! (component B), [`filter`] (component C), [`ml`] (component D), [`llm`]
//! (component E), and [`score`] (component F); [`orchestrator`] (component
//! G) wires the six into one run and assembles a
//! [`domain::PipelineExecution`].

pub mod bucket;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod filter;
pub mod llm;
pub mod ml;
pub mod normalize;
pub mod orchestrator;
pub mod port;
pub mod score;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;

pub use error::{ConfigError, Error, Result};
