//! Crate-wide error taxonomy.
//!
//! Mirrors the error kinds from the error-handling design in SPEC_FULL.md §7:
//! validation errors are per-record and never surface here (they are counted,
//! not raised); everything that *does* cross a stage boundary is one of the
//! variants below. No stage propagates a raw panic past its own boundary.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("stage failure in {stage}: {reason}")]
    Stage { stage: &'static str, reason: String },

    #[error("model artifact error: {0}")]
    ModelArtifact(String),

    #[error("pipeline cancelled")]
    Cancelled,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("no bucket definitions loaded")]
    EmptyBucketTable,
}

pub type Result<T> = std::result::Result<T, Error>;
