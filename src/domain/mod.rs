//! Pure domain types flowing between pipeline stages (SPEC_FULL.md §3).

pub mod evaluation;
pub mod execution;
pub mod features;
pub mod id;
pub mod market;
pub mod money;
pub mod opportunity;
pub mod pair;
pub mod prediction;

pub use evaluation::{LLMEvaluation, LlmResponseSchema, RecommendedAction};
pub use execution::{PipelineExecution, RejectionReason, RunStatus, StageMetrics};
pub use features::{MLFeatures, FEATURE_COUNT};
pub use id::{ExternalId, MarketHandle, OpportunityId, Venue};
pub use market::{Category, MarketStatus, NormalizedMarket, Outcome};
pub use money::{Amount, Price};
pub use opportunity::{
    ArbitrageOpportunity, ArbitrageType, Metrics, RiskAssessment, RiskLevel, Strategy,
    TransactionCostAnalysis,
};
pub use pair::MarketPair;
pub use prediction::MLPrediction;

/// A raw, venue-opaque market record as produced by an `Extractor`
/// collaborator (SPEC_FULL.md §3, §6). The one place a dynamic payload is
/// acceptable in the inbound direction; `normalize::normalize` is the trust
/// boundary that turns it into a `NormalizedMarket`.
#[derive(Debug, Clone)]
pub struct RawMarket {
    pub venue: Venue,
    pub external_id: String,
    pub raw_payload: serde_json::Value,
    pub fetched_at: chrono::DateTime<chrono::Utc>,
}
