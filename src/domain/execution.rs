//! `PipelineExecution` and supporting run-level records (SPEC_FULL.md §3 / §4.G).

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::opportunity::ArbitrageOpportunity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

/// One hard-fail condition a market or pair can be rejected for. Backs the
/// frequency tables every normalizer/filter stage keeps (§4.A, §4.C).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectionReason {
    MissingExternalId,
    UnparsableDate,
    DateOutOfRange,
    PriceOutOfRange,
    InsufficientVolume,
    InsufficientArbitrage,
    WeakTextSimilarity,
    LowLiquidityScore,
    ExtremeVolumeImbalance,
    TimeMisaligned,
    MiscellaneousBucket,
}

impl RejectionReason {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MissingExternalId => "missing_external_id",
            Self::UnparsableDate => "unparsable_date",
            Self::DateOutOfRange => "date_out_of_range",
            Self::PriceOutOfRange => "price_out_of_range",
            Self::InsufficientVolume => "insufficient_volume",
            Self::InsufficientArbitrage => "insufficient_arbitrage",
            Self::WeakTextSimilarity => "weak_text_similarity",
            Self::LowLiquidityScore => "low_liquidity_score",
            Self::ExtremeVolumeImbalance => "extreme_volume_imbalance",
            Self::TimeMisaligned => "time_misaligned",
            Self::MiscellaneousBucket => "miscellaneous_bucket",
        }
    }
}

/// Per-stage outcome metrics: input/output counts, duration, and a
/// rejection-reason histogram where the stage has one (§4.C).
#[derive(Debug, Clone, Default)]
pub struct StageMetrics {
    pub stage_name: String,
    pub input_count: usize,
    pub output_count: usize,
    pub duration: Duration,
    pub rejection_reasons: HashMap<&'static str, usize>,
    /// Set when the stage was cut short by its soft deadline (§5) — a
    /// partial outcome, not a failure.
    pub partial: bool,
    /// Set when the stage failed outright and downstream stages received
    /// empty input (§4.G, §7).
    pub failed: bool,
}

impl StageMetrics {
    #[must_use]
    pub fn new(stage_name: impl Into<String>) -> Self {
        Self {
            stage_name: stage_name.into(),
            ..Default::default()
        }
    }

    pub fn record_rejection(&mut self, reason: RejectionReason) {
        *self.rejection_reasons.entry(reason.as_str()).or_insert(0) += 1;
    }
}

#[derive(Debug, Clone)]
pub struct PipelineExecution {
    pub execution_id: Uuid,
    pub status: RunStatus,
    pub stage_metrics: Vec<StageMetrics>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub wall_time: Option<Duration>,
    pub peak_memory_bytes: Option<u64>,
    pub ranked_opportunities: Vec<ArbitrageOpportunity>,
}

impl PipelineExecution {
    #[must_use]
    pub fn pending(execution_id: Uuid, started_at: DateTime<Utc>) -> Self {
        Self {
            execution_id,
            status: RunStatus::Pending,
            stage_metrics: Vec::new(),
            started_at,
            finished_at: None,
            wall_time: None,
            peak_memory_bytes: None,
            ranked_opportunities: Vec::new(),
        }
    }

    /// Testable property 6: opportunities are sorted by `priority_score`
    /// descending with `opportunity_id` as tiebreaker.
    #[must_use]
    pub fn is_priority_sorted(&self) -> bool {
        self.ranked_opportunities.windows(2).all(|w| {
            let (a, b) = (&w[0], &w[1]);
            a.priority_score > b.priority_score
                || (a.priority_score == b.priority_score
                    && a.opportunity_id.as_str() <= b.opportunity_id.as_str())
        })
    }
}
