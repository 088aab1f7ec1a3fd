//! `ArbitrageOpportunity` and its constituent types (SPEC_FULL.md §3 / §4.F).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{MarketHandle, OpportunityId};
use super::money::Price;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArbitrageType {
    Simple,
    Temporal,
    Liquidity,
    CrossPlatform,
}

/// Which side to buy and which to sell, at which prices.
#[derive(Debug, Clone)]
pub struct Strategy {
    pub buy_handle: MarketHandle,
    pub buy_price: Price,
    pub sell_handle: MarketHandle,
    pub sell_price: Price,
    /// Execution is specified as simultaneous with a hedge requirement —
    /// this flag documents that contract to callers rather than leaving it
    /// implicit.
    pub simultaneous_hedge_required: bool,
}

#[derive(Debug, Clone)]
pub struct TransactionCostAnalysis {
    pub venue_a_fee: Decimal,
    pub venue_b_fee: Decimal,
    pub gas_estimate: Decimal,
    pub slippage: Decimal,
    pub total_cost: Decimal,
    pub cost_percentage: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    VeryLow,
    Low,
    Medium,
    High,
    VeryHigh,
}

impl RiskLevel {
    /// Band an overall risk score in `[0,1]` into a level per §4.F's
    /// thresholds: `<0.15, <0.30, <0.50, <0.70, >=0.70`.
    #[must_use]
    pub fn from_score(overall_risk: f64) -> Self {
        if overall_risk < 0.15 {
            Self::VeryLow
        } else if overall_risk < 0.30 {
            Self::Low
        } else if overall_risk < 0.50 {
            Self::Medium
        } else if overall_risk < 0.70 {
            Self::High
        } else {
            Self::VeryHigh
        }
    }
}

#[derive(Debug, Clone)]
pub struct RiskAssessment {
    pub liquidity_risk: f64,
    pub timing_risk: f64,
    pub execution_risk: f64,
    pub semantic_risk: f64,
    pub platform_risk: f64,
    pub overall_risk: f64,
    pub risk_level: RiskLevel,
}

#[derive(Debug, Clone)]
pub struct Metrics {
    pub expected_profit_usd: Decimal,
    pub expected_profit_percentage: f64,
    pub annualized_roi: f64,
    pub success_probability: f64,
    pub execution_time_estimate_secs: u64,
}

#[derive(Debug, Clone)]
pub struct ArbitrageOpportunity {
    pub opportunity_id: OpportunityId,
    pub handle_a: MarketHandle,
    pub handle_b: MarketHandle,
    pub arbitrage_type: ArbitrageType,
    pub strategy: Strategy,
    pub position_size: Decimal,
    pub cost_analysis: TransactionCostAnalysis,
    pub risk: RiskAssessment,
    pub metrics: Metrics,
    pub priority_score: f64,
    pub detected_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl ArbitrageOpportunity {
    /// Testable property 3: buy price strictly below sell price, both
    /// within the valid price interval (guaranteed by the `Price` newtype).
    #[must_use]
    pub fn has_sane_prices(&self) -> bool {
        self.strategy.buy_price.get() < self.strategy.sell_price.get()
    }

    /// Testable property 4.
    #[must_use]
    pub fn has_sane_profit(&self, min_profit_pct: f64) -> bool {
        self.metrics.expected_profit_usd > Decimal::ZERO
            && self.metrics.expected_profit_percentage >= min_profit_pct
    }
}
