//! Risk fusion result types.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Un-weighted component values, each in [0, 1].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskBreakdown {
    /// Centrality blend, floored for hubs.
    pub graph_risk: f64,
    /// Anomaly scorer output.
    pub anomaly_score: f64,
    /// Severity of the most severe pattern the account is in.
    pub pattern_risk: f64,
    /// Recent outgoing activity relative to saturation.
    pub velocity_risk: f64,
}

impl RiskBreakdown {
    /// Copy with every component rounded to `decimals` places.
    #[must_use]
    pub fn rounded(&self, decimals: u32) -> Self {
        Self {
            graph_risk: round_to(self.graph_risk, decimals),
            anomaly_score: round_to(self.anomaly_score, decimals),
            pattern_risk: round_to(self.pattern_risk, decimals),
            velocity_risk: round_to(self.velocity_risk, decimals),
        }
    }
}

/// Fused risk for one account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskResult {
    /// Final score in [0, 100], two decimals.
    pub score: f64,
    /// Data sufficiency in [0, 1].
    pub confidence: f64,
    /// Component values.
    pub breakdown: RiskBreakdown,
}

/// An account with its fused risk, as produced by ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedAccount {
    /// Account id.
    pub account_id: String,
    /// Fused risk.
    pub risk: RiskResult,
}

impl RankedAccount {
    /// Score descending, then account id ascending.
    pub fn rank_order(a: &Self, b: &Self) -> Ordering {
        b.risk
            .score
            .total_cmp(&a.risk.score)
            .then_with(|| a.account_id.cmp(&b.account_id))
    }
}

/// Round half away from zero to `decimals` places.
#[must_use]
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}
