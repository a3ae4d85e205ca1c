//! Risk fusion kernel.
//!
//! Combines graph structure, anomaly, pattern severity and velocity into a
//! bounded, explainable per-account score:
//!
//! ```text
//! graph    = min(scale * (0.5 * betweenness + 0.5 * pagerank), 1), at least hub_floor for hubs
//! pattern  = max severity over the account's rings (shell 0.9, cycle 0.7, fan 0.6, other 0.4)
//! velocity = min(outgoing in the last window before the latest timestamp / saturation, 1)
//! score    = round(100 * (w_g * graph + w_a * anomaly + w_p * pattern + w_v * velocity), 2)
//! ```

use crate::messages::{RiskInput, RiskOutput};
use crate::types::{round_to, RankedAccount, RiskBreakdown, RiskResult};
use async_trait::async_trait;
use hashbrown::HashMap;
use ringwatch_core::{
    config::RiskConfig,
    domain::Domain,
    error::Result,
    kernel::KernelMetadata,
    ring::Ring,
    traits::{AnalysisKernel, BatchKernel},
    transaction::{max_timestamp, Transaction},
};
use ringwatch_graph::intelligence::GraphIntelligenceResult;
use ringwatch_graph::types::TransactionGraph;
use ringwatch_ml::types::AnomalyResult;
use std::collections::BTreeMap;
use std::time::Instant;

/// Pattern labels per account, in ring order.
pub fn account_patterns(rings: &[Ring]) -> BTreeMap<String, Vec<String>> {
    let mut patterns: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for ring in rings {
        for member in &ring.member_accounts {
            patterns
                .entry(member.clone())
                .or_default()
                .push(ring.pattern_type.label());
        }
    }
    patterns
}

/// Rank accounts by score descending, ties by account id ascending.
pub fn rank(scores: &BTreeMap<String, RiskResult>) -> Vec<RankedAccount> {
    let mut ranked: Vec<RankedAccount> = scores
        .iter()
        .map(|(account, risk)| RankedAccount {
            account_id: account.clone(),
            risk: *risk,
        })
        .collect();
    ranked.sort_by(RankedAccount::rank_order);
    ranked
}

/// Copy of `rings` where each ring's risk score is the mean score of its
/// members scoring above `threshold`, one decimal; 0.0 when none does.
pub fn annotate_rings(
    rings: &[Ring],
    scores: &BTreeMap<String, RiskResult>,
    threshold: f64,
) -> Vec<Ring> {
    rings
        .iter()
        .map(|ring| {
            let suspicious: Vec<f64> = ring
                .member_accounts
                .iter()
                .filter_map(|m| scores.get(m))
                .map(|r| r.score)
                .filter(|&s| s > threshold)
                .collect();
            let mean = if suspicious.is_empty() {
                0.0
            } else {
                suspicious.iter().sum::<f64>() / suspicious.len() as f64
            };
            ring.clone().with_risk_score(round_to(mean, 1))
        })
        .collect()
}

/// Risk fusion kernel.
#[derive(Debug, Clone)]
pub struct RiskFusion {
    metadata: KernelMetadata,
}

impl Default for RiskFusion {
    fn default() -> Self {
        Self::new()
    }
}

impl RiskFusion {
    /// Create a new risk fusion kernel.
    #[must_use]
    pub fn new() -> Self {
        Self {
            metadata: KernelMetadata::batch("risk/risk-fusion", Domain::RiskAnalytics)
                .with_description("Weighted graph/anomaly/pattern/velocity risk score")
                .with_throughput(500_000)
                .with_latency_us(20.0),
        }
    }

    /// Outgoing transactions per sender strictly after `latest - window`.
    pub fn velocity_counts<'a>(
        transactions: &'a [Transaction],
        config: &RiskConfig,
    ) -> HashMap<&'a str, usize> {
        let mut counts = HashMap::new();
        let Some(latest) = max_timestamp(transactions) else {
            return counts;
        };
        let cutoff = latest - config.velocity_window();
        for tx in transactions.iter().filter(|t| t.timestamp > cutoff) {
            *counts.entry(tx.sender_id.as_str()).or_insert(0) += 1;
        }
        counts
    }

    /// Transactions each account appears in, a self-transfer counted once.
    pub fn involvement_counts(transactions: &[Transaction]) -> HashMap<&str, usize> {
        let mut counts = HashMap::new();
        for tx in transactions {
            *counts.entry(tx.sender_id.as_str()).or_insert(0) += 1;
            if tx.receiver_id != tx.sender_id {
                *counts.entry(tx.receiver_id.as_str()).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Graph component for one account.
    pub fn graph_risk(betweenness: f64, pagerank: f64, is_hub: bool, config: &RiskConfig) -> f64 {
        let blended = (config.centrality_scale * (0.5 * betweenness + 0.5 * pagerank)).min(1.0);
        if is_hub {
            blended.max(config.hub_floor)
        } else {
            blended
        }
    }

    /// Score every account of the graph.
    pub fn compute(
        transactions: &[Transaction],
        graph: &TransactionGraph,
        intelligence: &GraphIntelligenceResult,
        anomaly: &AnomalyResult,
        rings: &[Ring],
        config: &RiskConfig,
    ) -> BTreeMap<String, RiskResult> {
        let mut severity: HashMap<&str, f64> = HashMap::new();
        for ring in rings {
            let s = ring.pattern_type.severity();
            for member in &ring.member_accounts {
                let slot = severity.entry(member.as_str()).or_insert(0.0);
                *slot = slot.max(s);
            }
        }

        let velocity = Self::velocity_counts(transactions, config);
        let involvement = Self::involvement_counts(transactions);

        let mut scores = BTreeMap::new();
        for account in graph.accounts() {
            let key = account.as_str();
            let bt = intelligence.betweenness.get(key).copied().unwrap_or(0.0);
            let pr = intelligence.pagerank.get(key).copied().unwrap_or(0.0);

            let breakdown = RiskBreakdown {
                graph_risk: Self::graph_risk(bt, pr, intelligence.is_hub(key), config),
                anomaly_score: anomaly.score(key),
                pattern_risk: severity.get(key).copied().unwrap_or(0.0),
                velocity_risk: (velocity.get(key).copied().unwrap_or(0) as f64
                    / config.velocity_saturation)
                    .min(1.0),
            };

            let weighted = config.graph_weight * breakdown.graph_risk
                + config.anomaly_weight * breakdown.anomaly_score
                + config.pattern_weight * breakdown.pattern_risk
                + config.velocity_weight * breakdown.velocity_risk;
            let score = if weighted.is_finite() {
                round_to(100.0 * weighted, 2)
            } else {
                0.0
            };
            let confidence = (involvement.get(key).copied().unwrap_or(0) as f64
                / config.confidence_saturation)
                .min(1.0);

            scores.insert(
                account.clone(),
                RiskResult {
                    score,
                    confidence,
                    breakdown,
                },
            );
        }

        tracing::debug!(accounts = scores.len(), "Risk fusion complete");
        scores
    }
}

impl AnalysisKernel for RiskFusion {
    fn metadata(&self) -> &KernelMetadata {
        &self.metadata
    }
}

#[async_trait]
impl BatchKernel<RiskInput, RiskOutput> for RiskFusion {
    async fn execute(&self, input: RiskInput) -> Result<RiskOutput> {
        let start = Instant::now();
        let scores = Self::compute(
            &input.transactions,
            &input.graph,
            &input.intelligence,
            &input.anomaly,
            &input.rings,
            &input.config,
        );
        Ok(RiskOutput {
            scores,
            compute_time_us: start.elapsed().as_micros() as u64,
        })
    }
}
