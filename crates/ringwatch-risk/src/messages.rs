//! Batch kernel message types for risk fusion.

use crate::types::RiskResult;
use ringwatch_core::config::RiskConfig;
use ringwatch_core::ring::Ring;
use ringwatch_core::transaction::Transaction;
use ringwatch_graph::intelligence::GraphIntelligenceResult;
use ringwatch_graph::types::TransactionGraph;
use ringwatch_ml::types::AnomalyResult;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Everything the fusion engine joins on.
#[derive(Debug, Clone)]
pub struct RiskInput {
    /// Raw transactions, for velocity and confidence.
    pub transactions: Arc<Vec<Transaction>>,
    /// Account set.
    pub graph: Arc<TransactionGraph>,
    /// Centralities and hubs.
    pub intelligence: Arc<GraphIntelligenceResult>,
    /// Anomaly scores.
    pub anomaly: Arc<AnomalyResult>,
    /// Rings from every detector.
    pub rings: Arc<Vec<Ring>>,
    /// Weights and saturations.
    pub config: RiskConfig,
}

/// Output of risk fusion.
#[derive(Debug, Clone)]
pub struct RiskOutput {
    /// Fused risk per account.
    pub scores: BTreeMap<String, RiskResult>,
    /// Computation time in microseconds.
    pub compute_time_us: u64,
}
