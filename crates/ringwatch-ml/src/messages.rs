//! Batch kernel message types for ML kernels.

use crate::types::AnomalyResult;
use ringwatch_core::config::AnomalyConfig;
use ringwatch_core::transaction::Transaction;
use ringwatch_graph::types::TransactionGraph;
use std::sync::Arc;

/// Input for anomaly scoring.
#[derive(Debug, Clone)]
pub struct AnomalyInput {
    /// Raw transactions for flow statistics.
    pub transactions: Arc<Vec<Transaction>>,
    /// Graph supplying the account set and degrees.
    pub graph: Arc<TransactionGraph>,
    /// Forest parameters.
    pub config: AnomalyConfig,
}

/// Output of anomaly scoring.
#[derive(Debug, Clone)]
pub struct AnomalyOutput {
    /// Per-account scores.
    pub result: AnomalyResult,
    /// Computation time in microseconds.
    pub compute_time_us: u64,
}
