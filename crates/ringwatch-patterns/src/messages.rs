//! Batch kernel message types for pattern detectors.

use ringwatch_core::config::{CycleConfig, ShellConfig, SmurfConfig};
use ringwatch_core::ring::Ring;
use ringwatch_core::transaction::Transaction;
use ringwatch_graph::types::TransactionGraph;
use std::sync::Arc;

/// Input for cycle detection.
#[derive(Debug, Clone)]
pub struct CycleInput {
    /// Graph to search.
    pub graph: Arc<TransactionGraph>,
    /// Length bounds and result budget.
    pub config: CycleConfig,
}

/// Input for fan-in / fan-out detection.
#[derive(Debug, Clone)]
pub struct SmurfInput {
    /// Raw transactions, any order.
    pub transactions: Arc<Vec<Transaction>>,
    /// Window and thresholds.
    pub config: SmurfConfig,
}

/// Input for layered shell detection.
#[derive(Debug, Clone)]
pub struct ShellInput {
    /// Graph to search.
    pub graph: Arc<TransactionGraph>,
    /// Retention, hop and window bounds.
    pub config: ShellConfig,
}

/// Output shared by every detector.
#[derive(Debug, Clone, Default)]
pub struct DetectionOutput {
    /// Detected rings in detection order.
    pub rings: Vec<Ring>,
    /// Computation time in microseconds.
    pub compute_time_us: u64,
}
