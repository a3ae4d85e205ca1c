//! Batch kernel message types for graph kernels.
//!
//! Graphs are passed behind `Arc` so that several kernels can read the same
//! graph concurrently without copying it.

use crate::intelligence::GraphIntelligenceResult;
use crate::types::{CentralityResult, CommunityResult, TransactionGraph};
use ringwatch_core::config::GraphConfig;
use ringwatch_core::transaction::Transaction;
use std::sync::Arc;

// ============================================================================
// Graph Construction Messages
// ============================================================================

/// Input for graph construction.
#[derive(Debug, Clone)]
pub struct GraphBuildInput {
    /// Transactions to aggregate.
    pub transactions: Arc<Vec<Transaction>>,
}

/// Output of graph construction.
#[derive(Debug, Clone)]
pub struct GraphBuildOutput {
    /// The aggregated graph.
    pub graph: Arc<TransactionGraph>,
    /// Computation time in microseconds.
    pub compute_time_us: u64,
}

// ============================================================================
// Community Detection Messages
// ============================================================================

/// Input for community detection.
#[derive(Debug, Clone)]
pub struct CommunityInput {
    /// Graph to partition.
    pub graph: Arc<TransactionGraph>,
    /// Louvain parameters.
    pub config: GraphConfig,
}

/// Output of community detection.
#[derive(Debug, Clone)]
pub struct CommunityOutput {
    /// Partition and modularity.
    pub result: CommunityResult,
    /// Computation time in microseconds.
    pub compute_time_us: u64,
}

// ============================================================================
// Strongly Connected Component Messages
// ============================================================================

/// Input for SCC decomposition.
#[derive(Debug, Clone)]
pub struct SccInput {
    /// Graph to decompose.
    pub graph: Arc<TransactionGraph>,
}

/// Output of SCC decomposition.
#[derive(Debug, Clone)]
pub struct SccOutput {
    /// Components with at least two members, as node indices.
    pub components: Vec<Vec<usize>>,
    /// Computation time in microseconds.
    pub compute_time_us: u64,
}

// ============================================================================
// Centrality Messages
// ============================================================================

/// Input for centrality kernels.
#[derive(Debug, Clone)]
pub struct CentralityInput {
    /// Graph to score.
    pub graph: Arc<TransactionGraph>,
    /// PageRank parameters.
    pub config: GraphConfig,
}

/// Output of centrality kernels.
#[derive(Debug, Clone)]
pub struct CentralityOutput {
    /// Per-node scores.
    pub result: CentralityResult,
    /// Computation time in microseconds.
    pub compute_time_us: u64,
}

// ============================================================================
// Graph Intelligence Messages
// ============================================================================

/// Input for the combined graph intelligence pass.
#[derive(Debug, Clone)]
pub struct IntelligenceInput {
    /// Graph to analyze.
    pub graph: Arc<TransactionGraph>,
    /// Graph parameters.
    pub config: GraphConfig,
}

/// Output of the combined graph intelligence pass.
#[derive(Debug, Clone)]
pub struct IntelligenceOutput {
    /// Communities, components, centralities and hubs.
    pub result: GraphIntelligenceResult,
    /// Computation time in microseconds.
    pub compute_time_us: u64,
}
