//! Transaction graph construction kernel.

use crate::messages::{GraphBuildInput, GraphBuildOutput};
use crate::types::TransactionGraph;
use async_trait::async_trait;
use ringwatch_core::{
    domain::Domain, error::Result, kernel::KernelMetadata, traits::AnalysisKernel,
    traits::BatchKernel, transaction::Transaction,
};
use std::sync::Arc;
use std::time::Instant;

/// Builds the aggregated transaction graph.
///
/// One grouped pass over the transactions; each ordered sender/receiver
/// pair becomes a single edge carrying the summed amount and the
/// transaction count.
#[derive(Debug, Clone)]
pub struct TransactionGraphBuilder {
    metadata: KernelMetadata,
}

impl TransactionGraphBuilder {
    /// Create a new graph builder kernel.
    #[must_use]
    pub fn new() -> Self {
        Self {
            metadata: KernelMetadata::batch("graph/transaction-graph", Domain::GraphAnalytics)
                .with_description("Aggregated directed transaction graph")
                .with_throughput(1_000_000)
                .with_latency_us(5.0),
        }
    }

    /// Build the graph.
    pub fn compute(transactions: &[Transaction]) -> TransactionGraph {
        let graph = TransactionGraph::from_transactions(transactions);
        tracing::debug!(
            transactions = transactions.len(),
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "Built transaction graph"
        );
        graph
    }
}

impl Default for TransactionGraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisKernel for TransactionGraphBuilder {
    fn metadata(&self) -> &KernelMetadata {
        &self.metadata
    }
}

#[async_trait]
impl BatchKernel<GraphBuildInput, GraphBuildOutput> for TransactionGraphBuilder {
    fn validate_input(&self, input: &GraphBuildInput) -> Result<()> {
        ringwatch_core::transaction::validate_all(&input.transactions)
    }

    async fn execute(&self, input: GraphBuildInput) -> Result<GraphBuildOutput> {
        let start = Instant::now();
        let graph = Self::compute(&input.transactions);
        let compute_time_us = start.elapsed().as_micros() as u64;

        Ok(GraphBuildOutput {
            graph: Arc::new(graph),
            compute_time_us,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[tokio::test]
    async fn test_build_via_kernel() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let txs = vec![
            Transaction::new("T1", "A", "B", 10.0, ts),
            Transaction::new("T2", "A", "B", 15.0, ts),
            Transaction::new("T3", "B", "C", 20.0, ts),
        ];
        let kernel = TransactionGraphBuilder::new();
        let output = kernel
            .execute(GraphBuildInput {
                transactions: Arc::new(txs),
            })
            .await
            .unwrap();

        assert_eq!(output.graph.node_count(), 3);
        assert_eq!(output.graph.edge_count(), 2);
        assert_eq!(output.graph.transaction_count(), 3);
    }

    #[test]
    fn test_rejects_negative_amount() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let kernel = TransactionGraphBuilder::new();
        let input = GraphBuildInput {
            transactions: Arc::new(vec![Transaction::new("T1", "A", "B", -1.0, ts)]),
        };
        assert!(kernel.validate_input(&input).is_err());
    }
}
