//! Graph intelligence: the structural view of a transaction graph.
//!
//! Combines community detection, strongly connected components, weighted
//! betweenness, amount-weighted PageRank and hub classification into one
//! result keyed by account id.

use crate::centrality::{BetweennessCentrality, PageRank};
use crate::community::LouvainCommunity;
use crate::components::StronglyConnectedComponents;
use crate::messages::{IntelligenceInput, IntelligenceOutput};
use crate::types::TransactionGraph;
use async_trait::async_trait;
use ringwatch_core::{
    config::GraphConfig, domain::Domain, error::Result, kernel::KernelMetadata,
    traits::AnalysisKernel, traits::BatchKernel,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

/// Structural analytics for every account in the graph.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphIntelligenceResult {
    /// Community id per account.
    pub community: BTreeMap<String, usize>,
    /// Strongly connected components with at least two members.
    pub scc: Vec<Vec<String>>,
    /// Normalized weighted betweenness per account.
    pub betweenness: BTreeMap<String, f64>,
    /// PageRank per account.
    pub pagerank: BTreeMap<String, f64>,
    /// Accounts classified as hubs.
    pub hubs: BTreeSet<String>,
    /// Modularity of the community partition.
    pub modularity: f64,
}

impl GraphIntelligenceResult {
    /// Returns true if the account is a hub.
    #[must_use]
    pub fn is_hub(&self, account: &str) -> bool {
        self.hubs.contains(account)
    }

    /// Members of each community, ascending by community id.
    #[must_use]
    pub fn clusters(&self) -> BTreeMap<usize, Vec<String>> {
        let mut clusters: BTreeMap<usize, Vec<String>> = BTreeMap::new();
        for (account, &cid) in &self.community {
            clusters.entry(cid).or_default().push(account.clone());
        }
        clusters
    }
}

// ============================================================================
// Hub Classification Kernel
// ============================================================================

/// Hub classification kernel.
///
/// A node is a hub when its betweenness exceeds `multiplier` times the mean
/// betweenness of the graph. A graph whose betweenness is zero everywhere
/// has no hubs.
#[derive(Debug, Clone)]
pub struct HubClassifier {
    metadata: KernelMetadata,
}

impl HubClassifier {
    /// Create a new hub classifier.
    #[must_use]
    pub fn new() -> Self {
        Self {
            metadata: KernelMetadata::batch("graph/hub-classification", Domain::GraphAnalytics)
                .with_description("Hubs by betweenness relative to the graph mean")
                .with_throughput(1_000_000)
                .with_latency_us(1.0),
        }
    }

    /// Indices of nodes whose score exceeds `multiplier` × mean.
    pub fn compute(scores: &[f64], multiplier: f64) -> Vec<usize> {
        if scores.is_empty() {
            return Vec::new();
        }
        let mean = scores.iter().sum::<f64>() / scores.len() as f64;
        let threshold = multiplier * mean;
        scores
            .iter()
            .enumerate()
            .filter(|(_, &s)| s > threshold)
            .map(|(i, _)| i)
            .collect()
    }
}

impl Default for HubClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisKernel for HubClassifier {
    fn metadata(&self) -> &KernelMetadata {
        &self.metadata
    }
}

// ============================================================================
// Graph Intelligence Kernel
// ============================================================================

/// Graph intelligence kernel.
///
/// Runs the four structural analyses in parallel on the rayon pool and
/// relabels the results by account id.
#[derive(Debug, Clone)]
pub struct GraphIntelligence {
    metadata: KernelMetadata,
}

impl GraphIntelligence {
    /// Create a new graph intelligence kernel.
    #[must_use]
    pub fn new() -> Self {
        Self {
            metadata: KernelMetadata::batch("graph/intelligence", Domain::GraphAnalytics)
                .with_description("Communities, SCCs, centralities and hubs")
                .with_throughput(1_000)
                .with_latency_us(5_000.0),
        }
    }

    /// Analyze a graph.
    pub fn compute(graph: &TransactionGraph, config: &GraphConfig) -> GraphIntelligenceResult {
        if graph.is_empty() {
            return GraphIntelligenceResult::default();
        }

        let ((communities, components), (betweenness, pagerank)) = rayon::join(
            || {
                rayon::join(
                    || {
                        LouvainCommunity::compute(
                            graph,
                            config.louvain_max_passes,
                            config.louvain_max_levels,
                            config.louvain_min_gain,
                        )
                    },
                    || StronglyConnectedComponents::compute(graph),
                )
            },
            || {
                rayon::join(
                    || BetweennessCentrality::compute(graph, true),
                    || {
                        PageRank::compute(
                            graph,
                            config.pagerank_damping,
                            config.pagerank_max_iterations,
                            config.pagerank_tolerance,
                        )
                    },
                )
            },
        );

        let hubs: BTreeSet<String> =
            HubClassifier::compute(&betweenness.scores, config.hub_multiplier)
                .into_iter()
                .map(|i| graph.account(i).to_string())
                .collect();

        let by_account = |values: &[f64]| -> BTreeMap<String, f64> {
            graph
                .accounts()
                .iter()
                .cloned()
                .zip(values.iter().copied())
                .collect()
        };

        let result = GraphIntelligenceResult {
            community: graph
                .accounts()
                .iter()
                .cloned()
                .zip(communities.assignments.iter().copied())
                .collect(),
            scc: components
                .into_iter()
                .map(|c| c.into_iter().map(|i| graph.account(i).to_string()).collect())
                .collect(),
            betweenness: by_account(&betweenness.scores),
            pagerank: by_account(&pagerank.scores),
            hubs,
            modularity: communities.modularity,
        };

        tracing::info!(
            nodes = graph.node_count(),
            communities = communities.num_communities,
            components = result.scc.len(),
            hubs = result.hubs.len(),
            pagerank_converged = pagerank.converged,
            "Graph intelligence complete"
        );

        result
    }
}

impl Default for GraphIntelligence {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisKernel for GraphIntelligence {
    fn metadata(&self) -> &KernelMetadata {
        &self.metadata
    }
}

#[async_trait]
impl BatchKernel<IntelligenceInput, IntelligenceOutput> for GraphIntelligence {
    async fn execute(&self, input: IntelligenceInput) -> Result<IntelligenceOutput> {
        let start = Instant::now();
        let result = Self::compute(&input.graph, &input.config);
        let compute_time_us = start.elapsed().as_micros() as u64;

        Ok(IntelligenceOutput {
            result,
            compute_time_us,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use ringwatch_core::transaction::Transaction;
    use std::sync::Arc;

    fn star_through_hub() -> TransactionGraph {
        // Five feeders send to H, H pays out to five collectors.
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut txs = Vec::new();
        for i in 0..5 {
            txs.push(Transaction::new(format!("I{i}"), format!("F{i}"), "H", 100.0, ts));
            txs.push(Transaction::new(format!("O{i}"), "H", format!("C{i}"), 90.0, ts));
        }
        TransactionGraph::from_transactions(&txs)
    }

    #[test]
    fn test_hub_classifier() {
        // Mean 0.2, threshold exactly 1.0: not strictly above.
        let hubs = HubClassifier::compute(&[0.0, 0.0, 0.0, 0.0, 1.0], 5.0);
        assert!(hubs.is_empty());

        let hubs = HubClassifier::compute(&[0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0], 5.0);
        assert_eq!(hubs, vec![7]);

        assert!(HubClassifier::compute(&[0.0; 4], 5.0).is_empty());
        assert!(HubClassifier::compute(&[], 5.0).is_empty());
    }

    #[test]
    fn test_star_hub_detected() {
        let graph = star_through_hub();
        let result = GraphIntelligence::compute(&graph, &GraphConfig::default());

        assert_eq!(result.hubs.len(), 1);
        assert!(result.is_hub("H"));
        assert!(result.scc.is_empty());
        assert_eq!(result.community.len(), 11);
        assert_eq!(result.betweenness.len(), 11);
        assert_eq!(result.pagerank.len(), 11);
    }

    #[test]
    fn test_scc_and_clusters_by_account() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let txs = vec![
            Transaction::new("T1", "A", "B", 10.0, ts),
            Transaction::new("T2", "B", "C", 10.0, ts),
            Transaction::new("T3", "C", "A", 10.0, ts),
            Transaction::new("T4", "X", "Y", 10.0, ts),
        ];
        let graph = TransactionGraph::from_transactions(&txs);
        let result = GraphIntelligence::compute(&graph, &GraphConfig::default());

        assert_eq!(result.scc, vec![vec!["A", "B", "C"]]);
        let clusters = result.clusters();
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[&0], vec!["A", "B", "C"]);
        assert_eq!(clusters[&1], vec!["X", "Y"]);
    }

    #[test]
    fn test_empty_graph() {
        let result = GraphIntelligence::compute(&TransactionGraph::empty(), &GraphConfig::default());
        assert!(result.community.is_empty());
        assert!(result.scc.is_empty());
        assert!(result.betweenness.is_empty());
        assert!(result.pagerank.is_empty());
        assert!(result.hubs.is_empty());
    }

    #[tokio::test]
    async fn test_batch_execute() {
        let kernel = GraphIntelligence::new();
        let output = kernel
            .execute(IntelligenceInput {
                graph: Arc::new(star_through_hub()),
                config: GraphConfig::default(),
            })
            .await
            .unwrap();
        assert!(output.result.is_hub("H"));
    }
}
