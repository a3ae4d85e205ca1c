//! Strongly connected components.
//!
//! Tarjan's algorithm with an explicit DFS stack, O(V+E). Only components
//! with at least two accounts are reported; a lone account is trivially
//! cycle-free.

use crate::messages::{SccInput, SccOutput};
use crate::types::TransactionGraph;
use async_trait::async_trait;
use ringwatch_core::{
    domain::Domain, error::Result, kernel::KernelMetadata, traits::AnalysisKernel,
    traits::BatchKernel,
};
use std::time::Instant;

/// Strongly connected components kernel.
#[derive(Debug, Clone)]
pub struct StronglyConnectedComponents {
    metadata: KernelMetadata,
}

impl StronglyConnectedComponents {
    /// Create a new SCC kernel.
    #[must_use]
    pub fn new() -> Self {
        Self {
            metadata: KernelMetadata::batch("graph/strongly-connected", Domain::GraphAnalytics)
                .with_description("Strongly connected components (Tarjan)")
                .with_throughput(1_000_000)
                .with_latency_us(20.0),
        }
    }

    /// Components of size ≥ 2, each sorted ascending by node index, in the
    /// order Tarjan completes them.
    pub fn compute(graph: &TransactionGraph) -> Vec<Vec<usize>> {
        let n = graph.node_count();
        if n == 0 {
            return Vec::new();
        }

        const UNVISITED: usize = usize::MAX;
        let mut index = vec![UNVISITED; n];
        let mut lowlink = vec![UNVISITED; n];
        let mut on_stack = vec![false; n];
        let mut stack: Vec<usize> = Vec::new();
        let mut components: Vec<Vec<usize>> = Vec::new();
        let mut current_index = 0usize;

        for start in 0..n {
            if index[start] != UNVISITED {
                continue;
            }

            // (node, next out-edge position)
            let mut dfs_stack: Vec<(usize, usize)> = vec![(start, 0)];

            while let Some(frame) = dfs_stack.last_mut() {
                let (v, edge_pos) = *frame;
                if edge_pos == 0 && index[v] == UNVISITED {
                    index[v] = current_index;
                    lowlink[v] = current_index;
                    current_index += 1;
                    stack.push(v);
                    on_stack[v] = true;
                }

                let out = graph.out_edges(v);
                if edge_pos < out.len() {
                    frame.1 += 1;
                    let w = out[edge_pos].target;
                    if index[w] == UNVISITED {
                        dfs_stack.push((w, 0));
                    } else if on_stack[w] {
                        lowlink[v] = lowlink[v].min(index[w]);
                    }
                    continue;
                }

                dfs_stack.pop();
                if let Some(&(parent, _)) = dfs_stack.last() {
                    lowlink[parent] = lowlink[parent].min(lowlink[v]);
                }

                if lowlink[v] == index[v] {
                    let mut component = Vec::new();
                    while let Some(w) = stack.pop() {
                        on_stack[w] = false;
                        component.push(w);
                        if w == v {
                            break;
                        }
                    }
                    if component.len() > 1 {
                        component.sort_unstable();
                        components.push(component);
                    }
                }
            }
        }

        components
    }
}

impl Default for StronglyConnectedComponents {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisKernel for StronglyConnectedComponents {
    fn metadata(&self) -> &KernelMetadata {
        &self.metadata
    }
}

#[async_trait]
impl BatchKernel<SccInput, SccOutput> for StronglyConnectedComponents {
    async fn execute(&self, input: SccInput) -> Result<SccOutput> {
        let start = Instant::now();
        let components = Self::compute(&input.graph);
        let compute_time_us = start.elapsed().as_micros() as u64;

        Ok(SccOutput {
            components,
            compute_time_us,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use ringwatch_core::transaction::Transaction;

    fn graph_from_pairs(pairs: &[(&str, &str)]) -> TransactionGraph {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let txs: Vec<Transaction> = pairs
            .iter()
            .enumerate()
            .map(|(i, (a, b))| Transaction::new(format!("T{i}"), *a, *b, 10.0, ts))
            .collect();
        TransactionGraph::from_transactions(&txs)
    }

    #[test]
    fn test_scc_metadata() {
        let kernel = StronglyConnectedComponents::new();
        assert_eq!(kernel.metadata().id, "graph/strongly-connected");
    }

    #[test]
    fn test_two_components_and_singletons() {
        // A<->B, C->D->E->C, E->F (F alone), G->G self loop
        let graph = graph_from_pairs(&[
            ("A", "B"),
            ("B", "A"),
            ("C", "D"),
            ("D", "E"),
            ("E", "C"),
            ("E", "F"),
            ("G", "G"),
        ]);
        let mut comps: Vec<Vec<&str>> = StronglyConnectedComponents::compute(&graph)
            .into_iter()
            .map(|c| c.into_iter().map(|i| graph.account(i)).collect())
            .collect();
        comps.sort();

        assert_eq!(comps, vec![vec!["A", "B"], vec!["C", "D", "E"]]);
    }

    #[test]
    fn test_acyclic_graph_has_no_components() {
        let graph = graph_from_pairs(&[("A", "B"), ("B", "C"), ("A", "C")]);
        assert!(StronglyConnectedComponents::compute(&graph).is_empty());
    }

    #[test]
    fn test_long_chain_does_not_overflow() {
        let names: Vec<String> = (0..20_000).map(|i| format!("N{i:05}")).collect();
        let mut pairs: Vec<(&str, &str)> = names
            .windows(2)
            .map(|w| (w[0].as_str(), w[1].as_str()))
            .collect();
        pairs.push((names[names.len() - 1].as_str(), names[0].as_str()));
        let graph = graph_from_pairs(&pairs);

        let comps = StronglyConnectedComponents::compute(&graph);
        assert_eq!(comps.len(), 1);
        assert_eq!(comps[0].len(), 20_000);
    }
}
