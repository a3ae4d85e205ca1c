//! Centrality measure kernels.
//!
//! This module provides:
//! - Betweenness centrality (Brandes over Dijkstra, weighted by transaction count)
//! - PageRank (power iteration weighted by transferred amount)

use crate::messages::{CentralityInput, CentralityOutput};
use crate::types::{CentralityResult, TransactionGraph};
use async_trait::async_trait;
use rayon::prelude::*;
use ringwatch_core::{
    domain::Domain, error::Result, kernel::KernelMetadata, traits::AnalysisKernel,
    traits::BatchKernel,
};
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::time::Instant;

/// Sources handled per parallel work unit. Fixed so that floating point
/// accumulation order does not depend on the thread pool.
const SOURCES_PER_CHUNK: usize = 64;

// ============================================================================
// Betweenness Centrality Kernel (Brandes Algorithm)
// ============================================================================

/// Betweenness centrality kernel.
///
/// Brandes algorithm with Dijkstra single-source searches, where the length
/// of an edge is its transaction count. O(VE + V² log V).
#[derive(Debug, Clone)]
pub struct BetweennessCentrality {
    metadata: KernelMetadata,
}

impl BetweennessCentrality {
    /// Create a new betweenness centrality kernel.
    #[must_use]
    pub fn new() -> Self {
        Self {
            metadata: KernelMetadata::batch("graph/betweenness-centrality", Domain::GraphAnalytics)
                .with_description("Weighted betweenness centrality (Brandes algorithm)")
                .with_throughput(10_000)
                .with_latency_us(100.0),
        }
    }

    /// Compute betweenness centrality.
    ///
    /// With `normalized`, scores are scaled by 1/((n-1)(n-2)) for n > 2.
    pub fn compute(graph: &TransactionGraph, normalized: bool) -> CentralityResult {
        let n = graph.node_count();
        if n == 0 {
            return CentralityResult {
                scores: Vec::new(),
                iterations: None,
                converged: true,
            };
        }

        let sources: Vec<usize> = (0..n).collect();
        let partials: Vec<Vec<f64>> = sources
            .par_chunks(SOURCES_PER_CHUNK)
            .map(|chunk| {
                let mut acc = vec![0.0f64; n];
                for &s in chunk {
                    Self::accumulate_from(graph, s, &mut acc);
                }
                acc
            })
            .collect();

        let mut centrality = vec![0.0f64; n];
        for partial in &partials {
            for (c, p) in centrality.iter_mut().zip(partial) {
                *c += p;
            }
        }

        if normalized && n > 2 {
            let scale = 1.0 / ((n - 1) * (n - 2)) as f64;
            for c in &mut centrality {
                *c *= scale;
            }
        }

        CentralityResult {
            scores: centrality,
            iterations: None,
            converged: true,
        }
    }

    /// Single-source Dijkstra followed by the backward dependency pass.
    fn accumulate_from(graph: &TransactionGraph, s: usize, centrality: &mut [f64]) {
        let n = graph.node_count();
        let mut stack: Vec<usize> = Vec::with_capacity(n);
        let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut sigma = vec![0.0f64; n];
        let mut settled = vec![false; n];
        let mut seen: Vec<Option<u64>> = vec![None; n];

        // (distance, insertion sequence, predecessor, node)
        let mut heap: BinaryHeap<Reverse<(u64, u64, usize, usize)>> = BinaryHeap::new();
        let mut seq = 0u64;

        sigma[s] = 1.0;
        seen[s] = Some(0);
        heap.push(Reverse((0, seq, s, s)));

        while let Some(Reverse((dist, _, pred, v))) = heap.pop() {
            if settled[v] {
                continue;
            }
            if v != s {
                sigma[v] += sigma[pred];
            }
            stack.push(v);
            settled[v] = true;

            for edge in graph.out_edges(v) {
                let w = edge.target;
                let vw_dist = dist + edge.weight;
                match seen[w] {
                    Some(d) if settled[w] || vw_dist > d => {}
                    Some(d) if vw_dist == d => {
                        sigma[w] += sigma[v];
                        predecessors[w].push(v);
                    }
                    _ => {
                        seq += 1;
                        seen[w] = Some(vw_dist);
                        heap.push(Reverse((vw_dist, seq, v, w)));
                        sigma[w] = 0.0;
                        predecessors[w].clear();
                        predecessors[w].push(v);
                    }
                }
            }
        }

        // Backward pass - accumulate dependencies
        let mut delta = vec![0.0f64; n];
        while let Some(w) = stack.pop() {
            let coeff = (1.0 + delta[w]) / sigma[w];
            for &v in &predecessors[w] {
                delta[v] += sigma[v] * coeff;
            }
            if w != s {
                centrality[w] += delta[w];
            }
        }
    }
}

impl Default for BetweennessCentrality {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisKernel for BetweennessCentrality {
    fn metadata(&self) -> &KernelMetadata {
        &self.metadata
    }
}

#[async_trait]
impl BatchKernel<CentralityInput, CentralityOutput> for BetweennessCentrality {
    async fn execute(&self, input: CentralityInput) -> Result<CentralityOutput> {
        let start = Instant::now();
        let result = Self::compute(&input.graph, true);
        let compute_time_us = start.elapsed().as_micros() as u64;

        Ok(CentralityOutput {
            result,
            compute_time_us,
        })
    }
}

// ============================================================================
// PageRank Kernel
// ============================================================================

/// PageRank iteration state.
#[derive(Debug, Clone, Default)]
pub struct PageRankState {
    /// Current scores.
    pub scores: Vec<f64>,
    /// Previous scores (for convergence check).
    pub prev_scores: Vec<f64>,
    /// Total outgoing amount per node.
    pub out_amount: Vec<f64>,
    /// Nodes with no outgoing amount.
    pub dangling: Vec<usize>,
    /// Damping factor.
    pub damping: f64,
    /// Current iteration.
    pub iteration: u32,
    /// Whether converged.
    pub converged: bool,
}

/// PageRank kernel.
///
/// Transition probabilities are proportional to the amount sent along each
/// edge. Mass held by dangling nodes (zero outgoing amount) is spread
/// uniformly over all nodes.
#[derive(Debug, Clone)]
pub struct PageRank {
    metadata: KernelMetadata,
}

impl PageRank {
    /// Create a new PageRank kernel.
    #[must_use]
    pub fn new() -> Self {
        Self {
            metadata: KernelMetadata::batch("graph/pagerank", Domain::GraphAnalytics)
                .with_description("Amount-weighted PageRank via power iteration")
                .with_throughput(100_000)
                .with_latency_us(10.0),
        }
    }

    /// Initialize state for a graph.
    pub fn initialize_state(graph: &TransactionGraph, damping: f64) -> PageRankState {
        let n = graph.node_count();
        let out_amount: Vec<f64> = (0..n)
            .map(|u| graph.out_edges(u).iter().map(|e| e.amount).sum())
            .collect();
        let dangling = (0..n).filter(|&u| out_amount[u] == 0.0).collect();

        PageRankState {
            scores: vec![1.0 / n.max(1) as f64; n],
            prev_scores: vec![0.0; n],
            out_amount,
            dangling,
            damping,
            iteration: 0,
            converged: false,
        }
    }

    /// Perform one iteration. Returns the L1 change of the score vector.
    pub fn iterate_step(graph: &TransactionGraph, state: &mut PageRankState) -> f64 {
        let n = graph.node_count();
        if n == 0 {
            return 0.0;
        }

        let d = state.damping;
        let uniform = 1.0 / n as f64;

        std::mem::swap(&mut state.scores, &mut state.prev_scores);

        let dangle_sum: f64 = d * state.dangling.iter().map(|&u| state.prev_scores[u]).sum::<f64>();
        state.scores.iter_mut().for_each(|x| *x = 0.0);

        for u in 0..n {
            let out = state.out_amount[u];
            if out == 0.0 {
                continue;
            }
            let share = d * state.prev_scores[u] / out;
            for edge in graph.out_edges(u) {
                state.scores[edge.target] += share * edge.amount;
            }
        }

        let base = dangle_sum * uniform + (1.0 - d) * uniform;
        let mut err = 0.0;
        for (x, prev) in state.scores.iter_mut().zip(&state.prev_scores) {
            *x += base;
            err += (*x - prev).abs();
        }

        state.iteration += 1;
        err
    }

    /// Run PageRank until the L1 change drops below `n * tolerance` or the
    /// iteration cap is reached. A non-converged run returns the last iterate.
    pub fn compute(
        graph: &TransactionGraph,
        damping: f64,
        max_iterations: usize,
        tolerance: f64,
    ) -> CentralityResult {
        let n = graph.node_count();
        if n == 0 {
            return CentralityResult {
                scores: Vec::new(),
                iterations: Some(0),
                converged: true,
            };
        }

        let mut state = Self::initialize_state(graph, damping);
        for _ in 0..max_iterations {
            let err = Self::iterate_step(graph, &mut state);
            if err < n as f64 * tolerance {
                state.converged = true;
                break;
            }
        }

        if !state.converged {
            tracing::warn!(
                iterations = state.iteration,
                nodes = n,
                "PageRank did not converge, using last iterate"
            );
        }

        CentralityResult {
            scores: state.scores,
            iterations: Some(state.iteration),
            converged: state.converged,
        }
    }
}

impl Default for PageRank {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisKernel for PageRank {
    fn metadata(&self) -> &KernelMetadata {
        &self.metadata
    }
}

#[async_trait]
impl BatchKernel<CentralityInput, CentralityOutput> for PageRank {
    async fn execute(&self, input: CentralityInput) -> Result<CentralityOutput> {
        let start = Instant::now();
        let result = Self::compute(
            &input.graph,
            input.config.pagerank_damping,
            input.config.pagerank_max_iterations,
            input.config.pagerank_tolerance,
        );
        let compute_time_us = start.elapsed().as_micros() as u64;

        Ok(CentralityOutput {
            result,
            compute_time_us,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use ringwatch_core::config::GraphConfig;
    use ringwatch_core::transaction::Transaction;
    use std::sync::Arc;

    fn graph_from_edges(edges: &[(&str, &str, f64)]) -> TransactionGraph {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let txs: Vec<Transaction> = edges
            .iter()
            .enumerate()
            .map(|(i, (a, b, amt))| Transaction::new(format!("T{i}"), *a, *b, *amt, ts))
            .collect();
        TransactionGraph::from_transactions(&txs)
    }

    fn create_cycle_graph() -> TransactionGraph {
        graph_from_edges(&[
            ("A", "B", 10.0),
            ("B", "C", 10.0),
            ("C", "D", 10.0),
            ("D", "A", 10.0),
        ])
    }

    #[test]
    fn test_pagerank_metadata() {
        let kernel = PageRank::new();
        assert_eq!(kernel.metadata().id, "graph/pagerank");
        assert_eq!(kernel.metadata().domain, Domain::GraphAnalytics);
    }

    #[test]
    fn test_pagerank_iteration() {
        let graph = create_cycle_graph();
        let mut state = PageRank::initialize_state(&graph, 0.85);

        let diff = PageRank::iterate_step(&graph, &mut state);
        assert!(diff >= 0.0);
        assert_eq!(state.iteration, 1);
    }

    #[test]
    fn test_pagerank_cycle_is_uniform() {
        let graph = create_cycle_graph();
        let result = PageRank::compute(&graph, 0.85, 100, 1e-6);

        assert!(result.converged);
        for score in &result.scores {
            assert!((score - 0.25).abs() < 1e-9);
        }
    }

    #[test]
    fn test_pagerank_follows_amount() {
        // A sends most of its money to C, a trickle to B.
        let graph = graph_from_edges(&[
            ("A", "B", 1.0),
            ("A", "C", 99.0),
            ("B", "A", 5.0),
            ("C", "A", 5.0),
        ]);
        let result = PageRank::compute(&graph, 0.85, 100, 1e-6);
        let b = graph.index_of("B").unwrap();
        let c = graph.index_of("C").unwrap();
        assert!(result.scores[c] > result.scores[b]);
        let total: f64 = result.scores.iter().sum();
        assert!((total - 1.0).abs() < 1e-9, "mass not conserved: {}", total);
    }

    #[test]
    fn test_pagerank_dangling_mass_conserved() {
        let graph = graph_from_edges(&[("A", "B", 10.0), ("C", "B", 10.0)]);
        let result = PageRank::compute(&graph, 0.85, 100, 1e-6);
        let total: f64 = result.scores.iter().sum();
        assert!((total - 1.0).abs() < 1e-9);
        let b = graph.index_of("B").unwrap();
        assert!(result.scores.iter().all(|&s| s <= result.scores[b]));
    }

    #[test]
    fn test_pagerank_iteration_cap() {
        let graph = create_cycle_graph();
        let result = PageRank::compute(&graph, 0.85, 0, 1e-6);
        assert!(!result.converged);
        assert_eq!(result.iterations, Some(0));
    }

    #[test]
    fn test_betweenness_line_graph() {
        // A -> B -> C -> D
        let graph = graph_from_edges(&[("A", "B", 1.0), ("B", "C", 1.0), ("C", "D", 1.0)]);
        let result = BetweennessCentrality::compute(&graph, false);

        // B lies on A->C and A->D, C lies on A->D and B->D.
        assert_eq!(result.scores, vec![0.0, 2.0, 2.0, 0.0]);

        let normalized = BetweennessCentrality::compute(&graph, true);
        assert!((normalized.scores[1] - 2.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_betweenness_respects_weights() {
        // A -> D directly with 5 transactions, or A -> B -> D with 1 + 1.
        let graph = graph_from_edges(&[
            ("A", "D", 1.0),
            ("A", "D", 1.0),
            ("A", "D", 1.0),
            ("A", "D", 1.0),
            ("A", "D", 1.0),
            ("A", "B", 1.0),
            ("B", "D", 1.0),
        ]);
        let result = BetweennessCentrality::compute(&graph, false);
        let b = graph.index_of("B").unwrap();
        assert_eq!(result.scores[b], 1.0);
    }

    #[test]
    fn test_betweenness_split_paths() {
        // Two equal-length routes from A to D.
        let graph = graph_from_edges(&[
            ("A", "B", 1.0),
            ("A", "C", 1.0),
            ("B", "D", 1.0),
            ("C", "D", 1.0),
        ]);
        let result = BetweennessCentrality::compute(&graph, false);
        assert_eq!(result.scores, vec![0.0, 0.5, 0.5, 0.0]);
    }

    #[test]
    fn test_betweenness_small_graph_not_normalized() {
        let graph = graph_from_edges(&[("A", "B", 1.0), ("B", "A", 1.0)]);
        let result = BetweennessCentrality::compute(&graph, true);
        assert_eq!(result.scores, vec![0.0, 0.0]);
    }

    #[test]
    fn test_empty_graph() {
        let graph = TransactionGraph::empty();
        assert!(BetweennessCentrality::compute(&graph, true).scores.is_empty());
        assert!(PageRank::compute(&graph, 0.85, 100, 1e-6).scores.is_empty());
    }

    #[tokio::test]
    async fn test_pagerank_batch_execute() {
        let kernel = PageRank::new();
        let output = kernel
            .execute(CentralityInput {
                graph: Arc::new(create_cycle_graph()),
                config: GraphConfig::default(),
            })
            .await
            .unwrap();
        assert_eq!(output.result.scores.len(), 4);
        assert!(output.result.converged);
    }
}
