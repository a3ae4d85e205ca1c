//! Community detection kernels.
//!
//! This module provides algorithms for detecting communities in the
//! undirected projection of the transaction graph:
//! - Louvain algorithm (multi-level modularity optimization)
//! - Modularity score calculation
//!
//! Edge direction and transaction weights are discarded: every connected
//! account pair contributes one unit edge.

use crate::messages::{CommunityInput, CommunityOutput};
use crate::types::{CommunityResult, TransactionGraph};
use async_trait::async_trait;
use ringwatch_core::{
    config::GraphConfig, domain::Domain, error::Result, kernel::KernelMetadata,
    traits::AnalysisKernel, traits::BatchKernel,
};
use std::collections::BTreeMap;
use std::time::Instant;

// ============================================================================
// Weighted undirected graph used across Louvain levels
// ============================================================================

/// Undirected weighted graph. Neighbour lists exclude self-loops, which
/// are kept separately.
#[derive(Debug, Clone)]
struct LevelGraph {
    neighbors: Vec<Vec<(usize, f64)>>,
    self_loops: Vec<f64>,
}

impl LevelGraph {
    /// Undirected unit-weight projection of the transaction graph.
    fn projection(graph: &TransactionGraph) -> Self {
        let n = graph.node_count();
        let mut pairs: Vec<BTreeMap<usize, f64>> = vec![BTreeMap::new(); n];
        let mut self_loops = vec![0.0; n];

        for edge in graph.edges() {
            let (u, v) = (edge.source, edge.target);
            if u == v {
                self_loops[u] = 1.0;
            } else {
                pairs[u].insert(v, 1.0);
                pairs[v].insert(u, 1.0);
            }
        }

        Self {
            neighbors: pairs.into_iter().map(|m| m.into_iter().collect()).collect(),
            self_loops,
        }
    }

    fn len(&self) -> usize {
        self.neighbors.len()
    }

    /// Weighted degree; a self-loop counts twice.
    fn degree(&self, node: usize) -> f64 {
        self.neighbors[node].iter().map(|(_, w)| w).sum::<f64>() + 2.0 * self.self_loops[node]
    }

    /// Total edge weight, each undirected edge and self-loop counted once.
    fn total_weight(&self) -> f64 {
        let doubled: f64 = self
            .neighbors
            .iter()
            .flat_map(|adj| adj.iter().map(|(_, w)| w))
            .sum();
        doubled / 2.0 + self.self_loops.iter().sum::<f64>()
    }

    /// Collapse each community into a single node.
    fn contract(&self, communities: &[usize], num_communities: usize) -> Self {
        let mut pairs: Vec<BTreeMap<usize, f64>> = vec![BTreeMap::new(); num_communities];
        let mut self_loops = vec![0.0; num_communities];

        for u in 0..self.len() {
            let cu = communities[u];
            self_loops[cu] += self.self_loops[u];
            for &(v, w) in &self.neighbors[u] {
                // Each undirected edge is seen from both ends.
                if v < u {
                    continue;
                }
                let cv = communities[v];
                if cu == cv {
                    self_loops[cu] += w;
                } else {
                    *pairs[cu].entry(cv).or_insert(0.0) += w;
                    *pairs[cv].entry(cu).or_insert(0.0) += w;
                }
            }
        }

        Self {
            neighbors: pairs.into_iter().map(|m| m.into_iter().collect()).collect(),
            self_loops,
        }
    }
}

// ============================================================================
// Modularity Score Kernel
// ============================================================================

/// Modularity score kernel.
///
/// Q = Σ_c [ L_c / m − (d_c / 2m)² ] where L_c is the edge weight inside
/// community c and d_c the summed degree of its members.
#[derive(Debug, Clone)]
pub struct ModularityScore {
    metadata: KernelMetadata,
}

impl ModularityScore {
    /// Create a new modularity score kernel.
    #[must_use]
    pub fn new() -> Self {
        Self {
            metadata: KernelMetadata::batch("graph/modularity-score", Domain::GraphAnalytics)
                .with_description("Modularity of a partition of the undirected projection")
                .with_throughput(100_000)
                .with_latency_us(10.0),
        }
    }

    /// Compute modularity of `communities` over the undirected projection.
    pub fn compute(graph: &TransactionGraph, communities: &[usize]) -> f64 {
        Self::level_modularity(&LevelGraph::projection(graph), communities)
    }

    fn level_modularity(graph: &LevelGraph, communities: &[usize]) -> f64 {
        let m = graph.total_weight();
        if m == 0.0 {
            return 0.0;
        }

        let k = communities.iter().copied().max().map_or(0, |c| c + 1);
        let mut internal = vec![0.0f64; k];
        let mut degree = vec![0.0f64; k];

        for u in 0..graph.len() {
            let cu = communities[u];
            degree[cu] += graph.degree(u);
            internal[cu] += graph.self_loops[u];
            for &(v, w) in &graph.neighbors[u] {
                if v > u && communities[v] == cu {
                    internal[cu] += w;
                }
            }
        }

        internal
            .iter()
            .zip(&degree)
            .map(|(l, d)| l / m - (d / (2.0 * m)).powi(2))
            .sum()
    }
}

impl Default for ModularityScore {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisKernel for ModularityScore {
    fn metadata(&self) -> &KernelMetadata {
        &self.metadata
    }
}

// ============================================================================
// Louvain Community Detection Kernel
// ============================================================================

/// Louvain community detection kernel.
///
/// Multi-level modularity optimization using greedy local moves. Nodes are
/// visited in ascending index (account id) order, candidate communities are
/// compared in ascending id, and only a strictly larger gain replaces the
/// current best, so ties resolve to the lowest community id and the result
/// is reproducible.
#[derive(Debug, Clone)]
pub struct LouvainCommunity {
    metadata: KernelMetadata,
}

impl LouvainCommunity {
    /// Create a new Louvain community detection kernel.
    #[must_use]
    pub fn new() -> Self {
        Self {
            metadata: KernelMetadata::batch("graph/louvain-community", Domain::GraphAnalytics)
                .with_description("Louvain community detection (modularity optimization)")
                .with_throughput(10_000)
                .with_latency_us(100.0),
        }
    }

    /// Run Louvain on the undirected projection of `graph`.
    ///
    /// # Arguments
    /// * `graph` - Transaction graph
    /// * `max_passes` - Maximum local-moving passes per level
    /// * `max_levels` - Maximum contraction levels
    /// * `min_modularity_gain` - Stop when a level improves modularity by no more than this
    pub fn compute(
        graph: &TransactionGraph,
        max_passes: usize,
        max_levels: usize,
        min_modularity_gain: f64,
    ) -> CommunityResult {
        let n = graph.node_count();
        if n == 0 {
            return CommunityResult::default();
        }

        let projection = LevelGraph::projection(graph);
        let m = projection.total_weight();
        if m == 0.0 {
            return CommunityResult {
                assignments: (0..n).collect(),
                num_communities: n,
                modularity: 0.0,
                levels: 0,
            };
        }

        // Base graph node -> node of the current level graph.
        let mut assignment: Vec<usize> = (0..n).collect();
        let mut level_graph = projection.clone();
        let identity: Vec<usize> = (0..n).collect();
        let mut modularity = ModularityScore::level_modularity(&level_graph, &identity);
        let mut levels = 0;

        while levels < max_levels {
            let (communities, num_communities, moved) =
                Self::one_level(&level_graph, m, max_passes);
            levels += 1;

            for a in &mut assignment {
                *a = communities[*a];
            }

            if !moved {
                break;
            }

            let new_modularity = ModularityScore::level_modularity(&level_graph, &communities);
            if new_modularity - modularity <= min_modularity_gain {
                break;
            }
            modularity = new_modularity;
            level_graph = level_graph.contract(&communities, num_communities);
        }

        let num_communities = renumber_by_first_appearance(&mut assignment);
        let modularity = ModularityScore::level_modularity(&projection, &assignment);

        tracing::debug!(
            nodes = n,
            communities = num_communities,
            levels,
            modularity,
            "Louvain finished"
        );

        CommunityResult {
            assignments: assignment,
            num_communities,
            modularity,
            levels,
        }
    }

    /// One local-moving phase. Returns the community of each level node
    /// (ids contiguous, ordered by their previous label), the community
    /// count, and whether any node moved.
    fn one_level(graph: &LevelGraph, m: f64, max_passes: usize) -> (Vec<usize>, usize, bool) {
        let n = graph.len();
        let mut node2com: Vec<usize> = (0..n).collect();
        let degrees: Vec<f64> = (0..n).map(|u| graph.degree(u)).collect();
        let mut stot = degrees.clone();
        let two_m_sq = 2.0 * m * m;

        let mut moved = false;
        let mut passes = 0;
        let mut nb_moves = 1;

        while nb_moves > 0 && passes < max_passes {
            nb_moves = 0;
            passes += 1;

            for u in 0..n {
                let current = node2com[u];
                let degree = degrees[u];

                // Weight from u to each neighbouring community, ascending id.
                let mut weights2com: BTreeMap<usize, f64> = BTreeMap::new();
                for &(v, w) in &graph.neighbors[u] {
                    *weights2com.entry(node2com[v]).or_insert(0.0) += w;
                }

                stot[current] -= degree;
                let remove_cost = -weights2com.get(&current).copied().unwrap_or(0.0) / m
                    + (stot[current] * degree) / two_m_sq;

                let mut best_com = current;
                let mut best_gain = 0.0;
                for (&com, &wt) in &weights2com {
                    let gain = remove_cost + wt / m - (stot[com] * degree) / two_m_sq;
                    if gain > best_gain {
                        best_gain = gain;
                        best_com = com;
                    }
                }
                stot[best_com] += degree;

                if best_com != current {
                    node2com[u] = best_com;
                    nb_moves += 1;
                    moved = true;
                }
            }
        }

        // Contiguous ids, ordered by previous label.
        let mut remap = vec![usize::MAX; n];
        let mut labels: Vec<usize> = node2com.clone();
        labels.sort_unstable();
        labels.dedup();
        for (new_id, &label) in labels.iter().enumerate() {
            remap[label] = new_id;
        }
        let communities: Vec<usize> = node2com.iter().map(|&c| remap[c]).collect();

        (communities, labels.len(), moved)
    }
}

/// Renumber community ids to `0..k` in order of first appearance.
fn renumber_by_first_appearance(assignments: &mut [usize]) -> usize {
    let mut map: BTreeMap<usize, usize> = BTreeMap::new();
    for c in assignments.iter_mut() {
        let next = map.len();
        *c = *map.entry(*c).or_insert(next);
    }
    map.len()
}

impl Default for LouvainCommunity {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisKernel for LouvainCommunity {
    fn metadata(&self) -> &KernelMetadata {
        &self.metadata
    }
}

#[async_trait]
impl BatchKernel<CommunityInput, CommunityOutput> for LouvainCommunity {
    async fn execute(&self, input: CommunityInput) -> Result<CommunityOutput> {
        let start = Instant::now();
        let config: &GraphConfig = &input.config;
        let result = Self::compute(
            &input.graph,
            config.louvain_max_passes,
            config.louvain_max_levels,
            config.louvain_min_gain,
        );
        let compute_time_us = start.elapsed().as_micros() as u64;

        Ok(CommunityOutput {
            result,
            compute_time_us,
        })
    }
}
