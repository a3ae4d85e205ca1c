//! Cycle detection kernel.
//!
//! Enumerates simple directed cycles of bounded length. Each cycle is
//! found exactly once, rooted at its lowest-indexed account: the search
//! from start `s` only visits accounts with index greater than `s`.

use crate::messages::{CycleInput, DetectionOutput};
use async_trait::async_trait;
use rayon::prelude::*;
use ringwatch_core::{
    config::CycleConfig,
    domain::Domain,
    error::Result,
    kernel::KernelMetadata,
    ring::{PatternType, Ring, RingIdAllocator, CYCLE_RING_PREFIX},
    traits::{AnalysisKernel, BatchKernel},
};
use ringwatch_graph::types::TransactionGraph;
use std::time::Instant;

/// Cycle detection kernel.
///
/// Rings are numbered `RING_001`, `RING_002`, ... in discovery order:
/// ascending start account, then depth-first over ascending successors.
/// Self-loops and reciprocal pairs never qualify with the default bounds.
#[derive(Debug, Clone)]
pub struct CycleDetection {
    metadata: KernelMetadata,
}

impl Default for CycleDetection {
    fn default() -> Self {
        Self::new()
    }
}

impl CycleDetection {
    /// Create a new cycle detection kernel.
    #[must_use]
    pub fn new() -> Self {
        Self {
            metadata: KernelMetadata::batch("compliance/cycle-detection", Domain::Compliance)
                .with_description("Simple directed cycles of length 3 to 5")
                .with_throughput(50_000)
                .with_latency_us(200.0),
        }
    }

    /// Detect cycle rings.
    pub fn compute(graph: &TransactionGraph, config: &CycleConfig) -> Vec<Ring> {
        let n = graph.node_count();
        if n == 0 || config.max_cycles == 0 {
            return Vec::new();
        }

        let per_start: Vec<Vec<Vec<usize>>> = (0..n)
            .into_par_iter()
            .map(|s| Self::cycles_from(graph, s, config))
            .collect();

        let found: usize = per_start.iter().map(Vec::len).sum();
        if found >= config.max_cycles {
            tracing::warn!(
                budget = config.max_cycles,
                "Cycle budget reached, enumeration truncated"
            );
        }

        let mut ids = RingIdAllocator::new(CYCLE_RING_PREFIX);
        let rings: Vec<Ring> = per_start
            .into_iter()
            .flatten()
            .take(config.max_cycles)
            .map(|cycle| {
                let members = cycle.iter().map(|&i| graph.account(i).to_string()).collect();
                Ring::new(
                    ids.next_id(),
                    PatternType::Cycle {
                        length: cycle.len(),
                    },
                    members,
                )
            })
            .collect();

        tracing::debug!(rings = rings.len(), "Cycle detection complete");
        rings
    }

    /// Cycles whose lowest-indexed member is `s`, in DFS order.
    fn cycles_from(graph: &TransactionGraph, s: usize, config: &CycleConfig) -> Vec<Vec<usize>> {
        let mut found = Vec::new();
        let mut path = vec![s];
        // (node, next out-edge position)
        let mut stack: Vec<(usize, usize)> = vec![(s, 0)];

        while let Some(frame) = stack.last_mut() {
            let out = graph.out_edges(frame.0);
            if frame.1 == out.len() {
                stack.pop();
                path.pop();
                continue;
            }
            let w = out[frame.1].target;
            frame.1 += 1;

            if w == s {
                if path.len() >= config.min_length {
                    found.push(path.clone());
                    if found.len() >= config.max_cycles {
                        break;
                    }
                }
            } else if w > s && path.len() < config.max_length && !path.contains(&w) {
                stack.push((w, 0));
                path.push(w);
            }
        }

        found
    }
}

impl AnalysisKernel for CycleDetection {
    fn metadata(&self) -> &KernelMetadata {
        &self.metadata
    }
}

#[async_trait]
impl BatchKernel<CycleInput, DetectionOutput> for CycleDetection {
    async fn execute(&self, input: CycleInput) -> Result<DetectionOutput> {
        let start = Instant::now();
        let rings = Self::compute(&input.graph, &input.config);
        Ok(DetectionOutput {
            rings,
            compute_time_us: start.elapsed().as_micros() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use ringwatch_core::transaction::Transaction;
    use std::collections::BTreeSet;
    use std::sync::Arc;

    fn graph_from_pairs(pairs: &[(&str, &str)]) -> TransactionGraph {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let txs: Vec<Transaction> = pairs
            .iter()
            .enumerate()
            .map(|(i, (a, b))| Transaction::new(format!("T{i}"), *a, *b, 100.0, ts))
            .collect();
        TransactionGraph::from_transactions(&txs)
    }

    fn member_set(ring: &Ring) -> BTreeSet<&str> {
        ring.member_accounts.iter().map(String::as_str).collect()
    }

    #[test]
    fn test_cycle_detection_metadata() {
        let kernel = CycleDetection::new();
        assert_eq!(kernel.metadata().id, "compliance/cycle-detection");
        assert_eq!(kernel.metadata().domain, Domain::Compliance);
    }

    #[test]
    fn test_single_triangle() {
        let graph = graph_from_pairs(&[("A", "B"), ("B", "C"), ("C", "A")]);
        let rings = CycleDetection::compute(&graph, &CycleConfig::default());

        assert_eq!(rings.len(), 1);
        assert_eq!(rings[0].ring_id, "RING_001");
        assert_eq!(rings[0].pattern_type.label(), "cycle_length_3");
        assert_eq!(member_set(&rings[0]), BTreeSet::from(["A", "B", "C"]));
    }

    #[test]
    fn test_acyclic_graph() {
        let graph = graph_from_pairs(&[("A", "B"), ("B", "C"), ("A", "C"), ("C", "D")]);
        assert!(CycleDetection::compute(&graph, &CycleConfig::default()).is_empty());
    }

    #[test]
    fn test_length_bounds() {
        // Reciprocal pair, self loop, and a 6-cycle: none qualify.
        let graph = graph_from_pairs(&[
            ("A", "B"),
            ("B", "A"),
            ("S", "S"),
            ("U1", "U2"),
            ("U2", "U3"),
            ("U3", "U4"),
            ("U4", "U5"),
            ("U5", "U6"),
            ("U6", "U1"),
        ]);
        assert!(CycleDetection::compute(&graph, &CycleConfig::default()).is_empty());
    }

    #[test]
    fn test_traversal_order_and_numbering() {
        // 4-cycle A->B->C->D->A and triangle X->Y->Z->X
        let graph = graph_from_pairs(&[
            ("A", "B"),
            ("B", "C"),
            ("C", "D"),
            ("D", "A"),
            ("X", "Y"),
            ("Y", "Z"),
            ("Z", "X"),
        ]);
        let rings = CycleDetection::compute(&graph, &CycleConfig::default());

        assert_eq!(rings.len(), 2);
        assert_eq!(rings[0].ring_id, "RING_001");
        assert_eq!(rings[0].member_accounts, vec!["A", "B", "C", "D"]);
        assert_eq!(rings[0].pattern_type, PatternType::Cycle { length: 4 });
        assert_eq!(rings[1].ring_id, "RING_002");
        assert_eq!(rings[1].member_accounts, vec!["X", "Y", "Z"]);
    }

    #[test]
    fn test_overlapping_cycles_reported_once_each() {
        // A->B->C->A and A->B->D->A share the edge A->B.
        let graph = graph_from_pairs(&[
            ("A", "B"),
            ("B", "C"),
            ("C", "A"),
            ("B", "D"),
            ("D", "A"),
        ]);
        let rings = CycleDetection::compute(&graph, &CycleConfig::default());
        assert_eq!(rings.len(), 2);
        let sets: BTreeSet<BTreeSet<&str>> = rings.iter().map(member_set).collect();
        assert!(sets.contains(&BTreeSet::from(["A", "B", "C"])));
        assert!(sets.contains(&BTreeSet::from(["A", "B", "D"])));
    }

    #[test]
    fn test_cycle_budget() {
        // Complete digraph on 5 nodes has far more than 3 qualifying cycles.
        let names = ["A", "B", "C", "D", "E"];
        let mut pairs = Vec::new();
        for a in names {
            for b in names {
                if a != b {
                    pairs.push((a, b));
                }
            }
        }
        let graph = graph_from_pairs(&pairs);
        let config = CycleConfig {
            max_cycles: 3,
            ..CycleConfig::default()
        };
        let rings = CycleDetection::compute(&graph, &config);
        assert_eq!(rings.len(), 3);
        assert_eq!(rings[2].ring_id, "RING_003");
    }

    #[tokio::test]
    async fn test_batch_execute() {
        let kernel = CycleDetection::new();
        let output = kernel
            .execute(CycleInput {
                graph: Arc::new(graph_from_pairs(&[("A", "B"), ("B", "C"), ("C", "A")])),
                config: CycleConfig::default(),
            })
            .await
            .unwrap();
        assert_eq!(output.rings.len(), 1);
    }
}
