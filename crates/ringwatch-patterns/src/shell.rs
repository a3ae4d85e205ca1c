//! Layered shell chain detection kernel.
//!
//! Finds laundering chains that move money through low-retention
//! pass-through accounts within a short time window.

use crate::messages::{DetectionOutput, ShellInput};
use async_trait::async_trait;
use hashbrown::HashSet;
use rayon::prelude::*;
use ringwatch_core::{
    config::ShellConfig,
    domain::Domain,
    error::{AnalysisError, Result},
    kernel::KernelMetadata,
    ring::{PatternType, Ring, RingIdAllocator, SHELL_RING_PREFIX},
    traits::{AnalysisKernel, BatchKernel},
};
use ringwatch_graph::types::TransactionGraph;
use std::time::Instant;

/// Path search output for one source account.
#[derive(Debug, Default)]
struct SourcePaths {
    paths: Vec<Vec<usize>>,
    truncated: bool,
}

/// Layered shell detection kernel.
///
/// 1. An account that both receives and sends is a pass-through when
///    `|received - sent| / max(received, 1) < max_retention`.
/// 2. Simple paths of `min_hops..=max_hops` edges whose intermediates are
///    all pass-throughs are enumerated depth-first from every source.
/// 3. Each hop is dated by the earliest transaction of its edge; hop dates
///    must be non-decreasing and no later than `window_secs` after the
///    first hop.
/// 4. Surviving paths are sorted longest first and kept greedily when they
///    share no account with an already kept path.
#[derive(Debug, Clone)]
pub struct ShellDetection {
    metadata: KernelMetadata,
}

impl Default for ShellDetection {
    fn default() -> Self {
        Self::new()
    }
}

impl ShellDetection {
    /// Create a new shell detection kernel.
    #[must_use]
    pub fn new() -> Self {
        Self {
            metadata: KernelMetadata::batch("compliance/shell-detection", Domain::Compliance)
                .with_description("Multi-hop layering through pass-through accounts")
                .with_throughput(10_000)
                .with_latency_us(1_000.0),
        }
    }

    /// Pass-through flag per node.
    pub fn pass_through(graph: &TransactionGraph, max_retention: f64) -> Vec<bool> {
        (0..graph.node_count())
            .map(|v| {
                let flow = graph.flow(v);
                if flow.in_count == 0 || flow.out_count == 0 {
                    return false;
                }
                let retention = (flow.in_amount - flow.out_amount).abs() / flow.in_amount.max(1.0);
                retention < max_retention
            })
            .collect()
    }

    /// Detect shell rings.
    ///
    /// Fails with an invariant violation if the search ever yields a path
    /// longer than `max_hops`.
    pub fn compute(graph: &TransactionGraph, config: &ShellConfig) -> Result<Vec<Ring>> {
        let n = graph.node_count();
        if n == 0 {
            return Ok(Vec::new());
        }

        let mules = Self::pass_through(graph, config.max_retention);

        let per_source: Vec<SourcePaths> = (0..n)
            .into_par_iter()
            .map(|s| Self::paths_from(graph, s, &mules, config))
            .collect();

        let truncated = per_source.iter().filter(|p| p.truncated).count();
        if truncated > 0 {
            tracing::warn!(
                sources = truncated,
                budget = config.max_paths_per_source,
                "Shell path budget reached, enumeration truncated"
            );
        }

        let mut paths: Vec<Vec<usize>> = per_source.into_iter().flat_map(|p| p.paths).collect();
        if let Some(bad) = paths.iter().find(|p| p.len() - 1 > config.max_hops) {
            return Err(AnalysisError::invariant(format!(
                "shell path of {} hops exceeds bound of {}",
                bad.len() - 1,
                config.max_hops
            )));
        }
        let candidates = paths.len();

        // Longest first; stable, so equal lengths keep enumeration order.
        paths.sort_by(|a, b| b.len().cmp(&a.len()));

        let mut claimed: HashSet<usize> = HashSet::new();
        let mut ids = RingIdAllocator::new(SHELL_RING_PREFIX);
        let mut rings = Vec::new();

        for path in paths {
            if path.iter().any(|v| claimed.contains(v)) {
                continue;
            }
            claimed.extend(path.iter().copied());
            let depth = path.len() - 1;
            let members = path.iter().map(|&v| graph.account(v).to_string()).collect();
            rings.push(
                Ring::new(ids.next_id(), PatternType::LayeredShell, members)
                    .with_layering_depth(depth)
                    .with_risk_score(config.base_risk),
            );
        }

        tracing::debug!(
            pass_through = mules.iter().filter(|&&m| m).count(),
            candidates,
            rings = rings.len(),
            "Shell detection complete"
        );
        Ok(rings)
    }

    /// Valid chains starting at `s`, grouped by target ascending and in DFS
    /// order within a target.
    ///
    /// The temporal and pass-through conditions hold for every prefix of a
    /// valid chain, so branches are pruned as soon as either fails.
    fn paths_from(
        graph: &TransactionGraph,
        s: usize,
        mules: &[bool],
        config: &ShellConfig,
    ) -> SourcePaths {
        let window = config.window();
        let mut out = SourcePaths::default();

        let mut path = vec![s];
        // Earliest timestamp of each hop taken so far.
        let mut hop_times = Vec::with_capacity(config.max_hops);
        // (node, next out-edge position)
        let mut stack: Vec<(usize, usize)> = vec![(s, 0)];

        'search: while let Some(frame) = stack.last_mut() {
            let v = frame.0;
            let edges = graph.out_edges(v);
            if frame.1 == edges.len() {
                stack.pop();
                path.pop();
                hop_times.pop();
                continue;
            }
            let edge = &edges[frame.1];
            frame.1 += 1;

            let w = edge.target;
            if path.contains(&w) {
                continue;
            }
            let ts = edge.first_timestamp;
            if let Some(&last) = hop_times.last() {
                if ts < last || ts - hop_times[0] > window {
                    continue;
                }
            }

            path.push(w);
            hop_times.push(ts);
            let hops = path.len() - 1;

            if hops >= config.min_hops {
                out.paths.push(path.clone());
                if out.paths.len() >= config.max_paths_per_source {
                    out.truncated = true;
                    break 'search;
                }
            }

            if hops < config.max_hops && mules[w] {
                stack.push((w, 0));
            } else {
                path.pop();
                hop_times.pop();
            }
        }

        out.paths.sort_by_key(|p| p[p.len() - 1]);
        out
    }
}

impl AnalysisKernel for ShellDetection {
    fn metadata(&self) -> &KernelMetadata {
        &self.metadata
    }
}

#[async_trait]
impl BatchKernel<ShellInput, DetectionOutput> for ShellDetection {
    async fn execute(&self, input: ShellInput) -> Result<DetectionOutput> {
        let start = Instant::now();
        let rings = Self::compute(&input.graph, &input.config)?;
        Ok(DetectionOutput {
            rings,
            compute_time_us: start.elapsed().as_micros() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use ringwatch_core::transaction::Transaction;
    use std::sync::Arc;

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 3, 0, 0, 0).unwrap()
    }

    fn tx(id: &str, from: &str, to: &str, amount: f64, hours: i64) -> Transaction {
        Transaction::new(id, from, to, amount, base() + Duration::hours(hours))
    }

    /// A -> B -> C -> D, B and C keep ~5%, hops `gap` hours apart.
    fn chain(gap: i64) -> Vec<Transaction> {
        vec![
            tx("T1", "A", "B", 10_000.0, 0),
            tx("T2", "B", "C", 9_500.0, gap),
            tx("T3", "C", "D", 9_000.0, 2 * gap),
        ]
    }

    fn detect(txs: &[Transaction]) -> Vec<Ring> {
        let graph = TransactionGraph::from_transactions(txs);
        ShellDetection::compute(&graph, &ShellConfig::default()).unwrap()
    }

    #[test]
    fn test_shell_metadata() {
        let kernel = ShellDetection::new();
        assert_eq!(kernel.metadata().id, "compliance/shell-detection");
    }

    #[test]
    fn test_pass_through_classification() {
        let graph = TransactionGraph::from_transactions(&chain(1));
        let mules = ShellDetection::pass_through(&graph, 0.15);
        // A only sends, D only receives.
        assert_eq!(mules, vec![false, true, true, false]);

        let hoarder = TransactionGraph::from_transactions(&[
            tx("T1", "A", "B", 1000.0, 0),
            tx("T2", "B", "C", 500.0, 1),
        ]);
        assert_eq!(ShellDetection::pass_through(&hoarder, 0.15), vec![false, false, false]);
    }

    #[test]
    fn test_chain_within_window() {
        let rings = detect(&chain(5));

        assert_eq!(rings.len(), 1);
        let ring = &rings[0];
        assert_eq!(ring.ring_id, "RING_SHELL_001");
        assert_eq!(ring.pattern_type, PatternType::LayeredShell);
        assert_eq!(ring.member_accounts, vec!["A", "B", "C", "D"]);
        assert_eq!(ring.layering_depth, Some(3));
        assert_eq!(ring.risk_score, Some(0.85));
    }

    #[test]
    fn test_chain_exceeding_window() {
        assert!(detect(&chain(25)).is_empty());
    }

    #[test]
    fn test_out_of_order_hops() {
        let txs = vec![
            tx("T1", "A", "B", 10_000.0, 10),
            tx("T2", "B", "C", 9_500.0, 5),
            tx("T3", "C", "D", 9_000.0, 12),
        ];
        assert!(detect(&txs).is_empty());
    }

    #[test]
    fn test_high_retention_breaks_chain() {
        let txs = vec![
            tx("T1", "A", "B", 10_000.0, 0),
            tx("T2", "B", "C", 5_000.0, 1),
            tx("T3", "C", "D", 4_900.0, 2),
        ];
        assert!(detect(&txs).is_empty());
    }

    #[test]
    fn test_longest_chain_wins_dedup() {
        // A -> B -> C -> D -> E; the 4-hop chain claims every account.
        let txs = vec![
            tx("T1", "A", "B", 10_000.0, 0),
            tx("T2", "B", "C", 9_800.0, 1),
            tx("T3", "C", "D", 9_600.0, 2),
            tx("T4", "D", "E", 9_400.0, 3),
        ];
        let rings = detect(&txs);

        assert_eq!(rings.len(), 1);
        assert_eq!(rings[0].member_accounts, vec!["A", "B", "C", "D", "E"]);
        assert_eq!(rings[0].layering_depth, Some(4));
    }

    #[test]
    fn test_disjoint_chains_numbered_in_order() {
        let mut txs = chain(1);
        txs.extend([
            tx("U1", "P", "Q", 2_000.0, 0),
            tx("U2", "Q", "R", 1_900.0, 1),
            tx("U3", "R", "S", 1_850.0, 2),
        ]);
        let rings = detect(&txs);

        assert_eq!(rings.len(), 2);
        assert_eq!(rings[0].ring_id, "RING_SHELL_001");
        assert_eq!(rings[0].member_accounts, vec!["A", "B", "C", "D"]);
        assert_eq!(rings[1].ring_id, "RING_SHELL_002");
        assert_eq!(rings[1].member_accounts, vec!["P", "Q", "R", "S"]);
    }

    #[test]
    fn test_path_budget_truncates() {
        // Fan out from A into many parallel pass-through chains.
        let mut txs = Vec::new();
        for i in 0..6 {
            let b = format!("B{i}");
            let c = format!("C{i}");
            let d = format!("D{i}");
            txs.push(tx(&format!("X{i}"), "A", &b, 1_000.0, 0));
            txs.push(tx(&format!("Y{i}"), &b, &c, 990.0, 1));
            txs.push(tx(&format!("Z{i}"), &c, &d, 980.0, 2));
        }
        let graph = TransactionGraph::from_transactions(&txs);
        let config = ShellConfig {
            max_paths_per_source: 2,
            ..ShellConfig::default()
        };
        let rings = ShellDetection::compute(&graph, &config).unwrap();
        // A's search stops after two chains; those chains claim A.
        assert_eq!(rings.len(), 1);
        assert_eq!(rings[0].member_accounts[0], "A");
    }

    #[test]
    fn test_empty_graph() {
        let rings = ShellDetection::compute(&TransactionGraph::empty(), &ShellConfig::default());
        assert!(rings.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_batch_execute() {
        let kernel = ShellDetection::new();
        let output = kernel
            .execute(ShellInput {
                graph: Arc::new(TransactionGraph::from_transactions(&chain(2))),
                config: ShellConfig::default(),
            })
            .await
            .unwrap();
        assert_eq!(output.rings.len(), 1);
    }
}
