//! Anomaly detection kernels.
//!
//! The anomaly scorer engineers account features, standardizes them and
//! hands the matrix to an [`OutlierScorer`]. The default scorer is a seeded
//! isolation forest whose trees are grown in parallel.

use crate::features::{AccountFeatures, StandardScaler};
use crate::messages::{AnomalyInput, AnomalyOutput};
use crate::types::{AnomalyResult, DataMatrix};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use ringwatch_core::{
    config::AnomalyConfig,
    domain::Domain,
    error::{AnalysisError, Result},
    kernel::KernelMetadata,
    traits::{AnalysisKernel, BatchKernel},
    transaction::Transaction,
};
use ringwatch_graph::types::TransactionGraph;
use std::fmt;
use std::time::Instant;

/// Euler-Mascheroni constant.
const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

// ============================================================================
// Outlier Scorer Capability
// ============================================================================

/// Per-row output of an outlier scorer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutlierScores {
    /// Score in [0, 1] per row, 1 = most anomalous.
    pub scores: Vec<f64>,
    /// Rows inside the expected contamination fraction.
    pub is_outlier: Vec<bool>,
}

/// An unsupervised outlier model over a feature matrix.
pub trait OutlierScorer: Send + Sync + fmt::Debug {
    /// Score every row of `features`.
    fn score(&self, features: &DataMatrix) -> Result<OutlierScores>;
}

/// Rescale raw scores where lower means more anomalous onto [0, 1] with
/// 1 = most anomalous. Identical scores all map to 0.
#[must_use]
pub fn normalize_inverted(raw: &[f64]) -> Vec<f64> {
    let min = raw.iter().copied().fold(f64::INFINITY, f64::min);
    let max = raw.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = max - min;
    if raw.is_empty() || span == 0.0 || !span.is_finite() {
        return vec![0.0; raw.len()];
    }
    raw.iter().map(|&s| (max - s) / span).collect()
}

/// Linear-interpolated percentile, `q` in [0, 1].
fn percentile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

// ============================================================================
// Isolation Tree
// ============================================================================

#[derive(Debug, Clone)]
enum INode {
    Internal {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        size: usize,
    },
}

/// Isolation tree stored as a node arena; the root is node 0.
#[derive(Debug, Clone)]
struct ITree {
    nodes: Vec<INode>,
}

impl ITree {
    fn build(data: &DataMatrix, rows: &mut [usize], max_depth: usize, rng: &mut StdRng) -> Self {
        let mut nodes = Vec::new();
        Self::build_node(data, rows, 0, max_depth, rng, &mut nodes);
        Self { nodes }
    }

    fn build_node(
        data: &DataMatrix,
        rows: &mut [usize],
        depth: usize,
        max_depth: usize,
        rng: &mut StdRng,
        nodes: &mut Vec<INode>,
    ) -> usize {
        let id = nodes.len();
        nodes.push(INode::Leaf { size: rows.len() });
        if rows.len() <= 1 || depth >= max_depth {
            return id;
        }

        // Try features in random order until one is not constant here.
        let mut features: Vec<usize> = (0..data.n_features).collect();
        features.shuffle(rng);

        for feature in features {
            let (min, max) = rows.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &r| {
                let x = data.get(r, feature);
                (lo.min(x), hi.max(x))
            });
            if max <= min {
                continue;
            }

            let threshold = rng.random_range(min..max);
            let mut mid = 0;
            for i in 0..rows.len() {
                if data.get(rows[i], feature) <= threshold {
                    rows.swap(i, mid);
                    mid += 1;
                }
            }

            let (left_rows, right_rows) = rows.split_at_mut(mid);
            let left = Self::build_node(data, left_rows, depth + 1, max_depth, rng, nodes);
            let right = Self::build_node(data, right_rows, depth + 1, max_depth, rng, nodes);
            nodes[id] = INode::Internal {
                feature,
                threshold,
                left,
                right,
            };
            return id;
        }

        id
    }

    fn path_length(&self, point: &[f64]) -> f64 {
        let mut node = 0;
        let mut depth = 0usize;
        loop {
            match &self.nodes[node] {
                INode::Leaf { size } => return depth as f64 + average_path_length(*size),
                INode::Internal {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if point[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                    depth += 1;
                }
            }
        }
    }
}

/// Average path length of an unsuccessful BST search over `n` points.
fn average_path_length(n: usize) -> f64 {
    if n <= 1 {
        0.0
    } else if n == 2 {
        1.0
    } else {
        let n_f = n as f64;
        2.0 * ((n_f - 1.0).ln() + EULER_GAMMA) - 2.0 * (n_f - 1.0) / n_f
    }
}

// ============================================================================
// Isolation Forest
// ============================================================================

/// Seeded isolation forest.
///
/// Tree `i` draws its subsample and splits from its own `StdRng` seeded
/// from the base seed and `i`, so the fitted forest does not depend on how
/// rayon schedules the trees.
#[derive(Debug, Clone, PartialEq)]
pub struct IsolationForest {
    /// Number of trees.
    pub n_trees: usize,
    /// Subsample size per tree (capped by the row count).
    pub max_samples: usize,
    /// Expected outlier fraction.
    pub contamination: f64,
    /// Base seed.
    pub seed: u64,
}

impl Default for IsolationForest {
    fn default() -> Self {
        Self::from_config(&AnomalyConfig::default())
    }
}

/// Raw isolation forest scores with the contamination cut-off.
#[derive(Debug, Clone, Default)]
pub struct ForestScores {
    /// Negated anomaly score per row; lower is more anomalous.
    pub raw: Vec<f64>,
    /// Rows with a raw score below this value are outliers.
    pub offset: f64,
}

impl IsolationForest {
    /// Create a forest from configuration.
    #[must_use]
    pub fn from_config(config: &AnomalyConfig) -> Self {
        Self {
            n_trees: config.n_trees,
            max_samples: config.max_samples,
            contamination: config.contamination,
            seed: config.seed,
        }
    }

    fn tree_seed(&self, tree: usize) -> u64 {
        self.seed ^ (tree as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
    }

    /// Fit on `data` and score its rows.
    pub fn fit_score(&self, data: &DataMatrix) -> Result<ForestScores> {
        if self.n_trees == 0 || self.max_samples == 0 {
            return Err(AnalysisError::config("isolation forest needs trees and samples"));
        }
        if !(self.contamination > 0.0 && self.contamination <= 0.5) {
            return Err(AnalysisError::config(format!(
                "contamination {} outside (0, 0.5]",
                self.contamination
            )));
        }

        let n = data.n_samples;
        let sample_size = self.max_samples.min(n);
        if sample_size <= 1 {
            return Ok(ForestScores {
                raw: vec![-1.0; n],
                offset: -1.0,
            });
        }
        let max_depth = (sample_size as f64).log2().ceil() as usize;

        let trees: Vec<ITree> = (0..self.n_trees)
            .into_par_iter()
            .map(|t| {
                let mut rng = StdRng::seed_from_u64(self.tree_seed(t));
                let mut rows = rand::seq::index::sample(&mut rng, n, sample_size).into_vec();
                ITree::build(data, &mut rows, max_depth, &mut rng)
            })
            .collect();

        let c = average_path_length(sample_size);
        let raw: Vec<f64> = (0..n)
            .into_par_iter()
            .map(|r| {
                let point = data.row(r);
                let mean_path =
                    trees.iter().map(|t| t.path_length(point)).sum::<f64>() / trees.len() as f64;
                -(2.0f64).powf(-mean_path / c)
            })
            .collect();

        let offset = percentile(&raw, self.contamination);
        Ok(ForestScores { raw, offset })
    }
}

impl OutlierScorer for IsolationForest {
    fn score(&self, features: &DataMatrix) -> Result<OutlierScores> {
        let forest = self.fit_score(features)?;
        Ok(OutlierScores {
            scores: normalize_inverted(&forest.raw),
            is_outlier: forest.raw.iter().map(|&s| s < forest.offset).collect(),
        })
    }
}

// ============================================================================
// Anomaly Scorer Kernel
// ============================================================================

/// Anomaly scorer kernel.
///
/// Features per account: outgoing count/mean/std/sum, incoming
/// count/mean/std/sum, `(in_sum + 1) / (out_sum + 1)` and degree.
#[derive(Debug, Clone)]
pub struct AnomalyScorer {
    metadata: KernelMetadata,
}

impl Default for AnomalyScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl AnomalyScorer {
    /// Create a new anomaly scorer kernel.
    #[must_use]
    pub fn new() -> Self {
        Self {
            metadata: KernelMetadata::batch("ml/anomaly-scorer", Domain::StatisticalML)
                .with_description("Standardized account features scored by isolation forest")
                .with_throughput(10_000)
                .with_latency_us(100.0),
        }
    }

    /// Score accounts with the configured isolation forest.
    pub fn compute(
        transactions: &[Transaction],
        graph: &TransactionGraph,
        config: &AnomalyConfig,
    ) -> Result<AnomalyResult> {
        Self::compute_with(&IsolationForest::from_config(config), transactions, graph)
    }

    /// Score accounts with any outlier scorer.
    pub fn compute_with(
        scorer: &dyn OutlierScorer,
        transactions: &[Transaction],
        graph: &TransactionGraph,
    ) -> Result<AnomalyResult> {
        if graph.is_empty() {
            return Ok(AnomalyResult::default());
        }

        let features = StandardScaler::fit_transform(&AccountFeatures::compute(transactions, graph));
        let scored = scorer.score(&features)?;
        if scored.scores.len() != graph.node_count() {
            return Err(AnalysisError::computation(format!(
                "outlier scorer returned {} scores for {} accounts",
                scored.scores.len(),
                graph.node_count()
            )));
        }

        let mut result = AnomalyResult::default();
        for (v, account) in graph.accounts().iter().enumerate() {
            let score = scored.scores[v];
            // Anything not strictly positive, including -0.0 and NaN, becomes +0.0.
            let score = if score > 0.0 { score.min(1.0) } else { 0.0 };
            result.scores.insert(account.clone(), score);
            if scored.is_outlier.get(v).copied().unwrap_or(false) {
                result.outliers.insert(account.clone());
            }
        }

        tracing::debug!(
            accounts = result.scores.len(),
            outliers = result.outliers.len(),
            "Anomaly scoring complete"
        );
        Ok(result)
    }
}

impl AnalysisKernel for AnomalyScorer {
    fn metadata(&self) -> &KernelMetadata {
        &self.metadata
    }
}

#[async_trait]
impl BatchKernel<AnomalyInput, AnomalyOutput> for AnomalyScorer {
    async fn execute(&self, input: AnomalyInput) -> Result<AnomalyOutput> {
        let start = Instant::now();
        let result = Self::compute(&input.transactions, &input.graph, &input.config)?;
        Ok(AnomalyOutput {
            result,
            compute_time_us: start.elapsed().as_micros() as u64,
        })
    }
}
