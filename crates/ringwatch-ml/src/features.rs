//! Account feature engineering and standardization.

use crate::types::DataMatrix;
use ringwatch_core::{
    domain::Domain, kernel::KernelMetadata, traits::AnalysisKernel, transaction::Transaction,
};
use ringwatch_graph::types::TransactionGraph;
use serde::{Deserialize, Serialize};

/// Column names of the account feature matrix, in order.
pub const FEATURE_NAMES: [&str; 10] = [
    "out_count",
    "out_avg",
    "out_std",
    "out_sum",
    "in_count",
    "in_avg",
    "in_std",
    "in_sum",
    "in_out_ratio",
    "degree",
];

/// Running count, mean and variance (Welford).
#[derive(Debug, Clone, Copy, Default)]
struct OnlineStats {
    count: u64,
    mean: f64,
    m2: f64,
    sum: f64,
}

impl OnlineStats {
    fn update(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        let delta2 = value - self.mean;
        self.m2 += delta * delta2;
    }

    /// Sample standard deviation; 0 below two values.
    fn std_dev(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            (self.m2 / (self.count - 1) as f64).sqrt()
        }
    }
}

/// Account feature extraction kernel.
///
/// One row per graph account, in node-index order. Missing directions are
/// zero-filled and non-finite values are replaced with zero.
#[derive(Debug, Clone)]
pub struct AccountFeatures {
    metadata: KernelMetadata,
}

impl Default for AccountFeatures {
    fn default() -> Self {
        Self::new()
    }
}

impl AccountFeatures {
    /// Create a new feature extraction kernel.
    #[must_use]
    pub fn new() -> Self {
        Self {
            metadata: KernelMetadata::batch("ml/account-features", Domain::StatisticalML)
                .with_description("Per-account flow statistics and degree features")
                .with_throughput(1_000_000)
                .with_latency_us(10.0),
        }
    }

    /// Build the feature matrix.
    pub fn compute(transactions: &[Transaction], graph: &TransactionGraph) -> DataMatrix {
        let n = graph.node_count();
        let mut outgoing = vec![OnlineStats::default(); n];
        let mut incoming = vec![OnlineStats::default(); n];

        for tx in transactions {
            if let Some(u) = graph.index_of(&tx.sender_id) {
                outgoing[u].update(tx.amount);
            }
            if let Some(v) = graph.index_of(&tx.receiver_id) {
                incoming[v].update(tx.amount);
            }
        }

        let mut matrix = DataMatrix::zeros(n, FEATURE_NAMES.len());
        for v in 0..n {
            let out = &outgoing[v];
            let inc = &incoming[v];
            let row = [
                out.count as f64,
                out.mean,
                out.std_dev(),
                out.sum,
                inc.count as f64,
                inc.mean,
                inc.std_dev(),
                inc.sum,
                (inc.sum + 1.0) / (out.sum + 1.0),
                graph.degree(v) as f64,
            ];
            for (slot, value) in matrix.row_mut(v).iter_mut().zip(row) {
                *slot = if value.is_finite() { value } else { 0.0 };
            }
        }
        matrix
    }
}

impl AnalysisKernel for AccountFeatures {
    fn metadata(&self) -> &KernelMetadata {
        &self.metadata
    }
}

// ============================================================================
// Standard Scaler
// ============================================================================

/// Per-feature standardization to zero mean and unit variance.
///
/// Uses the population standard deviation. Constant features get a scale
/// of 1, so they standardize to 0.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StandardScaler {
    /// Column means.
    pub means: Vec<f64>,
    /// Column scales.
    pub scales: Vec<f64>,
}

impl StandardScaler {
    /// Fit column statistics.
    #[must_use]
    pub fn fit(matrix: &DataMatrix) -> Self {
        let n = matrix.n_samples.max(1) as f64;
        let mut means = Vec::with_capacity(matrix.n_features);
        let mut scales = Vec::with_capacity(matrix.n_features);

        for col in 0..matrix.n_features {
            let mean = matrix.column(col).sum::<f64>() / n;
            let var = matrix.column(col).map(|x| (x - mean).powi(2)).sum::<f64>() / n;
            let std = var.sqrt();
            means.push(mean);
            scales.push(if std > 0.0 && std.is_finite() { std } else { 1.0 });
        }

        Self { means, scales }
    }

    /// Standardize a matrix with the fitted statistics.
    #[must_use]
    pub fn transform(&self, matrix: &DataMatrix) -> DataMatrix {
        let mut out = matrix.clone();
        for r in 0..out.n_samples {
            for (c, x) in out.row_mut(r).iter_mut().enumerate() {
                *x = (*x - self.means[c]) / self.scales[c];
            }
        }
        out
    }

    /// Fit and transform in one step.
    #[must_use]
    pub fn fit_transform(matrix: &DataMatrix) -> DataMatrix {
        Self::fit(matrix).transform(matrix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn sample() -> (Vec<Transaction>, TransactionGraph) {
        let ts = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        let txs = vec![
            Transaction::new("T1", "A", "B", 100.0, ts),
            Transaction::new("T2", "A", "B", 300.0, ts),
            Transaction::new("T3", "A", "C", 200.0, ts),
            Transaction::new("T4", "B", "C", 50.0, ts),
        ];
        let graph = TransactionGraph::from_transactions(&txs);
        (txs, graph)
    }

    #[test]
    fn test_feature_rows() {
        let (txs, graph) = sample();
        let m = AccountFeatures::compute(&txs, &graph);
        assert_eq!(m.n_samples, 3);
        assert_eq!(m.n_features, FEATURE_NAMES.len());

        let a = m.row(graph.index_of("A").unwrap());
        assert_eq!(a[0], 3.0);
        assert!((a[1] - 200.0).abs() < 1e-9);
        assert!((a[2] - 100.0).abs() < 1e-9);
        assert_eq!(a[3], 600.0);
        assert_eq!(&a[4..8], &[0.0, 0.0, 0.0, 0.0]);
        assert!((a[8] - 1.0 / 601.0).abs() < 1e-12);
        assert_eq!(a[9], 2.0);

        // C only receives: out side zero-filled.
        let c = m.row(graph.index_of("C").unwrap());
        assert_eq!(&c[0..4], &[0.0, 0.0, 0.0, 0.0]);
        assert_eq!(c[4], 2.0);
        assert!((c[5] - 125.0).abs() < 1e-9);
        assert!((c[8] - 251.0).abs() < 1e-9);

        let b = m.row(graph.index_of("B").unwrap());
        assert_eq!(b[2], 0.0, "single outgoing transaction has no deviation");
    }

    #[test]
    fn test_standard_scaler() {
        let m = DataMatrix::from_rows(&[&[1.0, 5.0], &[3.0, 5.0]]);
        let scaler = StandardScaler::fit(&m);
        assert_eq!(scaler.means, vec![2.0, 5.0]);
        assert_eq!(scaler.scales, vec![1.0, 1.0]);

        let z = scaler.transform(&m);
        assert_eq!(z.row(0), &[-1.0, 0.0]);
        assert_eq!(z.row(1), &[1.0, 0.0]);
    }

    #[test]
    fn test_scaled_columns_have_unit_variance() {
        let (txs, graph) = sample();
        let z = StandardScaler::fit_transform(&AccountFeatures::compute(&txs, &graph));
        for col in 0..z.n_features {
            let mean = z.column(col).sum::<f64>() / z.n_samples as f64;
            let var = z.column(col).map(|x| (x - mean).powi(2)).sum::<f64>() / z.n_samples as f64;
            assert!(mean.abs() < 1e-9);
            assert!(var.abs() < 1e-9 || (var - 1.0).abs() < 1e-9, "column {} var {}", col, var);
        }
    }

    #[test]
    fn test_empty() {
        let graph = TransactionGraph::empty();
        let m = AccountFeatures::compute(&[], &graph);
        assert!(m.is_empty());
        let z = StandardScaler::fit_transform(&m);
        assert!(z.is_empty());
    }
}
