//! Common ML types and data structures.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// ============================================================================
// Data Matrix
// ============================================================================

/// A dense matrix for ML data (row-major storage).
///
/// Each row represents a sample, each column represents a feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataMatrix {
    /// Flat storage of all values (row-major).
    pub data: Vec<f64>,
    /// Number of samples (rows).
    pub n_samples: usize,
    /// Number of features (columns).
    pub n_features: usize,
}

impl DataMatrix {
    /// Create a new data matrix from flat data.
    #[must_use]
    pub fn new(data: Vec<f64>, n_samples: usize, n_features: usize) -> Self {
        assert_eq!(data.len(), n_samples * n_features);
        Self {
            data,
            n_samples,
            n_features,
        }
    }

    /// Create a data matrix from row vectors.
    #[must_use]
    pub fn from_rows(rows: &[&[f64]]) -> Self {
        let n_samples = rows.len();
        let n_features = rows.first().map(|r| r.len()).unwrap_or(0);
        let mut data = Vec::with_capacity(n_samples * n_features);

        for row in rows {
            assert_eq!(row.len(), n_features, "All rows must have same length");
            data.extend_from_slice(row);
        }

        Self {
            data,
            n_samples,
            n_features,
        }
    }

    /// Create a zero matrix.
    #[must_use]
    pub fn zeros(n_samples: usize, n_features: usize) -> Self {
        Self {
            data: vec![0.0; n_samples * n_features],
            n_samples,
            n_features,
        }
    }

    /// Get a row (sample) as a slice.
    #[must_use]
    pub fn row(&self, idx: usize) -> &[f64] {
        let start = idx * self.n_features;
        &self.data[start..start + self.n_features]
    }

    /// Get a mutable row.
    pub fn row_mut(&mut self, idx: usize) -> &mut [f64] {
        let start = idx * self.n_features;
        let end = start + self.n_features;
        &mut self.data[start..end]
    }

    /// Get element at (row, col).
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.n_features + col]
    }

    /// Set element at (row, col).
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.data[row * self.n_features + col] = value;
    }

    /// Iterate over one column.
    pub fn column(&self, col: usize) -> impl Iterator<Item = f64> + '_ {
        (0..self.n_samples).map(move |r| self.get(r, col))
    }

    /// Returns true if there are no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.n_samples == 0
    }
}

// ============================================================================
// Anomaly Result
// ============================================================================

/// Per-account anomaly scores.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnomalyResult {
    /// Score in [0, 1] per account, 1 = most anomalous.
    pub scores: BTreeMap<String, f64>,
    /// Accounts inside the expected contamination fraction.
    pub outliers: BTreeSet<String>,
}

impl AnomalyResult {
    /// Score of an account, 0 when absent.
    #[must_use]
    pub fn score(&self, account: &str) -> f64 {
        self.scores.get(account).copied().unwrap_or(0.0)
    }

    /// Accounts scoring strictly above `threshold`.
    pub fn above(&self, threshold: f64) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.scores
            .iter()
            .filter(move |(_, &s)| s > threshold)
            .map(|(a, &s)| (a.as_str(), s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_matrix_access() {
        let mut m = DataMatrix::from_rows(&[&[1.0, 2.0], &[3.0, 4.0], &[5.0, 6.0]]);
        assert_eq!(m.n_samples, 3);
        assert_eq!(m.n_features, 2);
        assert_eq!(m.row(1), &[3.0, 4.0]);
        assert_eq!(m.column(1).collect::<Vec<_>>(), vec![2.0, 4.0, 6.0]);

        m.set(2, 0, 9.0);
        assert_eq!(m.get(2, 0), 9.0);
        m.row_mut(0)[1] = -1.0;
        assert_eq!(m.row(0), &[1.0, -1.0]);
    }

    #[test]
    fn test_anomaly_result_lookup() {
        let mut result = AnomalyResult::default();
        result.scores.insert("A".into(), 0.9);
        result.scores.insert("B".into(), 0.2);

        assert_eq!(result.score("A"), 0.9);
        assert_eq!(result.score("missing"), 0.0);
        let high: Vec<_> = result.above(0.5).collect();
        assert_eq!(high, vec![("A", 0.9)]);
    }
}
