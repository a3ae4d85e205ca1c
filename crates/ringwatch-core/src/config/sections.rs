//! Per-stage configuration sections.

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

const HOUR_SECS: i64 = 3600;

/// Graph Intelligence settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Maximum local-moving passes per Louvain level.
    pub louvain_max_passes: usize,
    /// Maximum number of Louvain contraction levels.
    pub louvain_max_levels: usize,
    /// Minimum modularity improvement for another pass.
    pub louvain_min_gain: f64,
    /// PageRank damping factor.
    pub pagerank_damping: f64,
    /// PageRank iteration cap.
    pub pagerank_max_iterations: usize,
    /// PageRank per-node convergence tolerance.
    pub pagerank_tolerance: f64,
    /// A node is a hub when its betweenness exceeds this multiple of the mean.
    pub hub_multiplier: f64,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            louvain_max_passes: 100,
            louvain_max_levels: 32,
            louvain_min_gain: 1e-7,
            pagerank_damping: 0.85,
            pagerank_max_iterations: 100,
            pagerank_tolerance: 1e-6,
            hub_multiplier: 5.0,
        }
    }
}

/// Cycle detector settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CycleConfig {
    /// Shortest retained cycle.
    pub min_length: usize,
    /// Longest retained cycle.
    pub max_length: usize,
    /// Stop after this many retained cycles.
    pub max_cycles: usize,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            min_length: 3,
            max_length: 5,
            max_cycles: 10_000,
        }
    }
}

/// Fan-in / fan-out settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmurfConfig {
    /// Sliding window length in seconds.
    pub window_secs: i64,
    /// Distinct counterparties required inside one window.
    pub min_counterparties: usize,
    /// Minimum total amount inside the window.
    pub min_total_amount: f64,
    /// Sample standard deviation of amounts must stay below this.
    pub max_amount_std: f64,
}

impl SmurfConfig {
    /// Window as a time delta.
    pub fn window(&self) -> TimeDelta {
        TimeDelta::seconds(self.window_secs)
    }
}

impl Default for SmurfConfig {
    fn default() -> Self {
        Self {
            window_secs: 72 * HOUR_SECS,
            min_counterparties: 10,
            min_total_amount: 5000.0,
            max_amount_std: 5000.0,
        }
    }
}

/// Layered shell settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Pass-through accounts retain less than this fraction of inflow.
    pub max_retention: f64,
    /// Minimum hops in a chain.
    pub min_hops: usize,
    /// Maximum hops in a chain (search depth).
    pub max_hops: usize,
    /// The whole chain must complete within this many seconds.
    pub window_secs: i64,
    /// Risk score stamped on each shell ring.
    pub base_risk: f64,
    /// Path enumeration budget per source account.
    pub max_paths_per_source: usize,
}

impl ShellConfig {
    /// Window as a time delta.
    pub fn window(&self) -> TimeDelta {
        TimeDelta::seconds(self.window_secs)
    }
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            max_retention: 0.15,
            min_hops: 3,
            max_hops: 4,
            window_secs: 48 * HOUR_SECS,
            base_risk: 0.85,
            max_paths_per_source: 5_000,
        }
    }
}

/// Anomaly scorer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnomalyConfig {
    /// Number of isolation trees.
    pub n_trees: usize,
    /// Subsample size per tree (capped by the account count).
    pub max_samples: usize,
    /// Expected outlier fraction.
    pub contamination: f64,
    /// Base random seed.
    pub seed: u64,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_samples: 256,
            contamination: 0.08,
            seed: 42,
        }
    }
}

/// Risk fusion settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Weight of the graph component.
    pub graph_weight: f64,
    /// Weight of the anomaly component.
    pub anomaly_weight: f64,
    /// Weight of the pattern component.
    pub pattern_weight: f64,
    /// Weight of the velocity component.
    pub velocity_weight: f64,
    /// Multiplier applied to blended centrality before capping at 1.
    pub centrality_scale: f64,
    /// Minimum graph risk for hub accounts.
    pub hub_floor: f64,
    /// Velocity lookback from the latest timestamp, in seconds.
    pub velocity_window_secs: i64,
    /// Outgoing transactions in the window that saturate velocity risk.
    pub velocity_saturation: f64,
    /// Transactions that saturate confidence.
    pub confidence_saturation: f64,
}

impl RiskConfig {
    /// Velocity window as a time delta.
    pub fn velocity_window(&self) -> TimeDelta {
        TimeDelta::seconds(self.velocity_window_secs)
    }

    /// Sum of the four component weights.
    pub fn weight_sum(&self) -> f64 {
        self.graph_weight + self.anomaly_weight + self.pattern_weight + self.velocity_weight
    }
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            graph_weight: 0.4,
            anomaly_weight: 0.3,
            pattern_weight: 0.2,
            velocity_weight: 0.1,
            centrality_scale: 10.0,
            hub_floor: 0.8,
            velocity_window_secs: 24 * HOUR_SECS,
            velocity_saturation: 20.0,
            confidence_saturation: 5.0,
        }
    }
}

/// Report thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportingConfig {
    /// Accounts scoring strictly above this are suspicious.
    pub suspicion_threshold: f64,
    /// Anomaly scores strictly above this are listed.
    pub anomaly_report_threshold: f64,
}

impl Default for ReportingConfig {
    fn default() -> Self {
        Self {
            suspicion_threshold: 25.0,
            anomaly_report_threshold: 0.5,
        }
    }
}
