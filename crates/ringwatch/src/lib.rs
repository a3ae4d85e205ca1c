//! # Ringwatch
//!
//! Transaction-graph fraud-ring detection.
//!
//! A run ingests a ledger of transfers, builds an aggregated transaction
//! graph, analyses its structure, detects laundering rings (cycles, fan-in
//! and fan-out smurfing, layered shell chains), scores accounts for
//! statistical outliers and fuses everything into a bounded, explainable
//! per-account risk score.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ringwatch::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let transactions: Vec<Transaction> = load();
//!     let report = Pipeline::new(AnalysisConfig::default())
//!         .analyze(transactions)
//!         .await?;
//!     println!("{}", report.to_json(true)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Domain Organization
//!
//! | Domain | Crate | Kernels |
//! |--------|-------|---------|
//! | GraphAnalytics | `ringwatch-graph` | 8 |
//! | Compliance | `ringwatch-patterns` | 3 |
//! | StatisticalML | `ringwatch-ml` | 2 |
//! | RiskAnalytics | `ringwatch-risk` | 1 |

#![warn(missing_docs)]
#![warn(clippy::all)]

pub use ringwatch_core as core;
pub use ringwatch_graph as graph;
pub use ringwatch_ml as ml;
pub use ringwatch_patterns as patterns;
pub use ringwatch_risk as risk;

pub mod pipeline;
pub mod report;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use ringwatch_core::prelude::*;

    pub use crate::pipeline::{Pipeline, PipelineOutcome};
    pub use crate::report::AnalysisReport;
    pub use ringwatch_graph::intelligence::GraphIntelligenceResult;
    pub use ringwatch_graph::types::TransactionGraph;
    pub use ringwatch_ml::types::AnomalyResult;
    pub use ringwatch_risk::types::{RiskBreakdown, RiskResult};
}

/// Version information.
pub mod version {
    /// Crate version.
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
}

/// Kernel catalog providing overview of all available kernels.
pub mod catalog {
    use ringwatch_core::domain::Domain;

    /// Domain information.
    #[derive(Debug, Clone)]
    pub struct DomainInfo {
        /// Domain enum value.
        pub domain: Domain,
        /// Human-readable name.
        pub name: &'static str,
        /// Description.
        pub description: &'static str,
        /// Number of kernels.
        pub kernel_count: usize,
        /// Crate providing the kernels.
        pub crate_name: &'static str,
    }

    /// Get all domain information.
    pub fn domains() -> Vec<DomainInfo> {
        vec![
            DomainInfo {
                domain: Domain::GraphAnalytics,
                name: "Graph Analytics",
                description: "Graph construction, Louvain communities, SCC, betweenness, PageRank, hubs",
                kernel_count: 8,
                crate_name: "ringwatch-graph",
            },
            DomainInfo {
                domain: Domain::Compliance,
                name: "Compliance",
                description: "Cycle, fan-in/fan-out smurfing and layered shell detection",
                kernel_count: 3,
                crate_name: "ringwatch-patterns",
            },
            DomainInfo {
                domain: Domain::StatisticalML,
                name: "Statistical ML",
                description: "Account feature engineering and isolation forest anomaly scoring",
                kernel_count: 2,
                crate_name: "ringwatch-ml",
            },
            DomainInfo {
                domain: Domain::RiskAnalytics,
                name: "Risk Analytics",
                description: "Weighted fusion of graph, anomaly, pattern and velocity risk",
                kernel_count: 1,
                crate_name: "ringwatch-risk",
            },
        ]
    }

    /// Get total kernel count across all domains.
    pub fn total_kernel_count() -> usize {
        domains().iter().map(|d| d.kernel_count).sum()
    }

    /// Look up a domain by enum name (`Compliance`) or crate suffix (`patterns`).
    pub fn find(name: &str) -> Option<DomainInfo> {
        let wanted = name.to_lowercase();
        domains().into_iter().find(|info| {
            info.domain.as_str().eq_ignore_ascii_case(&wanted)
                || info
                    .crate_name
                    .strip_prefix("ringwatch-")
                    .is_some_and(|suffix| suffix == wanted)
        })
    }
}

/// Register all domain kernels into a registry.
///
/// # Errors
///
/// Returns an error if any kernel registration fails.
pub fn register_all(
    registry: &ringwatch_core::registry::KernelRegistry,
) -> ringwatch_core::error::Result<()> {
    ringwatch_graph::register_all(registry)?;
    ringwatch_patterns::register_all(registry)?;
    ringwatch_ml::register_all(registry)?;
    ringwatch_risk::register_all(registry)?;
    Ok(())
}
