//! # Ringwatch Graph
//!
//! Transaction graph construction and graph intelligence.
//!
//! ## Kernels
//!
//! ### Construction (1 kernel)
//! - `TransactionGraphBuilder` - grouped aggregation into a CSR graph
//!
//! ### Community Detection (2 kernels)
//! - `ModularityScore` - modularity of a partition
//! - `LouvainCommunity` - multi-level optimization, deterministic tie-break
//!
//! ### Structure (1 kernel)
//! - `StronglyConnectedComponents` - Tarjan, components of size ≥ 2
//!
//! ### Centrality (2 kernels)
//! - `BetweennessCentrality` - Brandes over Dijkstra, weighted by transaction count
//! - `PageRank` - power iteration weighted by amount
//!
//! ### Intelligence (2 kernels)
//! - `HubClassifier` - betweenness relative to the graph mean
//! - `GraphIntelligence` - all of the above keyed by account id

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod builder;
pub mod centrality;
pub mod community;
pub mod components;
pub mod intelligence;
pub mod messages;

// Common graph types
pub mod types;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::builder::*;
    pub use crate::centrality::*;
    pub use crate::community::*;
    pub use crate::components::*;
    pub use crate::intelligence::*;
    pub use crate::messages::*;
    pub use crate::types::*;
}

/// Register all graph kernels with a registry.
pub fn register_all(
    registry: &ringwatch_core::registry::KernelRegistry,
) -> ringwatch_core::error::Result<()> {
    use ringwatch_core::traits::AnalysisKernel;

    tracing::info!("Registering graph analytics kernels");

    registry.register_metadata(builder::TransactionGraphBuilder::new().metadata().clone())?;

    // Community detection kernels (2)
    registry.register_metadata(community::ModularityScore::new().metadata().clone())?;
    registry.register_metadata(community::LouvainCommunity::new().metadata().clone())?;

    registry.register_metadata(
        components::StronglyConnectedComponents::new()
            .metadata()
            .clone(),
    )?;

    // Centrality kernels (2)
    registry.register_metadata(centrality::BetweennessCentrality::new().metadata().clone())?;
    registry.register_metadata(centrality::PageRank::new().metadata().clone())?;

    registry.register_metadata(intelligence::HubClassifier::new().metadata().clone())?;
    registry.register_metadata(intelligence::GraphIntelligence::new().metadata().clone())?;

    tracing::info!("Registered 8 graph analytics kernels");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ringwatch_core::domain::Domain;
    use ringwatch_core::registry::KernelRegistry;

    #[test]
    fn test_register_all() {
        let registry = KernelRegistry::new();
        register_all(&registry).expect("Failed to register graph kernels");
        assert_eq!(registry.total_count(), 8);
        assert_eq!(registry.by_domain(Domain::GraphAnalytics).len(), 8);
    }

    #[test]
    fn test_register_twice_fails() {
        let registry = KernelRegistry::new();
        register_all(&registry).unwrap();
        assert!(register_all(&registry).is_err());
    }
}
