//! # Ringwatch ML
//!
//! Account feature engineering and unsupervised anomaly scoring.
//!
//! ## Kernels
//! - `AccountFeatures` - ten flow and degree features per account
//! - `AnomalyScorer` - standardized features scored by an [`anomaly::OutlierScorer`]
//!
//! The default scorer is [`anomaly::IsolationForest`]; any type implementing
//! `OutlierScorer` can replace it through `AnomalyScorer::compute_with`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod anomaly;
pub mod features;
pub mod messages;

// Common ML types
pub mod types;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::anomaly::*;
    pub use crate::features::*;
    pub use crate::messages::*;
    pub use crate::types::*;
}

/// Register all ML kernels with a registry.
pub fn register_all(
    registry: &ringwatch_core::registry::KernelRegistry,
) -> ringwatch_core::error::Result<()> {
    use ringwatch_core::traits::AnalysisKernel;

    tracing::info!("Registering statistical ML kernels");

    registry.register_metadata(features::AccountFeatures::new().metadata().clone())?;
    registry.register_metadata(anomaly::AnomalyScorer::new().metadata().clone())?;

    tracing::info!("Registered 2 statistical ML kernels");
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
        register_all(&registry).expect("Failed to register ML kernels");
        assert_eq!(registry.total_count(), 2);
        assert_eq!(registry.by_domain(Domain::StatisticalML).len(), 2);
    }
}
