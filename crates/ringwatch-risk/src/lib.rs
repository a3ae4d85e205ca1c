//! # Ringwatch Risk
//!
//! Per-account risk fusion.
//!
//! ## Kernels
//! - `RiskFusion` - weighted blend of graph, anomaly, pattern and velocity signals
//!
//! Also provides ranking and ring annotation helpers used by report assembly.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod fusion;
pub mod messages;
pub mod types;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::fusion::*;
    pub use crate::messages::*;
    pub use crate::types::*;
}

/// Register all risk kernels with a registry.
pub fn register_all(
    registry: &ringwatch_core::registry::KernelRegistry,
) -> ringwatch_core::error::Result<()> {
    use ringwatch_core::traits::AnalysisKernel;

    tracing::info!("Registering risk analytics kernels");

    registry.register_metadata(fusion::RiskFusion::new().metadata().clone())?;

    tracing::info!("Registered 1 risk analytics kernel");
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
        register_all(&registry).expect("Failed to register risk kernels");
        assert_eq!(registry.total_count(), 1);
        assert_eq!(registry.by_domain(Domain::RiskAnalytics).len(), 1);
    }
}
