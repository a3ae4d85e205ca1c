//! # Ringwatch Patterns
//!
//! Fraud-ring pattern detectors. Each detector is independent of the others
//! and numbers its rings with its own allocator.
//!
//! ## Kernels
//! - `CycleDetection` - simple directed cycles of length 3 to 5 (`RING_###`)
//! - `SmurfDetection` - fan-in / fan-out in a 72h window
//!   (`RING_SMURF_IN_###`, `RING_SMURF_OUT_###`)
//! - `ShellDetection` - layered chains through pass-through accounts
//!   (`RING_SHELL_###`)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cycle;
pub mod messages;
pub mod shell;
pub mod smurf;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::cycle::*;
    pub use crate::messages::*;
    pub use crate::shell::*;
    pub use crate::smurf::*;
}

/// Register all pattern detection kernels with a registry.
pub fn register_all(
    registry: &ringwatch_core::registry::KernelRegistry,
) -> ringwatch_core::error::Result<()> {
    use ringwatch_core::traits::AnalysisKernel;

    tracing::info!("Registering pattern detection kernels");

    registry.register_metadata(cycle::CycleDetection::new().metadata().clone())?;
    registry.register_metadata(smurf::SmurfDetection::new().metadata().clone())?;
    registry.register_metadata(shell::ShellDetection::new().metadata().clone())?;

    tracing::info!("Registered 3 pattern detection kernels");
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
        register_all(&registry).expect("Failed to register pattern kernels");
        assert_eq!(registry.total_count(), 3);
        assert_eq!(registry.by_domain(Domain::Compliance).len(), 3);
    }
}
