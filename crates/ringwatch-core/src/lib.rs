//! # Ringwatch Core
//!
//! Shared foundation for the Ringwatch fraud-ring detection engine.
//!
//! ## Contents
//!
//! - `Transaction` and `Ring`: the input record and the detector output
//! - `KernelMetadata`, `AnalysisKernel`, `BatchKernel`: the kernel model
//! - `KernelRegistry`: catalogue of registered kernels
//! - `AnalysisConfig`: per-stage parameters with env and TOML sources
//! - `observability`: `tracing-subscriber` setup
//! - `AnalysisError`: the error type shared by every crate

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod domain;
pub mod error;
pub mod kernel;
pub mod observability;
pub mod registry;
pub mod ring;
pub mod traits;
pub mod transaction;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::config::AnalysisConfig;
    pub use crate::domain::Domain;
    pub use crate::error::{AnalysisError, Result};
    pub use crate::kernel::KernelMetadata;
    pub use crate::registry::{KernelRegistry, KernelRegistryBuilder};
    pub use crate::ring::{PatternType, Ring, RingIdAllocator};
    pub use crate::traits::{AnalysisKernel, BatchKernel};
    pub use crate::transaction::Transaction;
    pub use async_trait::async_trait;
}

/// Version of the core crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
