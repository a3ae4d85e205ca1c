//! Error types for Ringwatch.

use std::time::Duration;
use thiserror::Error;

/// Result type alias using `AnalysisError`.
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Errors that can occur while analysing a transaction set.
///
/// Numeric degeneracies (empty input, identical scores, undefined standard
/// deviations) are not errors; every kernel resolves them to a documented
/// fallback value.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Input validation failed.
    #[error("Input validation failed: {0}")]
    ValidationError(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// An internal invariant was broken during computation.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// A numeric or algorithmic step failed.
    #[error("Computation failed: {0}")]
    ComputationError(String),

    /// Kernel did not finish within its deadline.
    #[error("Timeout waiting for kernel after {0:?}")]
    Timeout(Duration),

    /// Kernel not found in registry.
    #[error("Kernel not found: {0}")]
    KernelNotFound(String),

    /// Kernel already registered.
    #[error("Kernel already registered: {0}")]
    KernelAlreadyRegistered(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    InternalError(String),

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl AnalysisError {
    /// Create a validation error.
    #[must_use]
    pub fn validation(msg: impl Into<String>) -> Self {
        AnalysisError::ValidationError(msg.into())
    }

    /// Create a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        AnalysisError::ConfigError(msg.into())
    }

    /// Create an invariant violation.
    #[must_use]
    pub fn invariant(msg: impl Into<String>) -> Self {
        AnalysisError::InvariantViolation(msg.into())
    }

    /// Create a computation error.
    #[must_use]
    pub fn computation(msg: impl Into<String>) -> Self {
        AnalysisError::ComputationError(msg.into())
    }

    /// Create an internal error.
    #[must_use]
    pub fn internal(msg: impl Into<String>) -> Self {
        AnalysisError::InternalError(msg.into())
    }

    /// Create a kernel not found error.
    #[must_use]
    pub fn not_found(id: impl Into<String>) -> Self {
        AnalysisError::KernelNotFound(id.into())
    }

    /// Returns true if retrying with different input or limits may succeed.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AnalysisError::Timeout(_)
                | AnalysisError::ValidationError(_)
                | AnalysisError::ConfigError(_)
        )
    }

    /// Returns true if the error signals a broken internal invariant.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            AnalysisError::InvariantViolation(_) | AnalysisError::InternalError(_)
        )
    }
}

impl From<serde_json::Error> for AnalysisError {
    fn from(err: serde_json::Error) -> Self {
        AnalysisError::SerializationError(err.to_string())
    }
}
