//! Core kernel traits.
//!
//! - `AnalysisKernel`: base trait exposing metadata
//! - `BatchKernel`: async request/response execution over typed messages

use crate::error::{AnalysisError, Result};
use crate::kernel::KernelMetadata;
use async_trait::async_trait;
use std::fmt::Debug;
use std::time::Duration;

/// Base trait for all analysis kernels.
pub trait AnalysisKernel: Send + Sync + Debug {
    /// Returns the kernel metadata.
    fn metadata(&self) -> &KernelMetadata;

    /// Validate kernel configuration before execution.
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    /// Returns the kernel ID.
    fn id(&self) -> &str {
        &self.metadata().id
    }
}

/// Trait for batch kernels.
///
/// The whole input is processed in one call. Implementations wrap a pure,
/// synchronous `compute` function and report how long it took.
///
/// # Type Parameters
///
/// - `I`: Input type
/// - `O`: Output type
#[async_trait]
pub trait BatchKernel<I, O>: AnalysisKernel
where
    I: Send + Sync,
    O: Send + Sync,
{
    /// Execute the kernel with the given input.
    async fn execute(&self, input: I) -> Result<O>;

    /// Validate the input before execution.
    ///
    /// Override to provide custom input validation.
    fn validate_input(&self, _input: &I) -> Result<()> {
        Ok(())
    }

    /// Execute the kernel with a deadline.
    async fn execute_with_timeout(&self, input: I, timeout: Duration) -> Result<O>
    where
        I: 'async_trait,
    {
        match tokio::time::timeout(timeout, self.execute(input)).await {
            Ok(result) => result,
            Err(_elapsed) => Err(AnalysisError::Timeout(timeout)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Domain;

    #[derive(Debug)]
    struct Doubler {
        metadata: KernelMetadata,
        delay: Duration,
    }

    impl AnalysisKernel for Doubler {
        fn metadata(&self) -> &KernelMetadata {
            &self.metadata
        }
    }

    #[async_trait]
    impl BatchKernel<Vec<f64>, Vec<f64>> for Doubler {
        async fn execute(&self, input: Vec<f64>) -> Result<Vec<f64>> {
            self.validate_input(&input)?;
            tokio::time::sleep(self.delay).await;
            Ok(input.into_iter().map(|x| x * 2.0).collect())
        }

        fn validate_input(&self, input: &Vec<f64>) -> Result<()> {
            if input.iter().any(|x| !x.is_finite()) {
                return Err(AnalysisError::validation("non-finite value"));
            }
            Ok(())
        }
    }

    fn doubler(delay_ms: u64) -> Doubler {
        Doubler {
            metadata: KernelMetadata::batch("test/doubler", Domain::Core),
            delay: Duration::from_millis(delay_ms),
        }
    }

    #[tokio::test]
    async fn test_execute() {
        let out = doubler(0).execute(vec![1.0, 2.5]).await.unwrap();
        assert_eq!(out, vec![2.0, 5.0]);
        assert_eq!(doubler(0).id(), "test/doubler");
    }

    #[tokio::test]
    async fn test_validate_input_rejects() {
        let err = doubler(0).execute(vec![f64::NAN]).await.unwrap_err();
        assert!(matches!(err, AnalysisError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_execute_with_timeout() {
        let err = doubler(200)
            .execute_with_timeout(vec![1.0], Duration::from_millis(10))
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Timeout(_)));

        let ok = doubler(0)
            .execute_with_timeout(vec![1.0], Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(ok, vec![2.0]);
    }
}
