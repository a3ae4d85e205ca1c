//! Kernel registry.
//!
//! The registry holds the metadata of every registered kernel and provides
//! lookup by ID and by domain. Each crate contributes its kernels through a
//! `register_all` function.

use crate::domain::Domain;
use crate::error::{AnalysisError, Result};
use crate::kernel::KernelMetadata;
use hashbrown::HashMap;
use std::sync::{PoisonError, RwLock};
use tracing::{debug, info, warn};

/// Registry statistics.
#[derive(Debug, Clone, Default)]
pub struct RegistryStats {
    /// Total number of registered kernels.
    pub total: usize,
    /// Kernels by domain.
    pub by_domain: HashMap<Domain, usize>,
}

/// Central registry for all kernels.
#[derive(Debug, Default)]
pub struct KernelRegistry {
    kernels: RwLock<HashMap<String, KernelMetadata>>,
}

impl KernelRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a kernel by its metadata.
    pub fn register_metadata(&self, metadata: KernelMetadata) -> Result<()> {
        let mut kernels = self
            .kernels
            .write()
            .map_err(|_| AnalysisError::internal("kernel registry lock poisoned"))?;

        if kernels.contains_key(&metadata.id) {
            return Err(AnalysisError::KernelAlreadyRegistered(metadata.id));
        }

        debug!(kernel_id = %metadata.id, domain = %metadata.domain, "Registering kernel");
        kernels.insert(metadata.id.clone(), metadata);
        Ok(())
    }

    /// Get a kernel by ID.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<KernelMetadata> {
        let kernels = self.kernels.read().unwrap_or_else(PoisonError::into_inner);
        kernels.get(id).cloned()
    }

    /// Get a kernel by ID, failing if it is not registered.
    pub fn require(&self, id: &str) -> Result<KernelMetadata> {
        self.get(id).ok_or_else(|| AnalysisError::not_found(id))
    }

    /// Check if a kernel exists.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        let kernels = self.kernels.read().unwrap_or_else(PoisonError::into_inner);
        kernels.contains_key(id)
    }

    /// All kernel IDs, sorted.
    #[must_use]
    pub fn all_kernel_ids(&self) -> Vec<String> {
        let kernels = self.kernels.read().unwrap_or_else(PoisonError::into_inner);
        let mut ids: Vec<String> = kernels.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Kernels of one domain, sorted by ID.
    #[must_use]
    pub fn by_domain(&self, domain: Domain) -> Vec<KernelMetadata> {
        let kernels = self.kernels.read().unwrap_or_else(PoisonError::into_inner);
        let mut result: Vec<KernelMetadata> = kernels
            .values()
            .filter(|m| m.domain == domain)
            .cloned()
            .collect();
        result.sort_by(|a, b| a.id.cmp(&b.id));
        result
    }

    /// Get registry statistics.
    #[must_use]
    pub fn stats(&self) -> RegistryStats {
        let kernels = self.kernels.read().unwrap_or_else(PoisonError::into_inner);

        let mut by_domain: HashMap<Domain, usize> = HashMap::new();
        for entry in kernels.values() {
            *by_domain.entry(entry.domain).or_default() += 1;
        }

        RegistryStats {
            total: kernels.len(),
            by_domain,
        }
    }

    /// Total number of registered kernels.
    #[must_use]
    pub fn total_count(&self) -> usize {
        let kernels = self.kernels.read().unwrap_or_else(PoisonError::into_inner);
        kernels.len()
    }

    /// Unregister a kernel by ID.
    pub fn unregister(&self, id: &str) -> bool {
        let mut kernels = self.kernels.write().unwrap_or_else(PoisonError::into_inner);
        if kernels.remove(id).is_some() {
            debug!(kernel_id = %id, "Unregistered kernel");
            return true;
        }

        warn!(kernel_id = %id, "Attempted to unregister non-existent kernel");
        false
    }

    /// Clear all registered kernels.
    pub fn clear(&self) {
        let mut kernels = self.kernels.write().unwrap_or_else(PoisonError::into_inner);
        kernels.clear();
        info!("Cleared kernel registry");
    }
}

/// Builder for kernel registry.
#[derive(Default)]
pub struct KernelRegistryBuilder {
    entries: Vec<KernelMetadata>,
}

impl KernelRegistryBuilder {
    /// Create a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a kernel.
    #[must_use]
    pub fn with_kernel(mut self, metadata: KernelMetadata) -> Self {
        self.entries.push(metadata);
        self
    }

    /// Build the registry.
    ///
    /// # Errors
    ///
    /// Returns an error if two kernels share an ID.
    pub fn build(self) -> Result<KernelRegistry> {
        let registry = KernelRegistry::new();
        for entry in self.entries {
            registry.register_metadata(entry)?;
        }

        info!(total = registry.total_count(), "Built kernel registry");
        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(id: &str, domain: Domain) -> KernelMetadata {
        KernelMetadata::batch(id, domain)
    }

    #[test]
    fn test_registry_creation() {
        let registry = KernelRegistry::new();
        assert_eq!(registry.total_count(), 0);
    }

    #[test]
    fn test_registration_and_lookup() {
        let registry = KernelRegistry::new();
        registry
            .register_metadata(meta("graph/pagerank", Domain::GraphAnalytics))
            .unwrap();

        assert_eq!(registry.total_count(), 1);
        assert!(registry.contains("graph/pagerank"));
        assert!(registry.get("graph/pagerank").is_some());
        assert!(registry.require("graph/missing").is_err());
    }

    #[test]
    fn test_duplicate_registration() {
        let registry = KernelRegistry::new();
        registry
            .register_metadata(meta("risk/fusion", Domain::RiskAnalytics))
            .unwrap();
        let result = registry.register_metadata(meta("risk/fusion", Domain::RiskAnalytics));
        assert!(matches!(
            result,
            Err(AnalysisError::KernelAlreadyRegistered(_))
        ));
    }

    #[test]
    fn test_by_domain_and_stats() {
        let registry = KernelRegistryBuilder::new()
            .with_kernel(meta("patterns/shell", Domain::Compliance))
            .with_kernel(meta("patterns/cycle", Domain::Compliance))
            .with_kernel(meta("ml/anomaly", Domain::StatisticalML))
            .build()
            .unwrap();

        let compliance = registry.by_domain(Domain::Compliance);
        assert_eq!(compliance.len(), 2);
        assert_eq!(compliance[0].id, "patterns/cycle");

        let stats = registry.stats();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.by_domain.get(&Domain::StatisticalML), Some(&1));
        assert_eq!(
            registry.all_kernel_ids(),
            vec!["ml/anomaly", "patterns/cycle", "patterns/shell"]
        );
    }

    #[test]
    fn test_unregister_and_clear() {
        let registry = KernelRegistry::new();
        registry
            .register_metadata(meta("ml/anomaly", Domain::StatisticalML))
            .unwrap();
        assert!(registry.unregister("ml/anomaly"));
        assert!(!registry.unregister("ml/anomaly"));

        registry
            .register_metadata(meta("ml/anomaly", Domain::StatisticalML))
            .unwrap();
        registry.clear();
        assert_eq!(registry.total_count(), 0);
    }
}
