//! Kernel metadata.
//!
//! Every analytical unit (graph builder, centrality, detectors, scorer,
//! fusion) is described by a `KernelMetadata` record so it can be listed,
//! filtered by domain, and looked up in the registry.

use crate::domain::Domain;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kernel metadata.
///
/// Contains identification and performance expectations for a kernel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KernelMetadata {
    /// Unique kernel identifier (e.g., "graph/pagerank").
    pub id: String,

    /// Analytical domain.
    pub domain: Domain,

    /// Human-readable description.
    pub description: String,

    /// Expected throughput in items (transactions or accounts) per second.
    pub expected_throughput: u64,

    /// Target latency in microseconds.
    pub target_latency_us: f64,

    /// Version of the kernel implementation.
    pub version: u32,
}

impl KernelMetadata {
    /// Create metadata for a batch kernel.
    #[must_use]
    pub fn batch(id: impl Into<String>, domain: Domain) -> Self {
        Self {
            id: id.into(),
            domain,
            description: String::new(),
            expected_throughput: 10_000,
            target_latency_us: 50.0,
            version: 1,
        }
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the expected throughput.
    #[must_use]
    pub fn with_throughput(mut self, items_per_sec: u64) -> Self {
        self.expected_throughput = items_per_sec;
        self
    }

    /// Set the target latency.
    #[must_use]
    pub fn with_latency_us(mut self, latency_us: f64) -> Self {
        self.target_latency_us = latency_us;
        self
    }

    /// Set the version.
    #[must_use]
    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    /// Returns the feature string used in catalogue listings.
    ///
    /// Format: `Domain.KernelName` where KernelName is extracted from the ID.
    #[must_use]
    pub fn feature_string(&self) -> String {
        let name = self.id.rsplit('/').next().unwrap_or(&self.id);
        format!("{}.{}", self.domain, to_pascal_case(name))
    }
}

impl fmt::Display for KernelMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} v{} [{}]", self.id, self.version, self.domain)
    }
}

/// Convert a kebab-case or snake_case string to PascalCase.
fn to_pascal_case(s: &str) -> String {
    s.split(['-', '_'])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}
