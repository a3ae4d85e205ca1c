//! Analytical domain definitions.
//!
//! Kernels are grouped into domains for catalogue listing and filtering.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Analytical domain a kernel belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Domain {
    /// Graph construction, centrality and community structure.
    GraphAnalytics,
    /// Laundering pattern detection (cycles, smurfing, layering).
    Compliance,
    /// Feature engineering and outlier scoring.
    StatisticalML,
    /// Signal fusion and ranking.
    RiskAnalytics,
    /// Shared infrastructure.
    Core,
}

impl Domain {
    /// All domains, in catalogue order.
    pub const ALL: &'static [Domain] = &[
        Domain::GraphAnalytics,
        Domain::Compliance,
        Domain::StatisticalML,
        Domain::RiskAnalytics,
        Domain::Core,
    ];

    /// Returns the domain name as a string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Domain::GraphAnalytics => "GraphAnalytics",
            Domain::Compliance => "Compliance",
            Domain::StatisticalML => "StatisticalML",
            Domain::RiskAnalytics => "RiskAnalytics",
            Domain::Core => "Core",
        }
    }

    /// Parse a domain from its name. Matching is case-insensitive.
    #[must_use]
    pub fn from_name(s: &str) -> Option<Self> {
        Domain::ALL
            .iter()
            .copied()
            .find(|d| d.as_str().eq_ignore_ascii_case(s))
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
