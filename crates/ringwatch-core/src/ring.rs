//! Fraud rings and pattern types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Ring id prefix for cycle rings.
pub const CYCLE_RING_PREFIX: &str = "RING_";
/// Ring id prefix for fan-in smurfing rings.
pub const SMURF_IN_RING_PREFIX: &str = "RING_SMURF_IN_";
/// Ring id prefix for fan-out smurfing rings.
pub const SMURF_OUT_RING_PREFIX: &str = "RING_SMURF_OUT_";
/// Ring id prefix for layered shell rings.
pub const SHELL_RING_PREFIX: &str = "RING_SHELL_";

/// Laundering pattern a ring was detected under.
///
/// Serialized as its label: `cycle_length_<k>`, `fan_in_72h`, `fan_out_72h`,
/// `layered_shell`, or any other label verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum PatternType {
    /// Simple directed cycle of the given length.
    Cycle {
        /// Number of accounts in the cycle.
        length: usize,
    },
    /// Many senders into one receiver inside the smurfing window.
    FanIn72h,
    /// One sender to many receivers inside the smurfing window.
    FanOut72h,
    /// Multi-hop chain through pass-through accounts.
    LayeredShell,
    /// Any other detected pattern.
    Other(String),
}

impl PatternType {
    /// Severity used for pattern risk. Higher wins when an account belongs
    /// to several rings.
    #[must_use]
    pub fn severity(&self) -> f64 {
        match self {
            PatternType::LayeredShell => 0.9,
            PatternType::Cycle { .. } => 0.7,
            PatternType::FanIn72h | PatternType::FanOut72h => 0.6,
            PatternType::Other(_) => 0.4,
        }
    }

    /// Returns true for any cycle pattern.
    #[must_use]
    pub fn is_cycle(&self) -> bool {
        matches!(self, PatternType::Cycle { .. })
    }

    /// Pattern label.
    #[must_use]
    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for PatternType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternType::Cycle { length } => write!(f, "cycle_length_{length}"),
            PatternType::FanIn72h => write!(f, "fan_in_72h"),
            PatternType::FanOut72h => write!(f, "fan_out_72h"),
            PatternType::LayeredShell => write!(f, "layered_shell"),
            PatternType::Other(label) => write!(f, "{label}"),
        }
    }
}

impl From<String> for PatternType {
    fn from(label: String) -> Self {
        match label.as_str() {
            "fan_in_72h" => return PatternType::FanIn72h,
            "fan_out_72h" => return PatternType::FanOut72h,
            "layered_shell" => return PatternType::LayeredShell,
            _ => {}
        }
        match label
            .strip_prefix("cycle_length_")
            .and_then(|k| k.parse::<usize>().ok())
        {
            Some(length) => PatternType::Cycle { length },
            None => PatternType::Other(label),
        }
    }
}

impl From<PatternType> for String {
    fn from(pattern: PatternType) -> Self {
        pattern.to_string()
    }
}

/// A group of accounts participating in one pattern instance.
///
/// Member order is meaningful: traversal order for cycles, path order for
/// shell chains, senders-then-receiver for fan-in and sender-then-receivers
/// for fan-out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ring {
    /// Unique ring id.
    pub ring_id: String,
    /// Detected pattern.
    pub pattern_type: PatternType,
    /// Member accounts in pattern order.
    pub member_accounts: Vec<String>,
    /// Number of hops for layering chains.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layering_depth: Option<usize>,
    /// Ring-level risk score.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_score: Option<f64>,
}

impl Ring {
    /// Create a new ring.
    pub fn new(
        ring_id: impl Into<String>,
        pattern_type: PatternType,
        member_accounts: Vec<String>,
    ) -> Self {
        Self {
            ring_id: ring_id.into(),
            pattern_type,
            member_accounts,
            layering_depth: None,
            risk_score: None,
        }
    }

    /// Set the layering depth.
    #[must_use]
    pub fn with_layering_depth(mut self, depth: usize) -> Self {
        self.layering_depth = Some(depth);
        self
    }

    /// Set the ring risk score.
    #[must_use]
    pub fn with_risk_score(mut self, score: f64) -> Self {
        self.risk_score = Some(score);
        self
    }

    /// Returns true if the account is a member.
    #[must_use]
    pub fn contains(&self, account: &str) -> bool {
        self.member_accounts.iter().any(|m| m == account)
    }

    /// Number of member accounts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.member_accounts.len()
    }

    /// Returns true if the ring has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.member_accounts.is_empty()
    }
}

/// Sequential ring id allocator, one per detector run.
///
/// Ids are `<prefix><n>` with `n` starting at 1, zero-padded to three digits.
#[derive(Debug, Clone)]
pub struct RingIdAllocator {
    prefix: &'static str,
    issued: usize,
}

impl RingIdAllocator {
    /// Create an allocator for the given prefix.
    #[must_use]
    pub fn new(prefix: &'static str) -> Self {
        Self { prefix, issued: 0 }
    }

    /// Allocate the next id.
    pub fn next_id(&mut self) -> String {
        self.issued += 1;
        format!("{}{:03}", self.prefix, self.issued)
    }

    /// Number of ids issued so far.
    #[must_use]
    pub fn issued(&self) -> usize {
        self.issued
    }
}
