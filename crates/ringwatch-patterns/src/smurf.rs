//! Smurfing (fan-in / fan-out) detection kernel.
//!
//! Rapid many-to-one and one-to-many redistribution inside a sliding time
//! window, keyed by receiver (fan-in) or sender (fan-out).

use crate::messages::{DetectionOutput, SmurfInput};
use async_trait::async_trait;
use hashbrown::{HashMap, HashSet};
use ringwatch_core::{
    config::SmurfConfig,
    domain::Domain,
    error::Result,
    kernel::KernelMetadata,
    ring::{PatternType, Ring, RingIdAllocator, SMURF_IN_RING_PREFIX, SMURF_OUT_RING_PREFIX},
    traits::{AnalysisKernel, BatchKernel},
    transaction::Transaction,
};
use std::collections::BTreeMap;
use std::time::Instant;

/// Which side of the transaction the window is keyed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanDirection {
    /// Many senders into one receiver.
    In,
    /// One sender to many receivers.
    Out,
}

impl FanDirection {
    fn key<'a>(&self, tx: &'a Transaction) -> &'a str {
        match self {
            FanDirection::In => &tx.receiver_id,
            FanDirection::Out => &tx.sender_id,
        }
    }

    fn counterparty<'a>(&self, tx: &'a Transaction) -> &'a str {
        match self {
            FanDirection::In => &tx.sender_id,
            FanDirection::Out => &tx.receiver_id,
        }
    }

    fn pattern(&self) -> PatternType {
        match self {
            FanDirection::In => PatternType::FanIn72h,
            FanDirection::Out => PatternType::FanOut72h,
        }
    }

    fn prefix(&self) -> &'static str {
        match self {
            FanDirection::In => SMURF_IN_RING_PREFIX,
            FanDirection::Out => SMURF_OUT_RING_PREFIX,
        }
    }
}

/// Sample standard deviation (n - 1 denominator). NaN below two values.
pub fn sample_std(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return f64::NAN;
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    var.sqrt()
}

/// Smurfing detection kernel.
///
/// For every account, transactions are scanned in timestamp order with a
/// two-pointer window no wider than `window_secs`. When the window holds at
/// least `min_counterparties` distinct counterparties, the window must also
/// total at least `min_total_amount` with a sample standard deviation below
/// `max_amount_std` (an undefined deviation fails). Fan-in additionally
/// requires the receiver to send money somewhere in the dataset. The first
/// qualifying window per account emits its ring.
#[derive(Debug, Clone)]
pub struct SmurfDetection {
    metadata: KernelMetadata,
}

impl Default for SmurfDetection {
    fn default() -> Self {
        Self::new()
    }
}

impl SmurfDetection {
    /// Create a new smurfing detection kernel.
    #[must_use]
    pub fn new() -> Self {
        Self {
            metadata: KernelMetadata::batch("compliance/smurf-detection", Domain::Compliance)
                .with_description("Fan-in / fan-out smurfing in a 72h sliding window")
                .with_throughput(200_000)
                .with_latency_us(50.0),
        }
    }

    /// Detect fan-in rings followed by fan-out rings.
    pub fn compute(transactions: &[Transaction], config: &SmurfConfig) -> Vec<Ring> {
        let mut sorted: Vec<&Transaction> = transactions.iter().collect();
        sorted.sort_by_key(|tx| tx.timestamp);

        let senders: HashSet<&str> = transactions.iter().map(|t| t.sender_id.as_str()).collect();

        let mut rings = Self::detect(&sorted, FanDirection::In, config, |receiver| {
            senders.contains(receiver)
        });
        let fan_in = rings.len();
        rings.extend(Self::detect(&sorted, FanDirection::Out, config, |_| true));

        tracing::debug!(
            fan_in,
            fan_out = rings.len() - fan_in,
            "Smurf detection complete"
        );
        rings
    }

    /// Scan every account in ascending id order for one direction.
    pub fn detect(
        sorted: &[&Transaction],
        direction: FanDirection,
        config: &SmurfConfig,
        eligible: impl Fn(&str) -> bool,
    ) -> Vec<Ring> {
        let mut groups: BTreeMap<&str, Vec<&Transaction>> = BTreeMap::new();
        for &tx in sorted {
            groups.entry(direction.key(tx)).or_default().push(tx);
        }

        let mut ids = RingIdAllocator::new(direction.prefix());
        let mut rings = Vec::new();

        for (account, group) in groups {
            if !eligible(account) {
                continue;
            }
            if let Some(counterparties) = Self::first_window(&group, direction, config) {
                let mut members: Vec<String> = Vec::with_capacity(counterparties.len() + 1);
                match direction {
                    FanDirection::In => {
                        members.extend(counterparties);
                        members.push(account.to_string());
                    }
                    FanDirection::Out => {
                        members.push(account.to_string());
                        members.extend(counterparties);
                    }
                }
                rings.push(Ring::new(ids.next_id(), direction.pattern(), members));
            }
        }

        rings
    }

    /// Distinct counterparties of the first qualifying window, in order of
    /// first appearance inside that window.
    fn first_window(
        group: &[&Transaction],
        direction: FanDirection,
        config: &SmurfConfig,
    ) -> Option<Vec<String>> {
        let window = config.window();
        let mut counts: HashMap<&str, usize> = HashMap::new();
        let mut start = 0;

        for end in 0..group.len() {
            *counts.entry(direction.counterparty(group[end])).or_insert(0) += 1;

            while group[end].timestamp - group[start].timestamp > window {
                let party = direction.counterparty(group[start]);
                if let Some(c) = counts.get_mut(party) {
                    *c -= 1;
                    if *c == 0 {
                        counts.remove(party);
                    }
                }
                start += 1;
            }

            if counts.len() < config.min_counterparties {
                continue;
            }

            let amounts: Vec<f64> = group[start..=end].iter().map(|t| t.amount).collect();
            let total: f64 = amounts.iter().sum();
            let std = sample_std(&amounts);

            // NaN compares false, so an undefined deviation fails here.
            if total >= config.min_total_amount && std < config.max_amount_std {
                let mut seen: HashSet<&str> = HashSet::new();
                let parties = group[start..=end]
                    .iter()
                    .map(|t| direction.counterparty(t))
                    .filter(|p| seen.insert(*p))
                    .map(str::to_string)
                    .collect();
                return Some(parties);
            }
        }

        None
    }
}

impl AnalysisKernel for SmurfDetection {
    fn metadata(&self) -> &KernelMetadata {
        &self.metadata
    }
}

#[async_trait]
impl BatchKernel<SmurfInput, DetectionOutput> for SmurfDetection {
    async fn execute(&self, input: SmurfInput) -> Result<DetectionOutput> {
        let start = Instant::now();
        let rings = Self::compute(&input.transactions, &input.config);
        Ok(DetectionOutput {
            rings,
            compute_time_us: start.elapsed().as_micros() as u64,
        })
    }
}
