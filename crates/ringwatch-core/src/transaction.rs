//! Transaction records.
//!
//! A transaction set is the only input to an analysis run. Accounts have no
//! entity of their own: an account exists because it appears as a sender or
//! receiver.

use crate::error::{AnalysisError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single immutable money transfer between two accounts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Transaction identifier.
    pub transaction_id: String,
    /// Paying account.
    pub sender_id: String,
    /// Receiving account.
    pub receiver_id: String,
    /// Non-negative amount.
    pub amount: f64,
    /// Settlement instant (RFC 3339 on the wire).
    pub timestamp: DateTime<Utc>,
}

impl Transaction {
    /// Create a new transaction.
    pub fn new(
        transaction_id: impl Into<String>,
        sender_id: impl Into<String>,
        receiver_id: impl Into<String>,
        amount: f64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            transaction_id: transaction_id.into(),
            sender_id: sender_id.into(),
            receiver_id: receiver_id.into(),
            amount,
            timestamp,
        }
    }

    /// Returns true if the account is the sender or the receiver.
    #[must_use]
    pub fn involves(&self, account: &str) -> bool {
        self.sender_id == account || self.receiver_id == account
    }

    /// Check the record against the boundary contract.
    ///
    /// Analysis kernels assume validated input; this is applied once when a
    /// transaction set enters the system.
    pub fn validate(&self) -> Result<()> {
        if self.transaction_id.is_empty() {
            return Err(AnalysisError::validation("transaction_id is empty"));
        }
        if self.sender_id.is_empty() || self.receiver_id.is_empty() {
            return Err(AnalysisError::validation(format!(
                "transaction {} has an empty account id",
                self.transaction_id
            )));
        }
        if !self.amount.is_finite() || self.amount < 0.0 {
            return Err(AnalysisError::validation(format!(
                "transaction {} has invalid amount {}",
                self.transaction_id, self.amount
            )));
        }
        Ok(())
    }
}

/// Validate every record of a transaction set.
pub fn validate_all(transactions: &[Transaction]) -> Result<()> {
    transactions.iter().try_for_each(Transaction::validate)
}

/// Latest timestamp in the set, if any.
#[must_use]
pub fn max_timestamp(transactions: &[Transaction]) -> Option<DateTime<Utc>> {
    transactions.iter().map(|t| t.timestamp).max()
}
