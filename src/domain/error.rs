//! Domain Error Types
//!
//! Pure domain errors that don't depend on infrastructure.

use rust_decimal::Decimal;
use thiserror::Error;

/// Invariant failures of a derived posting batch
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// Sum of debits differs from sum of credits
    #[error("Unbalanced posting: debits {debits}, credits {credits}")]
    Unbalanced { debits: Decimal, credits: Decimal },

    /// Entry holds both sides, neither side, or a negative amount
    #[error("Invalid entry for account {account_id} ({posting_key})")]
    InvalidEntry {
        account_id: String,
        posting_key: String,
    },

    /// Two entries in one batch share a posting key
    #[error("Duplicate posting key in batch: {0}")]
    DuplicatePostingKey(String),
}

impl DomainError {
    pub fn unbalanced(debits: Decimal, credits: Decimal) -> Self {
        Self::Unbalanced { debits, credits }
    }
}
