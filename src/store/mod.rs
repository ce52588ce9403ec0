//! Ledger store
//!
//! Persistence port used by the posting engine: party and bilti lookups,
//! the atomic "insert entries + close gate" commit, and ledger queries.

mod memory;
mod postgres;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{Bilti, LedgerEntry, Party, SourceDocument, SourceModule};

pub use memory::InMemoryLedgerStore;
pub use postgres::PgLedgerStore;

/// Store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Source document not found: {0}")]
    SourceNotFound(SourceDocument),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Result of an atomic posting commit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Entries written and gate closed in one unit
    Committed { inserted: usize },
    /// Gate was already closed when the row lock was taken; nothing written
    AlreadyProcessed,
}

/// Filter for ledger entry queries
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryFilter {
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub branch_id: Option<String>,
    #[serde(default)]
    pub reference_no: Option<String>,
    #[serde(default)]
    pub source_module: Option<SourceModule>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    100
}

impl EntryFilter {
    pub fn matches(&self, entry: &LedgerEntry) -> bool {
        self.account_id.as_ref().map_or(true, |a| &entry.account_id == a)
            && self.branch_id.as_ref().map_or(true, |b| &entry.branch_id == b)
            && self.reference_no.as_ref().map_or(true, |r| &entry.reference_no == r)
            && self.source_module.map_or(true, |m| entry.source_module == m)
    }
}

/// Running totals of an account over approved entries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountBalance {
    pub account_id: String,
    pub total_debit: Decimal,
    pub total_credit: Decimal,
    /// Debit minus credit
    pub balance: Decimal,
}

impl AccountBalance {
    pub fn new(account_id: impl Into<String>, total_debit: Decimal, total_credit: Decimal) -> Self {
        Self {
            account_id: account_id.into(),
            total_debit,
            total_credit,
            balance: total_debit - total_credit,
        }
    }
}

/// Persistence port for the posting engine.
///
/// Party and bilti tables are read-only from the engine's side. The only
/// write is `commit_posting`, which must be atomic: either every entry is
/// stored and the source gate flips to true, or nothing changes.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn find_party(&self, party_id: &str) -> Result<Option<Party>, StoreError>;

    async fn find_bilti(&self, bilti_id: &str) -> Result<Option<Bilti>, StoreError>;

    /// Insert `entries` and close the gate of `source` in one unit.
    ///
    /// Implementations lock the source row, return
    /// `CommitOutcome::AlreadyProcessed` if its gate is already closed, and
    /// ignore entries whose posting key is already stored.
    async fn commit_posting(
        &self,
        source: &SourceDocument,
        entries: &[LedgerEntry],
    ) -> Result<CommitOutcome, StoreError>;

    async fn list_entries(&self, filter: &EntryFilter) -> Result<Vec<LedgerEntry>, StoreError>;

    async fn account_balance(&self, account_id: &str) -> Result<AccountBalance, StoreError>;
}
