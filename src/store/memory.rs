//! In-memory ledger store
//!
//! Backs the engine in tests and local runs without Postgres. A single
//! mutex guards all state, so `commit_posting` is atomic the same way the
//! Postgres transaction is.

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use super::{AccountBalance, CommitOutcome, EntryFilter, LedgerStore, StoreError};
use crate::domain::{Bilti, EntryStatus, LedgerEntry, Party, SourceDocument};

#[derive(Debug, Default)]
struct State {
    parties: HashMap<String, Party>,
    biltis: HashMap<String, Bilti>,
    gates: HashMap<SourceDocument, bool>,
    entries: Vec<LedgerEntry>,
    posting_keys: HashSet<String>,
    fail_next_commit: bool,
}

/// Mutex-guarded store
#[derive(Debug, Default)]
pub struct InMemoryLedgerStore {
    state: Mutex<State>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::Unavailable("in-memory store poisoned".to_string()))
    }

    pub fn insert_party(&self, party: Party) {
        if let Ok(mut state) = self.lock() {
            state.parties.insert(party.id.clone(), party);
        }
    }

    /// Register a bilti and its gate
    pub fn insert_bilti(&self, bilti: Bilti) {
        if let Ok(mut state) = self.lock() {
            state
                .gates
                .insert(SourceDocument::Bilti(bilti.id.clone()), bilti.ledger_processed);
            state.biltis.insert(bilti.id.clone(), bilti);
        }
    }

    /// Register the gate of a daybook or goods delivery
    pub fn register_source(&self, source: SourceDocument, processed: bool) {
        if let Ok(mut state) = self.lock() {
            state.gates.insert(source, processed);
        }
    }

    /// Current gate value, None if the source is unknown
    pub fn gate(&self, source: &SourceDocument) -> Option<bool> {
        self.lock().ok().and_then(|state| state.gates.get(source).copied())
    }

    /// Make the next commit fail before anything is written
    pub fn fail_next_commit(&self) {
        if let Ok(mut state) = self.lock() {
            state.fail_next_commit = true;
        }
    }

    pub fn entries(&self) -> Vec<LedgerEntry> {
        self.lock().map(|state| state.entries.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn find_party(&self, party_id: &str) -> Result<Option<Party>, StoreError> {
        Ok(self.lock()?.parties.get(party_id).cloned())
    }

    async fn find_bilti(&self, bilti_id: &str) -> Result<Option<Bilti>, StoreError> {
        Ok(self.lock()?.biltis.get(bilti_id).cloned())
    }

    async fn commit_posting(
        &self,
        source: &SourceDocument,
        entries: &[LedgerEntry],
    ) -> Result<CommitOutcome, StoreError> {
        let mut state = self.lock()?;

        if state.fail_next_commit {
            state.fail_next_commit = false;
            return Err(StoreError::Unavailable("injected commit failure".to_string()));
        }

        match state.gates.get(source) {
            None => return Err(StoreError::SourceNotFound(source.clone())),
            Some(true) => return Ok(CommitOutcome::AlreadyProcessed),
            Some(false) => {}
        }

        let mut inserted = 0;
        for entry in entries {
            if state.posting_keys.insert(entry.posting_key.clone()) {
                state.entries.push(entry.clone());
                inserted += 1;
            }
        }
        state.gates.insert(source.clone(), true);

        if let SourceDocument::Bilti(id) = source {
            if let Some(bilti) = state.biltis.get_mut(id) {
                bilti.ledger_processed = true;
            }
        }

        Ok(CommitOutcome::Committed { inserted })
    }

    async fn list_entries(&self, filter: &EntryFilter) -> Result<Vec<LedgerEntry>, StoreError> {
        let state = self.lock()?;
        let offset = usize::try_from(filter.offset.max(0)).unwrap_or(0);
        let limit = usize::try_from(filter.limit.max(0)).unwrap_or(0);

        Ok(state
            .entries
            .iter()
            .filter(|e| filter.matches(e))
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn account_balance(&self, account_id: &str) -> Result<AccountBalance, StoreError> {
        let state = self.lock()?;
        let (debit, credit) = state
            .entries
            .iter()
            .filter(|e| e.account_id == account_id && e.status == EntryStatus::Approved)
            .fold((Decimal::ZERO, Decimal::ZERO), |(d, c), e| (d + e.debit, c + e.credit));

        Ok(AccountBalance::new(account_id, debit, credit))
    }
}
