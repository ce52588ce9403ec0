//! Balance and shape checks for a derived posting batch.

use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashSet};

use crate::domain::{DomainError, EntrySide, LedgerEntry};

/// Validate a batch before it is persisted.
///
/// Every entry must hold a positive amount on exactly one side, posting keys
/// must be unique, and each reference must balance on its own. An empty
/// batch is valid.
pub fn validate_batch(entries: &[LedgerEntry]) -> Result<(), DomainError> {
    let mut keys = HashSet::with_capacity(entries.len());
    let mut per_reference: BTreeMap<&str, (Decimal, Decimal)> = BTreeMap::new();

    for entry in entries {
        let side = entry.side().ok_or_else(|| DomainError::InvalidEntry {
            account_id: entry.account_id.clone(),
            posting_key: entry.posting_key.clone(),
        })?;

        if !keys.insert(entry.posting_key.as_str()) {
            return Err(DomainError::DuplicatePostingKey(entry.posting_key.clone()));
        }

        let totals = per_reference
            .entry(entry.reference_no.as_str())
            .or_insert((Decimal::ZERO, Decimal::ZERO));
        match side {
            EntrySide::Debit => totals.0 += entry.debit,
            EntrySide::Credit => totals.1 += entry.credit,
        }
    }

    for (debits, credits) in per_reference.into_values() {
        if debits != credits {
            return Err(DomainError::unbalanced(debits, credits));
        }
    }

    Ok(())
}

/// Sum of debits and sum of credits
pub fn totals(entries: &[LedgerEntry]) -> (Decimal, Decimal) {
    entries
        .iter()
        .fold((Decimal::ZERO, Decimal::ZERO), |(d, c), e| (d + e.debit, c + e.credit))
}
