//! Ledger entries
//!
//! One half of a double-entry posting. An entry holds its amount on exactly
//! one side; the other side is zero.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::Amount;

/// Side of a ledger entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntrySide {
    Debit,
    Credit,
}

impl EntrySide {
    fn key_suffix(&self) -> &'static str {
        match self {
            EntrySide::Debit => "D",
            EntrySide::Credit => "C",
        }
    }
}

/// Entry status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryStatus {
    Pending,
    Approved,
    Rejected,
}

impl EntryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryStatus::Pending => "Pending",
            EntryStatus::Approved => "Approved",
            EntryStatus::Rejected => "Rejected",
        }
    }
}

impl From<String> for EntryStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Approved" => EntryStatus::Approved,
            "Rejected" => EntryStatus::Rejected,
            _ => EntryStatus::Pending,
        }
    }
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Module whose document produced the entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceModule {
    Daybook,
    Bilti,
    GoodsDelivery,
}

impl SourceModule {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceModule::Daybook => "Daybook",
            SourceModule::Bilti => "Bilti",
            SourceModule::GoodsDelivery => "GoodsDelivery",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Daybook" => Some(SourceModule::Daybook),
            "Bilti" => Some(SourceModule::Bilti),
            "GoodsDelivery" => Some(SourceModule::GoodsDelivery),
            _ => None,
        }
    }
}

impl fmt::Display for SourceModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields shared by both halves of one posting
#[derive(Debug, Clone)]
pub struct PostingHeader {
    pub reference_no: String,
    pub transaction_type: String,
    pub source_module: SourceModule,
    pub branch_id: String,
    pub miti: NaiveDate,
    pub nepali_miti: Option<String>,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
}

/// A single persisted ledger line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub account_id: String,
    pub miti: NaiveDate,
    pub nepali_miti: Option<String>,
    pub description: String,
    pub debit: Decimal,
    pub credit: Decimal,
    pub reference_no: String,
    pub transaction_type: String,
    pub status: EntryStatus,
    pub source_module: SourceModule,
    pub branch_id: String,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    /// `<referenceNo>:<transactionType>:<D|C>`, unique per ledger
    pub posting_key: String,
}

impl LedgerEntry {
    /// Build one side of a posting. The opposite side is always zero.
    pub fn new(header: &PostingHeader, account_id: impl Into<String>, side: EntrySide, amount: Amount) -> Self {
        let (debit, credit) = match side {
            EntrySide::Debit => (amount.value(), Decimal::ZERO),
            EntrySide::Credit => (Decimal::ZERO, amount.value()),
        };

        Self {
            account_id: account_id.into(),
            miti: header.miti,
            nepali_miti: header.nepali_miti.clone(),
            description: header.description.clone(),
            debit,
            credit,
            reference_no: header.reference_no.clone(),
            transaction_type: header.transaction_type.clone(),
            status: EntryStatus::Approved,
            source_module: header.source_module,
            branch_id: header.branch_id.clone(),
            created_at: header.created_at,
            created_by: header.created_by.clone(),
            posting_key: format!(
                "{}:{}:{}",
                header.reference_no,
                header.transaction_type,
                side.key_suffix()
            ),
        }
    }

    /// Balanced debit/credit pair for one logical posting
    pub fn pair(
        header: &PostingHeader,
        debit_account: impl Into<String>,
        credit_account: impl Into<String>,
        amount: Amount,
    ) -> [LedgerEntry; 2] {
        [
            LedgerEntry::new(header, debit_account, EntrySide::Debit, amount),
            LedgerEntry::new(header, credit_account, EntrySide::Credit, amount),
        ]
    }

    /// Side holding the amount, or None if the entry breaks the debit-xor-credit rule
    pub fn side(&self) -> Option<EntrySide> {
        match (self.debit > Decimal::ZERO, self.credit > Decimal::ZERO) {
            (true, false) if self.credit.is_zero() => Some(EntrySide::Debit),
            (false, true) if self.debit.is_zero() => Some(EntrySide::Credit),
            _ => None,
        }
    }

    pub fn amount(&self) -> Decimal {
        self.debit + self.credit
    }
}
