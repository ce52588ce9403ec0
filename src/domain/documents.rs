//! Source documents
//!
//! Payloads of the three business events that drive posting. Field names
//! follow the JSON the back-office screens send (camelCase).

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

// =========================================================================
// Daybook
// =========================================================================

/// Workflow status; only `Approved` daybooks are posted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DaybookStatus {
    Pending,
    Approved,
    Rejected,
    Other(String),
}

impl From<String> for DaybookStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Pending" => DaybookStatus::Pending,
            "Approved" => DaybookStatus::Approved,
            "Rejected" => DaybookStatus::Rejected,
            _ => DaybookStatus::Other(s),
        }
    }
}

impl From<DaybookStatus> for String {
    fn from(status: DaybookStatus) -> Self {
        status.to_string()
    }
}

impl fmt::Display for DaybookStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DaybookStatus::Pending => f.write_str("Pending"),
            DaybookStatus::Approved => f.write_str("Approved"),
            DaybookStatus::Rejected => f.write_str("Rejected"),
            DaybookStatus::Other(s) => f.write_str(s),
        }
    }
}

/// Branch-day aggregate of manual cash transactions
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Daybook {
    pub id: String,
    pub branch_id: String,
    pub english_miti: NaiveDate,
    #[serde(default)]
    pub nepali_miti: Option<String>,
    pub status: DaybookStatus,
    #[serde(default)]
    pub processed_by_function: bool,
    #[serde(default)]
    pub transactions: Vec<DaybookTransaction>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaybookTransaction {
    pub id: String,
    pub transaction_type: String,
    pub amount: Decimal,
    #[serde(default)]
    pub ledger_account_id: Option<String>,
    #[serde(default)]
    pub party_id: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub nepali_miti: Option<String>,
}

impl DaybookTransaction {
    /// Counter-account named by the transaction: ledger account, then party
    pub fn counter_account(&self) -> Option<&str> {
        non_blank(self.ledger_account_id.as_deref()).or_else(|| non_blank(self.party_id.as_deref()))
    }

    pub fn kind(&self) -> DaybookTransactionKind {
        DaybookTransactionKind::classify(&self.transaction_type)
    }
}

const ADJUSTMENT_LABEL: &str = "Adjustment/Correction";

/// Posting class of a daybook transaction, derived from its free-text type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DaybookTransactionKind {
    CashIn,
    CashOut,
    Adjustment,
    Unrecognized(String),
}

impl DaybookTransactionKind {
    /// Classify a transaction type label.
    ///
    /// "cash in" / "cash out" match anywhere in the label, ignoring case.
    /// Adjustments must match the label exactly.
    pub fn classify(label: &str) -> Self {
        let lowered = label.to_lowercase();
        if lowered.contains("cash in") {
            DaybookTransactionKind::CashIn
        } else if lowered.contains("cash out") {
            DaybookTransactionKind::CashOut
        } else if label == ADJUSTMENT_LABEL {
            DaybookTransactionKind::Adjustment
        } else {
            DaybookTransactionKind::Unrecognized(label.to_string())
        }
    }

    /// Transaction-type tag written on the entries
    pub fn entry_tag(&self) -> Option<&'static str> {
        match self {
            DaybookTransactionKind::CashIn => Some("DaybookCashIn"),
            DaybookTransactionKind::CashOut => Some("DaybookCashOut"),
            DaybookTransactionKind::Adjustment => Some("DaybookAdjustment"),
            DaybookTransactionKind::Unrecognized(_) => None,
        }
    }
}

// =========================================================================
// Bilti
// =========================================================================

/// Who settles the freight
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PayMode {
    Paid,
    ToPay,
    Due,
    Other(String),
}

impl From<String> for PayMode {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Paid" => PayMode::Paid,
            "To Pay" => PayMode::ToPay,
            "Due" => PayMode::Due,
            _ => PayMode::Other(s),
        }
    }
}

impl From<PayMode> for String {
    fn from(mode: PayMode) -> Self {
        mode.to_string()
    }
}

impl fmt::Display for PayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayMode::Paid => f.write_str("Paid"),
            PayMode::ToPay => f.write_str("To Pay"),
            PayMode::Due => f.write_str("Due"),
            PayMode::Other(s) => f.write_str(s),
        }
    }
}

/// Freight invoice
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bilti {
    pub id: String,
    #[serde(default)]
    pub bilti_no: Option<String>,
    pub branch_id: String,
    pub miti: NaiveDate,
    #[serde(default)]
    pub nepali_miti: Option<String>,
    pub consignor_id: String,
    pub consignee_id: String,
    pub total_amount: Decimal,
    pub pay_mode: PayMode,
    #[serde(default)]
    pub ledger_processed: bool,
}

impl Bilti {
    /// Number shown on paper, falling back to the document id
    pub fn display_no(&self) -> &str {
        non_blank(self.bilti_no.as_deref()).unwrap_or(self.id.as_str())
    }
}

// =========================================================================
// Goods delivery
// =========================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoodsDelivery {
    pub id: String,
    pub branch_id: String,
    pub miti: NaiveDate,
    #[serde(default)]
    pub nepali_miti: Option<String>,
    #[serde(default)]
    pub delivered_biltis: Vec<DeliveredBilti>,
    #[serde(default)]
    pub ledger_processed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveredBilti {
    pub bilti_id: String,
    #[serde(default)]
    pub rebate_amount: Option<Decimal>,
    #[serde(default)]
    pub rebate_reason: Option<String>,
    #[serde(default)]
    pub discount_amount: Option<Decimal>,
    #[serde(default)]
    pub discount_reason: Option<String>,
}

// =========================================================================
// Party
// =========================================================================

/// Consignor / consignee record, as far as posting needs it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Party {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub assigned_ledger_id: Option<String>,
}

impl Party {
    pub fn ledger_account(&self) -> Option<&str> {
        non_blank(self.assigned_ledger_id.as_deref())
    }
}

// =========================================================================
// Source reference
// =========================================================================

/// Identifies the document whose gate a posting closes
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id")]
pub enum SourceDocument {
    Daybook(String),
    Bilti(String),
    GoodsDelivery(String),
}

impl SourceDocument {
    pub fn id(&self) -> &str {
        match self {
            SourceDocument::Daybook(id)
            | SourceDocument::Bilti(id)
            | SourceDocument::GoodsDelivery(id) => id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            SourceDocument::Daybook(_) => "daybook",
            SourceDocument::Bilti(_) => "bilti",
            SourceDocument::GoodsDelivery(_) => "goods_delivery",
        }
    }
}

impl fmt::Display for SourceDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind(), self.id())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
