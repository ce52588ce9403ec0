//! Entry derivation rules
//!
//! Pure functions from a source document (plus already-resolved accounts) to
//! ledger entries. Lookups happen in the engine; nothing here does I/O.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashSet;

use super::commands::SkippedLineItem;
use crate::domain::{
    Amount, Bilti, ChartOfAccounts, Daybook, DaybookTransaction, DaybookTransactionKind,
    DeliveredBilti, GoodsDelivery, LedgerEntry, PayMode, PostingHeader, SourceModule,
};

const NO_REASON: &str = "No reason provided";

/// Creation metadata shared by every entry of one call
#[derive(Debug, Clone)]
pub struct PostingStamp {
    pub created_at: DateTime<Utc>,
    pub created_by: String,
}

impl PostingStamp {
    pub fn new(created_by: impl Into<String>) -> Self {
        Self {
            created_at: Utc::now(),
            created_by: created_by.into(),
        }
    }
}

/// Entries plus the lines that were left out
#[derive(Debug, Default)]
pub struct Derivation {
    pub entries: Vec<LedgerEntry>,
    pub skipped: Vec<SkippedLineItem>,
}

impl Derivation {
    fn skip(&mut self, reference: &str, reason: impl Into<String>) {
        self.skipped.push(SkippedLineItem::new(reference, reason));
    }

    fn extend(&mut self, other: Derivation) {
        self.entries.extend(other.entries);
        self.skipped.extend(other.skipped);
    }
}

// =========================================================================
// Daybook
// =========================================================================

pub fn daybook_reference(daybook_id: &str, tx_id: &str) -> String {
    format!("DB-{}-{}", daybook_id, tx_id)
}

/// Derive entries for every transaction of an approved daybook.
///
/// A transaction id seen twice would reuse the first one's posting keys, so
/// the repeat is skipped.
pub fn daybook_entries(daybook: &Daybook, chart: &ChartOfAccounts, stamp: &PostingStamp) -> Derivation {
    let mut out = Derivation::default();
    let mut seen = HashSet::new();
    for tx in &daybook.transactions {
        if !seen.insert(tx.id.as_str()) {
            out.skip(
                &daybook_reference(&daybook.id, &tx.id),
                format!("duplicate transaction id {}", tx.id),
            );
            continue;
        }
        out.extend(daybook_transaction_entries(daybook, tx, chart, stamp));
    }
    out
}

fn daybook_transaction_entries(
    daybook: &Daybook,
    tx: &DaybookTransaction,
    chart: &ChartOfAccounts,
    stamp: &PostingStamp,
) -> Derivation {
    let mut out = Derivation::default();
    let reference = daybook_reference(&daybook.id, &tx.id);
    let kind = tx.kind();

    let tag = match kind.entry_tag() {
        Some(tag) => tag,
        None => {
            out.skip(
                &reference,
                format!("unrecognized transaction type '{}'", tx.transaction_type),
            );
            return out;
        }
    };

    // Only adjustments carry a direction in their sign
    let amount = match kind {
        DaybookTransactionKind::Adjustment => Amount::from_magnitude(tx.amount),
        _ => Amount::new(tx.amount),
    };
    let amount = match amount {
        Ok(amount) => amount,
        Err(_) => {
            out.skip(&reference, format!("non-positive amount {}", tx.amount));
            return out;
        }
    };

    let branch_cash = chart.branch_cash(&daybook.branch_id);
    let (debit_account, credit_account) = match kind {
        DaybookTransactionKind::CashIn => (
            branch_cash,
            tx.counter_account()
                .unwrap_or(chart.unknown_income_source.as_str())
                .to_string(),
        ),
        DaybookTransactionKind::CashOut => (
            tx.counter_account()
                .unwrap_or(chart.unknown_expense_target.as_str())
                .to_string(),
            branch_cash,
        ),
        DaybookTransactionKind::Adjustment => {
            let counter = non_blank(tx.ledger_account_id.as_deref())
                .unwrap_or(chart.adjustment.as_str())
                .to_string();
            if tx.amount >= Decimal::ZERO {
                (branch_cash, counter)
            } else {
                (counter, branch_cash)
            }
        }
        DaybookTransactionKind::Unrecognized(_) => return out,
    };

    let description = match non_blank(tx.description.as_deref()) {
        Some(text) => format!("{} - {}", tx.transaction_type, text),
        None => tx.transaction_type.clone(),
    };

    let header = PostingHeader {
        reference_no: reference,
        transaction_type: tag.to_string(),
        source_module: SourceModule::Daybook,
        branch_id: daybook.branch_id.clone(),
        miti: daybook.english_miti,
        nepali_miti: tx.nepali_miti.clone().or_else(|| daybook.nepali_miti.clone()),
        description,
        created_at: stamp.created_at,
        created_by: stamp.created_by.clone(),
    };

    out.entries
        .extend(LedgerEntry::pair(&header, debit_account, credit_account, amount));
    out
}

// =========================================================================
// Bilti
// =========================================================================

pub fn bilti_reference(bilti_id: &str) -> String {
    format!("BLT-{}", bilti_id)
}

/// Derive the freight posting of a bilti.
///
/// `consignor_account` / `consignee_account` are the parties' assigned
/// ledger accounts; the pay mode picks which one is debited.
pub fn bilti_entries(
    bilti: &Bilti,
    consignor_account: &str,
    consignee_account: &str,
    chart: &ChartOfAccounts,
    stamp: &PostingStamp,
) -> Derivation {
    let mut out = Derivation::default();
    let reference = bilti_reference(&bilti.id);

    let debit_account = match &bilti.pay_mode {
        PayMode::Paid => consignor_account,
        PayMode::ToPay | PayMode::Due => consignee_account,
        PayMode::Other(mode) => {
            out.skip(&reference, format!("unrecognized pay mode '{}'", mode));
            return out;
        }
    };

    let amount = match Amount::new(bilti.total_amount) {
        Ok(amount) => amount,
        Err(_) => {
            out.skip(
                &reference,
                format!("non-positive total amount {}", bilti.total_amount),
            );
            return out;
        }
    };

    let header = PostingHeader {
        reference_no: reference,
        transaction_type: "Bilti".to_string(),
        source_module: SourceModule::Bilti,
        branch_id: bilti.branch_id.clone(),
        miti: bilti.miti,
        nepali_miti: bilti.nepali_miti.clone(),
        description: format!("Freight for Bilti #{} ({})", bilti.display_no(), bilti.pay_mode),
        created_at: stamp.created_at,
        created_by: stamp.created_by.clone(),
    };

    out.entries.extend(LedgerEntry::pair(
        &header,
        debit_account,
        chart.freight_income.as_str(),
        amount,
    ));
    out
}

// =========================================================================
// Goods delivery
// =========================================================================

pub fn delivery_reference(delivery_id: &str, bilti_id: &str) -> String {
    format!("GD-{}-BLT-{}", delivery_id, bilti_id)
}

/// Derive rebate and discount postings for one delivered bilti.
///
/// Both credit the consignee; zero or missing amounts emit nothing.
pub fn delivery_line_entries(
    delivery: &GoodsDelivery,
    line: &DeliveredBilti,
    bilti: &Bilti,
    consignee_account: &str,
    chart: &ChartOfAccounts,
    stamp: &PostingStamp,
) -> Derivation {
    let mut out = Derivation::default();
    let reference = delivery_reference(&delivery.id, &line.bilti_id);

    let allowances = [
        (
            "Rebate",
            line.rebate_amount,
            line.rebate_reason.as_deref(),
            chart.rebate_expense.as_str(),
        ),
        (
            "Discount",
            line.discount_amount,
            line.discount_reason.as_deref(),
            chart.discount_expense.as_str(),
        ),
    ];

    for (label, value, reason, expense_account) in allowances {
        let amount = match value.filter(|v| *v > Decimal::ZERO).map(Amount::new) {
            Some(Ok(amount)) => amount,
            _ => continue,
        };

        let header = PostingHeader {
            reference_no: reference.clone(),
            transaction_type: label.to_string(),
            source_module: SourceModule::GoodsDelivery,
            branch_id: delivery.branch_id.clone(),
            miti: delivery.miti,
            nepali_miti: delivery.nepali_miti.clone(),
            description: format!(
                "{} on Bilti #{}: {}",
                label,
                bilti.display_no(),
                non_blank(reason).unwrap_or(NO_REASON)
            ),
            created_at: stamp.created_at,
            created_by: stamp.created_by.clone(),
        };

        // Consignee credit first, then the expense debit
        let [debit, credit] = LedgerEntry::pair(&header, expense_account, consignee_account, amount);
        out.entries.push(credit);
        out.entries.push(debit);
    }

    out
}

/// Record a delivery line that could not be resolved
pub fn skip_delivery_line(delivery: &GoodsDelivery, line: &DeliveredBilti, reason: impl Into<String>) -> SkippedLineItem {
    SkippedLineItem::new(delivery_reference(&delivery.id, &line.bilti_id), reason)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
