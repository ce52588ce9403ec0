//! Ledger accounts and the chart of system accounts
//!
//! Parties, branches, trucks and drivers each carry an `assignedLedgerId`
//! created alongside them. The remaining accounts the posting rules need
//! (freight income, rebate/discount expense, fallbacks) come from the
//! chart of accounts, which is configuration rather than code.

use serde::{Deserialize, Serialize};

/// Account category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountCategory {
    Asset,
    Income,
    Expense,
    Liability,
}

/// A ledgible entity: party, branch cash pool or fixed system account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerAccount {
    pub id: String,
    pub label: String,
    pub category: AccountCategory,
}

impl LedgerAccount {
    pub fn new(id: impl Into<String>, label: impl Into<String>, category: AccountCategory) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            category,
        }
    }
}

/// System account ids used by the posting rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartOfAccounts {
    pub freight_income: String,
    pub rebate_expense: String,
    pub discount_expense: String,
    /// Credit side of a cash-in with no account or party attached
    pub unknown_income_source: String,
    /// Debit side of a cash-out with no account or party attached
    pub unknown_expense_target: String,
    pub adjustment: String,
    /// Prefix joined with the branch id to form the branch cash account
    pub branch_cash_prefix: String,
}

impl Default for ChartOfAccounts {
    fn default() -> Self {
        Self {
            freight_income: "ACC_FREIGHT_INCOME".to_string(),
            rebate_expense: "ACC_REBATE_EXPENSE".to_string(),
            discount_expense: "ACC_DISCOUNT_EXPENSE".to_string(),
            unknown_income_source: "UNKNOWN_INCOME_SOURCE".to_string(),
            unknown_expense_target: "UNKNOWN_EXPENSE_TARGET".to_string(),
            adjustment: "ADJUSTMENT_ACCOUNT".to_string(),
            branch_cash_prefix: "BRANCH_CASH_".to_string(),
        }
    }
}

impl ChartOfAccounts {
    /// Cash account of a branch
    pub fn branch_cash(&self, branch_id: &str) -> String {
        format!("{}{}", self.branch_cash_prefix, branch_id)
    }

    /// Fixed accounts as ledger account records
    pub fn system_accounts(&self) -> Vec<LedgerAccount> {
        vec![
            LedgerAccount::new(&self.freight_income, "Freight Income", AccountCategory::Income),
            LedgerAccount::new(&self.rebate_expense, "Rebate Expense", AccountCategory::Expense),
            LedgerAccount::new(&self.discount_expense, "Discount Expense", AccountCategory::Expense),
            LedgerAccount::new(
                &self.unknown_income_source,
                "Unknown Income Source",
                AccountCategory::Income,
            ),
            LedgerAccount::new(
                &self.unknown_expense_target,
                "Unknown Expense Target",
                AccountCategory::Expense,
            ),
            LedgerAccount::new(&self.adjustment, "Adjustments", AccountCategory::Liability),
        ]
    }
}
