//! Postgres ledger store
//!
//! The commit runs in one transaction: lock the source row, check the gate,
//! insert entries (`ON CONFLICT (posting_key) DO NOTHING`), flip the gate
//! conditionally, commit.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};

use super::{AccountBalance, CommitOutcome, EntryFilter, LedgerStore, StoreError};
use crate::domain::{Bilti, EntryStatus, LedgerEntry, Party, PayMode, SourceDocument, SourceModule};

/// sqlx-backed store
#[derive(Debug, Clone)]
pub struct PgLedgerStore {
    pool: PgPool,
}

/// Table and gate column of each source document kind
fn gate_location(source: &SourceDocument) -> (&'static str, &'static str) {
    match source {
        SourceDocument::Daybook(_) => ("daybooks", "processed_by_function"),
        SourceDocument::Bilti(_) => ("biltis", "ledger_processed"),
        SourceDocument::GoodsDelivery(_) => ("goods_deliveries", "ledger_processed"),
    }
}

#[derive(Debug, sqlx::FromRow)]
struct LedgerEntryRow {
    account_id: String,
    miti: NaiveDate,
    nepali_miti: Option<String>,
    description: String,
    debit: Decimal,
    credit: Decimal,
    reference_no: String,
    transaction_type: String,
    status: String,
    source_module: String,
    branch_id: String,
    created_at: DateTime<Utc>,
    created_by: String,
    posting_key: String,
}

impl TryFrom<LedgerEntryRow> for LedgerEntry {
    type Error = StoreError;

    fn try_from(row: LedgerEntryRow) -> Result<Self, Self::Error> {
        let source_module = SourceModule::parse(&row.source_module).ok_or_else(|| {
            StoreError::Unavailable(format!("unknown source module '{}'", row.source_module))
        })?;

        Ok(LedgerEntry {
            account_id: row.account_id,
            miti: row.miti,
            nepali_miti: row.nepali_miti,
            description: row.description,
            debit: row.debit,
            credit: row.credit,
            reference_no: row.reference_no,
            transaction_type: row.transaction_type,
            status: EntryStatus::from(row.status),
            source_module,
            branch_id: row.branch_id,
            created_at: row.created_at,
            created_by: row.created_by,
            posting_key: row.posting_key,
        })
    }
}

impl PgLedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn insert_entry(
        tx: &mut Transaction<'_, Postgres>,
        entry: &LedgerEntry,
    ) -> Result<bool, StoreError> {
        let rows = sqlx::query(
            r#"
            INSERT INTO ledger_entries (
                account_id, miti, nepali_miti, description, debit, credit,
                reference_no, transaction_type, status, source_module,
                branch_id, created_at, created_by, posting_key
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            ON CONFLICT (posting_key) DO NOTHING
            "#,
        )
        .bind(&entry.account_id)
        .bind(entry.miti)
        .bind(&entry.nepali_miti)
        .bind(&entry.description)
        .bind(entry.debit)
        .bind(entry.credit)
        .bind(&entry.reference_no)
        .bind(&entry.transaction_type)
        .bind(entry.status.as_str())
        .bind(entry.source_module.as_str())
        .bind(&entry.branch_id)
        .bind(entry.created_at)
        .bind(&entry.created_by)
        .bind(&entry.posting_key)
        .execute(&mut **tx)
        .await?
        .rows_affected();

        Ok(rows == 1)
    }
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    async fn find_party(&self, party_id: &str) -> Result<Option<Party>, StoreError> {
        let row: Option<(String, String, Option<String>)> = sqlx::query_as(
            r#"
            SELECT id, name, assigned_ledger_id
            FROM parties
            WHERE id = $1
            "#,
        )
        .bind(party_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(id, name, assigned_ledger_id)| Party {
            id,
            name,
            assigned_ledger_id,
        }))
    }

    async fn find_bilti(&self, bilti_id: &str) -> Result<Option<Bilti>, StoreError> {
        #[allow(clippy::type_complexity)]
        let row: Option<(
            String,
            Option<String>,
            String,
            NaiveDate,
            Option<String>,
            String,
            String,
            Decimal,
            String,
            bool,
        )> = sqlx::query_as(
            r#"
            SELECT id, bilti_no, branch_id, miti, nepali_miti,
                   consignor_id, consignee_id, total_amount, pay_mode, ledger_processed
            FROM biltis
            WHERE id = $1
            "#,
        )
        .bind(bilti_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(
            |(id, bilti_no, branch_id, miti, nepali_miti, consignor_id, consignee_id, total_amount, pay_mode, ledger_processed)| {
                Bilti {
                    id,
                    bilti_no,
                    branch_id,
                    miti,
                    nepali_miti,
                    consignor_id,
                    consignee_id,
                    total_amount,
                    pay_mode: PayMode::from(pay_mode),
                    ledger_processed,
                }
            },
        ))
    }

    async fn commit_posting(
        &self,
        source: &SourceDocument,
        entries: &[LedgerEntry],
    ) -> Result<CommitOutcome, StoreError> {
        let (table, gate) = gate_location(source);
        let mut tx = self.pool.begin().await?;

        // Row lock serializes concurrent postings of the same document
        let current: Option<bool> =
            sqlx::query_scalar(&format!("SELECT {gate} FROM {table} WHERE id = $1 FOR UPDATE"))
                .bind(source.id())
                .fetch_optional(&mut *tx)
                .await?;

        match current {
            None => {
                tx.rollback().await?;
                return Err(StoreError::SourceNotFound(source.clone()));
            }
            Some(true) => {
                tx.rollback().await?;
                return Ok(CommitOutcome::AlreadyProcessed);
            }
            Some(false) => {}
        }

        let mut inserted = 0;
        for entry in entries {
            if Self::insert_entry(&mut tx, entry).await? {
                inserted += 1;
            }
        }

        let flipped = sqlx::query(&format!(
            "UPDATE {table} SET {gate} = true, updated_at = NOW() WHERE id = $1 AND {gate} = false"
        ))
        .bind(source.id())
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if flipped != 1 {
            tx.rollback().await?;
            return Ok(CommitOutcome::AlreadyProcessed);
        }

        tx.commit().await?;

        Ok(CommitOutcome::Committed { inserted })
    }

    async fn list_entries(&self, filter: &EntryFilter) -> Result<Vec<LedgerEntry>, StoreError> {
        let rows: Vec<LedgerEntryRow> = sqlx::query_as(
            r#"
            SELECT account_id, miti, nepali_miti, description, debit, credit,
                   reference_no, transaction_type, status, source_module,
                   branch_id, created_at, created_by, posting_key
            FROM ledger_entries
            WHERE ($1::text IS NULL OR account_id = $1)
              AND ($2::text IS NULL OR branch_id = $2)
              AND ($3::text IS NULL OR reference_no = $3)
              AND ($4::text IS NULL OR source_module = $4)
            ORDER BY miti, id
            LIMIT $5 OFFSET $6
            "#,
        )
        .bind(&filter.account_id)
        .bind(&filter.branch_id)
        .bind(&filter.reference_no)
        .bind(filter.source_module.map(|m| m.as_str()))
        .bind(filter.limit)
        .bind(filter.offset)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(LedgerEntry::try_from).collect()
    }

    async fn account_balance(&self, account_id: &str) -> Result<AccountBalance, StoreError> {
        let (total_debit, total_credit): (Decimal, Decimal) = sqlx::query_as(
            r#"
            SELECT COALESCE(SUM(debit), 0), COALESCE(SUM(credit), 0)
            FROM ledger_entries
            WHERE account_id = $1 AND status = 'Approved'
            "#,
        )
        .bind(account_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(AccountBalance::new(account_id, total_debit, total_credit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_location() {
        assert_eq!(
            gate_location(&SourceDocument::Daybook("D1".to_string())),
            ("daybooks", "processed_by_function")
        );
        assert_eq!(
            gate_location(&SourceDocument::Bilti("B1".to_string())),
            ("biltis", "ledger_processed")
        );
        assert_eq!(
            gate_location(&SourceDocument::GoodsDelivery("G1".to_string())),
            ("goods_deliveries", "ledger_processed")
        );
    }

    #[test]
    fn test_row_with_unknown_module_is_rejected() {
        let row = LedgerEntryRow {
            account_id: "L1".to_string(),
            miti: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            nepali_miti: None,
            description: String::new(),
            debit: Decimal::ONE,
            credit: Decimal::ZERO,
            reference_no: "X".to_string(),
            transaction_type: "Bilti".to_string(),
            status: "Approved".to_string(),
            source_module: "Manifest".to_string(),
            branch_id: "B1".to_string(),
            created_at: Utc::now(),
            created_by: "system".to_string(),
            posting_key: "X:Bilti:D".to_string(),
        };

        assert!(LedgerEntry::try_from(row).is_err());
    }
}
