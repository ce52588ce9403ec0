//! Database module
//!
//! Connectivity and schema checks run at startup. The schema itself lives in
//! raw SQL files under migrations/.

use sqlx::PgPool;

use crate::domain::ChartOfAccounts;

const REQUIRED_TABLES: &[&str] = &[
    "ledger_accounts",
    "parties",
    "biltis",
    "daybooks",
    "goods_deliveries",
    "ledger_entries",
];

/// Verify database connectivity
pub async fn verify_connection(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Check that required tables and the configured system accounts exist
pub async fn check_schema(pool: &PgPool, chart: &ChartOfAccounts) -> Result<bool, sqlx::Error> {
    for table in REQUIRED_TABLES {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM information_schema.tables
                WHERE table_schema = 'public' AND table_name = $1
            )
            "#,
        )
        .bind(table)
        .fetch_one(pool)
        .await?;

        if !exists {
            tracing::error!("Required table '{}' does not exist", table);
            return Ok(false);
        }
    }

    check_system_accounts(pool, chart).await
}

/// Check that every fixed account of the chart is present in ledger_accounts
async fn check_system_accounts(pool: &PgPool, chart: &ChartOfAccounts) -> Result<bool, sqlx::Error> {
    let mut all_present = true;

    for account in chart.system_accounts() {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM ledger_accounts WHERE id = $1)")
                .bind(&account.id)
                .fetch_one(pool)
                .await?;

        if !exists {
            tracing::error!(
                "Required system account '{}' ({}) does not exist. Please run database seed.",
                account.id,
                account.label
            );
            all_present = false;
        }
    }

    if all_present {
        tracing::info!("System ledger accounts verified");
    }
    Ok(all_present)
}
