//! Common test utilities

#![allow(dead_code)]

use std::sync::Arc;

use axum::{middleware, Router};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use transport_ledger::api::{self, AppState};
use transport_ledger::domain::{Bilti, ChartOfAccounts, Party, PayMode, SourceDocument};
use transport_ledger::store::{InMemoryLedgerStore, LedgerStore};

/// Router wired the way the server wires it, minus TraceLayer
pub fn build_app(store: Arc<dyn LedgerStore>) -> Router {
    let state = AppState::new(store, ChartOfAccounts::default());
    api::create_router()
        .layer(middleware::from_fn(api::middleware::logging_middleware))
        .layer(middleware::from_fn(api::middleware::context_middleware))
        .with_state(state)
}

pub fn party(id: &str, ledger: Option<&str>) -> Party {
    Party {
        id: id.to_string(),
        name: format!("Party {}", id),
        assigned_ledger_id: ledger.map(str::to_string),
    }
}

pub fn bilti(id: &str, pay_mode: &str, consignor: &str, consignee: &str, amount: Decimal) -> Bilti {
    Bilti {
        id: id.to_string(),
        bilti_no: Some(format!("{}-NO", id)),
        branch_id: "B1".to_string(),
        miti: NaiveDate::from_ymd_opt(2024, 4, 20).unwrap(),
        nepali_miti: Some("2081-01-08".to_string()),
        consignor_id: consignor.to_string(),
        consignee_id: consignee.to_string(),
        total_amount: amount,
        pay_mode: PayMode::from(pay_mode.to_string()),
        ledger_processed: false,
    }
}

/// In-memory store seeded with parties P1 (L1), P2 (L5), P3 (no ledger),
/// bilti BL1 and the gates of daybook D1 and goods delivery GD1
pub fn seeded_store() -> Arc<InMemoryLedgerStore> {
    let store = Arc::new(InMemoryLedgerStore::new());
    store.insert_party(party("P1", Some("L1")));
    store.insert_party(party("P2", Some("L5")));
    store.insert_party(party("P3", None));
    store.insert_bilti(bilti("BL1", "To Pay", "P1", "P2", Decimal::new(5000, 0)));
    store.register_source(SourceDocument::Daybook("D1".to_string()), false);
    store.register_source(SourceDocument::GoodsDelivery("GD1".to_string()), false);
    store
}

/// Setup test database - truncate tables and seed test data
pub async fn setup_test_db() -> PgPool {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to DB");

    let mut tx = pool.begin().await.expect("Failed to begin transaction");

    sqlx::query("TRUNCATE TABLE ledger_entries, biltis, daybooks, goods_deliveries, parties CASCADE")
        .execute(&mut *tx)
        .await
        .expect("Failed to clean up DB");

    for (id, ledger) in [("L1", "Party P1"), ("L5", "Party P2")] {
        sqlx::query(
            "INSERT INTO ledger_accounts (id, label, category) VALUES ($1, $2, 'asset') ON CONFLICT (id) DO NOTHING",
        )
        .bind(id)
        .bind(ledger)
        .execute(&mut *tx)
        .await
        .expect("Failed to seed ledger account");
    }

    for (id, ledger) in [("P1", Some("L1")), ("P2", Some("L5"))] {
        sqlx::query("INSERT INTO parties (id, name, assigned_ledger_id) VALUES ($1, $2, $3)")
            .bind(id)
            .bind(format!("Party {}", id))
            .bind(ledger)
            .execute(&mut *tx)
            .await
            .expect("Failed to seed party");
    }

    sqlx::query(
        r#"
        INSERT INTO biltis (id, bilti_no, branch_id, miti, consignor_id, consignee_id, total_amount, pay_mode)
        VALUES ('BL1', '1001', 'B1', '2024-04-20', 'P1', 'P2', 5000, 'Paid')
        "#,
    )
    .execute(&mut *tx)
    .await
    .expect("Failed to seed bilti");

    tx.commit().await.expect("Failed to commit seed transaction");
    pool
}
