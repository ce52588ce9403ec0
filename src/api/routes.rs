//! API Routes
//!
//! HTTP endpoint definitions.

use axum::{
    extract::{Extension, Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::domain::{LedgerEntry, OperationContext};
use crate::error::AppError;
use crate::posting::{LedgerPostingEngine, LedgerRequest, SkippedLineItem};
use crate::store::{AccountBalance, EntryFilter};

use super::AppState;

/// Cap on entries returned by one listing call
const MAX_PAGE_SIZE: i64 = 500;

// =========================================================================
// Request/Response types
// =========================================================================

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostingResponse {
    pub message: String,
    pub entries_posted: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedLineItem>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntriesResponse {
    pub entries: Vec<LedgerEntry>,
    pub count: usize,
}

// =========================================================================
// API Router
// =========================================================================

/// Create the API router
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/ledger/process", post(process_ledger_request))
        .route("/ledger/entries", get(list_entries))
        .route("/ledger/accounts/:account_id/balance", get(get_account_balance))
}

// =========================================================================
// POST /ledger/process
// =========================================================================

/// Run one posting operation. Not-eligible sources answer 200 with a message.
async fn process_ledger_request(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    Json(request): Json<LedgerRequest>,
) -> Result<Json<PostingResponse>, AppError> {
    tracing::debug!(source = %request.source(), "Processing ledger request");
    let engine = LedgerPostingEngine::new(state.store.clone(), state.chart.clone());

    let outcome = engine.process(&request, &context).await?;

    Ok(Json(PostingResponse {
        message: outcome.message(),
        entries_posted: outcome.entries.len(),
        skipped: outcome.skipped,
    }))
}

// =========================================================================
// GET /ledger/entries
// =========================================================================

async fn list_entries(
    State(state): State<AppState>,
    Query(mut filter): Query<EntryFilter>,
) -> Result<Json<EntriesResponse>, AppError> {
    if filter.limit < 0 || filter.offset < 0 {
        return Err(AppError::InvalidRequest(
            "limit and offset must be non-negative".to_string(),
        ));
    }
    filter.limit = filter.limit.min(MAX_PAGE_SIZE);

    let entries = state.store.list_entries(&filter).await?;

    Ok(Json(EntriesResponse {
        count: entries.len(),
        entries,
    }))
}

// =========================================================================
// GET /ledger/accounts/:account_id/balance
// =========================================================================

async fn get_account_balance(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
) -> Result<Json<AccountBalance>, AppError> {
    let balance = state.store.account_balance(&account_id).await?;
    Ok(Json(balance))
}
