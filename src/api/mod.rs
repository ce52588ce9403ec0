//! API module
//!
//! HTTP API endpoints and middleware.

pub mod middleware;
pub mod routes;

use std::sync::Arc;

use crate::domain::ChartOfAccounts;
use crate::store::LedgerStore;

pub use routes::create_router;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn LedgerStore>,
    pub chart: ChartOfAccounts,
}

impl AppState {
    pub fn new(store: Arc<dyn LedgerStore>, chart: ChartOfAccounts) -> Self {
        Self { store, chart }
    }
}
