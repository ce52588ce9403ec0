//! transport-ledger Library
//!
//! Ledger posting for transport back-office events. Re-exports modules for
//! the server binary and integration tests.

pub mod api;
pub mod config;
pub mod db;
pub mod domain;
mod error;
pub mod posting;
pub mod store;

pub use config::Config;
pub use domain::{ChartOfAccounts, DomainError, LedgerEntry, OperationContext};
pub use error::{AppError, ErrorResponse};
pub use posting::{LedgerPostingEngine, LedgerRequest, PostingError, PostingOutcome};
