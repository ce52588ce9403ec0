//! Ledger posting module
//!
//! Turns a finalized business event into a balanced batch of ledger entries
//! and closes the source document's gate exactly once.

pub mod balance;
mod commands;
mod engine;
mod error;
pub mod rules;

#[cfg(test)]
mod tests;

pub use commands::{LedgerRequest, PostingOutcome, PostingStatus, SkippedLineItem};
pub use engine::LedgerPostingEngine;
pub use error::PostingError;
