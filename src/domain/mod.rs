//! Domain module
//!
//! Core domain types: accounts, entries and the source documents that drive
//! posting.

pub mod account;
pub mod amount;
pub mod context;
pub mod documents;
pub mod entry;
pub mod error;

pub use account::{AccountCategory, ChartOfAccounts, LedgerAccount};
pub use amount::{Amount, AmountError};
pub use context::OperationContext;
pub use documents::{
    Bilti, Daybook, DaybookStatus, DaybookTransaction, DaybookTransactionKind, DeliveredBilti,
    GoodsDelivery, Party, PayMode, SourceDocument,
};
pub use entry::{EntrySide, EntryStatus, LedgerEntry, PostingHeader, SourceModule};
pub use error::DomainError;
