//! Posting errors

use thiserror::Error;

use crate::domain::DomainError;
use crate::store::StoreError;

/// Hard failures; any of these aborts the call with nothing persisted
#[derive(Debug, Error)]
pub enum PostingError {
    /// A referenced party, ledger account or document does not exist
    #[error("{kind} not found: {id}")]
    ReferenceNotFound { kind: &'static str, id: String },

    #[error(transparent)]
    Invariant(#[from] DomainError),

    #[error("Persistence failure: {0}")]
    Persistence(StoreError),
}

impl PostingError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::ReferenceNotFound {
            kind,
            id: id.into(),
        }
    }

    /// Whether retrying the same call can succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Persistence(_))
    }
}

impl From<StoreError> for PostingError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::SourceNotFound(source) => Self::not_found(source.kind(), source.id()),
            other => Self::Persistence(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SourceDocument;

    #[test]
    fn test_missing_source_maps_to_reference_not_found() {
        let err: PostingError =
            StoreError::SourceNotFound(SourceDocument::Daybook("D9".to_string())).into();
        assert!(matches!(
            err,
            PostingError::ReferenceNotFound { kind: "daybook", ref id } if id == "D9"
        ));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_store_outage_is_retryable() {
        let err: PostingError = StoreError::Unavailable("timeout".to_string()).into();
        assert!(err.is_retryable());
    }
}
