//! Error handling module
//!
//! Centralized error types and HTTP response conversion.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::posting::PostingError;
use crate::store::StoreError;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Client errors (4xx)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    // Posting failures
    #[error(transparent)]
    Posting(#[from] PostingError),

    // Server errors (5xx)
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str, Option<String>) {
        match self {
            AppError::InvalidRequest(msg) => {
                (StatusCode::BAD_REQUEST, "invalid_request", Some(msg.clone()))
            }

            AppError::Posting(err) => match err {
                PostingError::ReferenceNotFound { id, .. } => {
                    (StatusCode::NOT_FOUND, "reference_not_found", Some(id.clone()))
                }
                PostingError::Invariant(e) => {
                    tracing::error!("Posting invariant violated: {}", e);
                    (StatusCode::INTERNAL_SERVER_ERROR, "posting_invariant", None)
                }
                PostingError::Persistence(e) => {
                    tracing::error!("Persistence failure: {:?}", e);
                    (StatusCode::SERVICE_UNAVAILABLE, "persistence_failure", None)
                }
            },

            AppError::Store(e) => {
                tracing::error!("Store error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "store_error", None)
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code, details) = self.status_and_code();

        let body = ErrorResponse {
            error: self.to_string(),
            error_code: error_code.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}
