//! Operation Context
//!
//! Contains metadata about the current operation for audit and tracing.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Author recorded on entries when no request user is known
pub const SYSTEM_ACTOR: &str = "system";

/// Context for an operation, used for entry metadata and tracing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OperationContext {
    /// User id from X-Request-User-Id header
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_user: Option<String>,

    /// Correlation ID for request tracing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<Uuid>,
}

impl OperationContext {
    /// Create a new empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Create context with request user
    pub fn with_request_user(mut self, user: impl Into<String>) -> Self {
        self.request_user = Some(user.into());
        self
    }

    /// Create context with correlation ID
    pub fn with_correlation_id(mut self, correlation_id: Uuid) -> Self {
        self.correlation_id = Some(correlation_id);
        self
    }

    /// Value for the `createdBy` column
    pub fn actor(&self) -> &str {
        self.request_user.as_deref().unwrap_or(SYSTEM_ACTOR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_builder() {
        let correlation_id = Uuid::new_v4();

        let context = OperationContext::new()
            .with_request_user("accountant-7")
            .with_correlation_id(correlation_id);

        assert_eq!(context.request_user.as_deref(), Some("accountant-7"));
        assert_eq!(context.correlation_id, Some(correlation_id));
        assert_eq!(context.actor(), "accountant-7");
    }

    #[test]
    fn test_actor_defaults_to_system() {
        assert_eq!(OperationContext::new().actor(), SYSTEM_ACTOR);
    }
}
