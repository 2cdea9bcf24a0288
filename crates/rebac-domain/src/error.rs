//! Domain error types for authorization operations.

use thiserror::Error;

/// Domain-specific errors for authorization operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The authorization model is malformed. Raised at load time; fatal.
    #[error("schema error: {message}")]
    SchemaError { message: String },

    /// Object type not present in the authorization model.
    #[error("type not found: {type_name}")]
    TypeNotFound { type_name: String },

    /// Relation not present on the object type.
    #[error("relation '{relation}' not found on type '{type_name}'")]
    RelationNotFound { type_name: String, relation: String },

    /// A tuple violates the schema (unknown relation, userset subject on a
    /// link relation, ...). Permanent; the caller must not retry.
    #[error("invalid tuple: {message}")]
    InvalidTuple { message: String },

    /// Malformed `type:id` / `type:id#relation` text at the boundary.
    #[error("invalid reference: {value}")]
    InvalidReference { value: String },

    /// The tuple backing store could not be reached. Transient.
    #[error("store unavailable: {message}")]
    StoreUnavailable { message: String },

    /// Recursion bound hit during expression evaluation.
    #[error("depth limit exceeded (max: {max_depth})")]
    DepthLimitExceeded { max_depth: u32 },

    /// The check deadline elapsed.
    #[error("check timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },
}

impl DomainError {
    /// Whether this failure is transient. Transient failures are the ones
    /// the access layer fails closed on instead of surfacing.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            DomainError::StoreUnavailable { .. } | DomainError::Timeout { .. }
        )
    }
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification_covers_store_and_timeout() {
        assert!(DomainError::StoreUnavailable {
            message: "down".into()
        }
        .is_transient());
        assert!(DomainError::Timeout { duration_ms: 10 }.is_transient());
        assert!(!DomainError::SchemaError {
            message: "bad".into()
        }
        .is_transient());
        assert!(!DomainError::InvalidTuple {
            message: "bad".into()
        }
        .is_transient());
    }
}
