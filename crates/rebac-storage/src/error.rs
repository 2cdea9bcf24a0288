//! Storage error types.

use thiserror::Error;

/// Storage-specific errors.
///
/// Idempotent conflicts are not represented here: re-adding a present
/// tuple and removing an absent one are successes by contract.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Store not found.
    #[error("store not found: {store_id}")]
    StoreNotFound { store_id: String },

    /// Store already exists.
    #[error("store already exists: {store_id}")]
    StoreAlreadyExists { store_id: String },

    /// No authorization model installed for the store.
    #[error("no model installed for store: {store_id}")]
    ModelNotFound { store_id: String },

    /// Structurally invalid tuple (empty component). Permanent.
    #[error("invalid tuple: {message}")]
    InvalidTuple { message: String },

    /// Invalid input error.
    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    /// The backing store could not be reached or a deadline elapsed.
    /// Transient; callers may retry writes with backoff.
    #[error("store unavailable: {message}")]
    Unavailable { message: String },
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
