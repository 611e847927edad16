// Central Error Type for the Store

use thiserror::Error;

/// Store-level error type
///
/// A missing row is never an error: lookups return `Option`, updates and
/// deletes return the affected row count.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Backend open, schema bootstrap or a previous initialization failed.
    /// Fatal for every queued caller until a fresh call retries.
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Duplicate unique key (e.g. `products.barcode`)
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Sale items or map post payload could not be encoded/decoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Durable store side effect failed (logged, never returned to a mutating caller)
    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// True for the duplicate-key case callers show a dedicated message for
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, StoreError::ConstraintViolation(_))
    }

    pub fn is_backend_unavailable(&self) -> bool {
        matches!(self, StoreError::BackendUnavailable(_))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// Result type alias using StoreError
pub type Result<T> = std::result::Result<T, StoreError>;
