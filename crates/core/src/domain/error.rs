// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Quantity must be at least 1, got {0}")]
    InvalidQuantity(i64),

    #[error("Cash amount {given} does not cover total {total}")]
    InsufficientCash { given: f64, total: f64 },

    #[error("Cannot check out an empty cart")]
    EmptyCart,

    #[error("Unknown scan type: {0}")]
    UnknownScanKind(String),

    #[error("Unknown payment method: {0}")]
    UnknownPaymentMethod(String),

    #[error("Unknown post type: {0}")]
    UnknownPostType(String),

    #[error("Post of type {post_type} is missing its {field} payload")]
    MissingPayload {
        post_type: &'static str,
        field: &'static str,
    },
}

impl DomainError {
    /// Decoding failures (stored strings that no longer parse) vs. rejected input
    pub fn is_decoding(&self) -> bool {
        matches!(
            self,
            DomainError::UnknownScanKind(_)
                | DomainError::UnknownPaymentMethod(_)
                | DomainError::UnknownPostType(_)
                | DomainError::MissingPayload { .. }
        )
    }
}

impl From<DomainError> for crate::error::StoreError {
    fn from(err: DomainError) -> Self {
        if err.is_decoding() {
            crate::error::StoreError::Serialization(err.to_string())
        } else {
            crate::error::StoreError::Validation(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, DomainError>;
