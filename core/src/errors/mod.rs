//! Domain-specific error types and error handling.

mod types;


pub use types::{CacheError, KeyError, TokenError};

use thiserror::Error;

/// Core domain errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Internal error: {message}")]
    Internal { message: String },

    // Bridge to specific error types
    #[error(transparent)]
    Key(#[from] KeyError),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl DomainError {
    /// Whether the error means the presented token must be rejected
    pub fn is_token_rejection(&self) -> bool {
        matches!(self, DomainError::Token(e) if e.is_rejection())
    }

    /// Whether the error comes from an unreachable backing store and may clear up on retry
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            DomainError::Cache(_) | DomainError::Key(KeyError::KeyStoreUnavailable { .. })
        )
    }
}

pub type DomainResult<T> = Result<T, DomainError>;
