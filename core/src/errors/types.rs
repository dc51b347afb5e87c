//! Error types for the key lifecycle, token handling and shared cache access
//!
//! Each enum covers one failure domain. `DomainError` in the parent module
//! bridges them so service methods can return a single error type.

use thiserror::Error;

/// Failures of the signing key lifecycle and JWKS publication
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    /// The shared cache could not be read or written, or held an unparseable key set
    #[error("Key store unavailable: {message}")]
    KeyStoreUnavailable { message: String },

    /// The platform could not produce an RSA key pair
    #[error("Key generation failed: {message}")]
    KeyGenerationFailed { message: String },

    /// No current signing key is loaded
    #[error("No signing key available")]
    NoKeyAvailable,

    /// The published JWKS document is absent or could not be read
    #[error("JWKS document unavailable")]
    JwksUnavailable,
}

/// Failures of token issuance, validation and refresh
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Token signing failed")]
    SigningFailed,

    #[error("Session write failed: {message}")]
    SessionWriteFailed { message: String },

    #[error("Malformed token")]
    Malformed,

    #[error("Unknown signing key")]
    UnknownKey,

    #[error("Invalid token signature")]
    BadSignature,

    #[error("Token expired")]
    Expired,

    #[error("No active session for principal")]
    SessionNotFound,

    #[error("Token does not match the active session")]
    SessionMismatch,

    /// The token presented for refresh failed validation
    #[error("Refresh denied: {reason}")]
    RefreshDenied { reason: String },
}

impl TokenError {
    /// Whether this error is a verdict on the presented token rather than an
    /// issuance-side failure
    pub fn is_rejection(&self) -> bool {
        !matches!(
            self,
            TokenError::SigningFailed | TokenError::SessionWriteFailed { .. }
        )
    }
}

/// Failures talking to the shared cache
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    #[error("Cache unavailable: {message}")]
    Unavailable { message: String },

    #[error("Cache operation timed out: {operation}")]
    Timeout { operation: String },
}

impl CacheError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        CacheError::Unavailable {
            message: message.into(),
        }
    }
}
