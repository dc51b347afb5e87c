//! # AuthKeep Core
//!
//! Domain layer for AuthKeep. This crate owns the signing key lifecycle,
//! JWKS publication, token issuance and validation, and the per-principal
//! session registry. Storage is reached only through the repository traits,
//! so every service here runs unchanged against Redis or an in-process cache.

pub mod domain;
pub mod errors;
pub mod repositories;
pub mod services;

#[cfg(any(test, feature = "test-utils"))]
pub mod testutil;

// Re-export commonly used types for convenience
pub use domain::entities::{
    AuthenticatedPrincipal, Claims, IssuedToken, Jwk, JwkSet, KeySet, SigningKey,
};
pub use errors::{CacheError, DomainError, DomainResult, KeyError, TokenError};
pub use repositories::{Credentials, PrincipalResolver, SharedCache};
pub use services::{
    BearerValidator, KeyLifecycleManager, KeyManagerConfig, SessionRegistry, TokenService,
    TokenServiceConfig,
};
