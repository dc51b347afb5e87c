//! # Infrastructure Layer
//!
//! Concrete implementations of the ports declared in `ak_core`:
//!
//! - **Cache**: the Redis-backed [`SharedCache`](ak_core::repositories::SharedCache)
//!   shared by every instance, plus an in-process map for single-instance setups
//! - **Principals**: a seeded, bcrypt-hashed principal store used to resolve
//!   sign-in credentials

// Re-export core types for convenience
pub use ak_core::errors::*;

/// Cache module - Redis client and in-memory backend
pub mod cache;

/// Principal stores resolving credentials
pub mod principals;

/// Infrastructure-specific error types
#[derive(Debug, thiserror::Error)]
pub enum InfrastructureError {
    /// Cache command failure
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// Could not establish the Redis connection
    #[error("Connection error: {0}")]
    Connection(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// General infrastructure error
    #[error("Infrastructure error: {0}")]
    General(String),
}
