//! Shared configuration and response types for the AuthKeep server
//!
//! This crate provides common functionality used across all server crates:
//! - Configuration sections and layered loading
//! - Error response structures and error codes

pub mod config;
pub mod errors;

// Re-export commonly used items at crate root
pub use config::{
    AppConfig, CacheBackend, CacheConfig, ConfigError, Environment, KeyConfig, LogFormat,
    LoggingConfig, PrincipalSeed, ServerConfig, TokenConfig,
};
pub use errors::{error_codes, ErrorResponse};
