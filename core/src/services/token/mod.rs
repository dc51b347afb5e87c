//! Token service module for JWT management
//!
//! This module handles all token-related operations including:
//! - Signing tokens with the current key and binding them as the principal's session
//! - Validating presented tokens against the trusted keys and the session registry
//! - Refresh and logout

mod config;
mod issuer;
mod service;
mod validator;

#[cfg(test)]
mod tests;

pub use config::TokenServiceConfig;
pub use issuer::TokenIssuer;
pub use service::{BearerValidator, TokenService};
pub use validator::TokenValidator;
