//! Domain layer containing the key, token and JWKS entities.

pub mod entities;

// Re-export commonly used domain types
pub use entities::*;
