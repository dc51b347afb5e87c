//! Interfaces to the stores the domain services depend on.

pub mod cache;
pub mod principal;

pub use cache::{SharedCache, JWKS_KEY, KEYSET_KEY, SESSION_KEY_PREFIX};
pub use principal::{Credentials, PrincipalResolver};
