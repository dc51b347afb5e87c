//! Domain entities representing signing keys, tokens and their public form.

pub mod jwk;
pub mod signing_key;
pub mod token;


// Re-export commonly used types
pub use jwk::{Jwk, JwkSet};
pub use signing_key::{KeySet, SigningKey, StoredKey};
pub use token::{AuthenticatedPrincipal, Claims, IssuedToken};
