//! Credential check performed before a token is issued.

use async_trait::async_trait;
use serde::Deserialize;

use crate::errors::DomainError;

/// Sign-in credentials as submitted by a client
#[derive(Clone, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Maps credentials to a principal identifier
///
/// Token issuance trusts the identifier it is handed; whoever calls
/// [`crate::services::token::TokenService::issue`] must have resolved it
/// through an implementation of this trait first.
#[async_trait]
pub trait PrincipalResolver: Send + Sync {
    /// # Returns
    /// * `Ok(Some(principal_id))` - Credentials are valid
    /// * `Ok(None)` - Unknown principal or wrong password
    /// * `Err(DomainError)` - The backing store failed
    async fn resolve(&self, credentials: &Credentials) -> Result<Option<String>, DomainError>;
}
