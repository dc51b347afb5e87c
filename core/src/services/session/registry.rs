//! Single-session registry: one live token per principal

use std::sync::Arc;

use tracing::debug;

use crate::errors::{DomainError, TokenError};
use crate::repositories::{SharedCache, SESSION_KEY_PREFIX};

/// Cache key of the session entry for `principal_id`
pub fn session_key(principal_id: &str) -> String {
    format!("{}{}", SESSION_KEY_PREFIX, principal_id)
}

/// Records the one token currently valid for each principal
///
/// Binding a new token replaces the previous one, which is what makes older
/// tokens fail validation with a session mismatch.
pub struct SessionRegistry<C: SharedCache + ?Sized> {
    cache: Arc<C>,
}

impl<C: SharedCache + ?Sized> Clone for SessionRegistry<C> {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
        }
    }
}

impl<C: SharedCache + ?Sized> SessionRegistry<C> {
    pub fn new(cache: Arc<C>) -> Self {
        Self { cache }
    }

    /// Stores `token` as the principal's session, expiring after `ttl_seconds`
    ///
    /// # Returns
    /// * `Err(SessionWriteFailed)` - The cache rejected the write
    pub async fn bind(
        &self,
        principal_id: &str,
        token: &str,
        ttl_seconds: u64,
    ) -> Result<(), DomainError> {
        // A zero expiry is rejected by Redis; an entry for a token that is about to lapse costs nothing.
        let ttl_seconds = ttl_seconds.max(1);

        self.cache
            .set_with_expiry(&session_key(principal_id), token, ttl_seconds)
            .await
            .map_err(|e| TokenError::SessionWriteFailed {
                message: e.to_string(),
            })?;

        debug!(principal_id, ttl_seconds, "Bound session");
        Ok(())
    }

    /// Removes the principal's session
    ///
    /// # Returns
    /// * `Ok(true)` - A session existed and was removed
    /// * `Ok(false)` - There was no session
    /// * `Err(Cache)` - The cache could not be reached
    pub async fn revoke(&self, principal_id: &str) -> Result<bool, DomainError> {
        let removed = self
            .cache
            .delete(&session_key(principal_id))
            .await
            .map_err(DomainError::from)?;

        debug!(principal_id, removed, "Revoked session");
        Ok(removed)
    }

    /// The token currently bound to the principal, if any
    pub async fn lookup(&self, principal_id: &str) -> Result<Option<String>, DomainError> {
        self.cache
            .get(&session_key(principal_id))
            .await
            .map_err(DomainError::from)
    }
}
