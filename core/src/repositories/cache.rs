//! Shared cache trait defining the interface to the key/session store.

use async_trait::async_trait;

use crate::errors::CacheError;

/// Entry holding the serialized signing key set
pub const KEYSET_KEY: &str = "auth:keyset";

/// Entry holding the published JWKS document
pub const JWKS_KEY: &str = "auth:jwks";

/// Prefix of the per-principal session entries
pub const SESSION_KEY_PREFIX: &str = "auth:token:";

/// A string key/value store shared by every service instance
///
/// Implementations are responsible for namespacing (key prefixes) and for
/// bounding every call with a timeout; a slow store must surface as
/// [`CacheError::Timeout`] rather than a hung request.
#[async_trait]
pub trait SharedCache: Send + Sync {
    /// Get a value by key
    ///
    /// # Returns
    /// * `Ok(Some(value))` - Key exists and has not expired
    /// * `Ok(None)` - Key is absent or expired
    /// * `Err(CacheError)` - The store could not be reached
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Set a value with no expiry
    async fn set(&self, key: &str, value: &str) -> Result<(), CacheError>;

    /// Set a value only if the key does not exist yet
    ///
    /// # Returns
    /// * `Ok(true)` - The value was written
    /// * `Ok(false)` - Another writer got there first; nothing changed
    async fn set_if_absent(&self, key: &str, value: &str) -> Result<bool, CacheError>;

    /// Set a value that expires after `expiry_seconds`
    async fn set_with_expiry(
        &self,
        key: &str,
        value: &str,
        expiry_seconds: u64,
    ) -> Result<(), CacheError>;

    /// Delete a key, returning whether it existed
    async fn delete(&self, key: &str) -> Result<bool, CacheError>;

    /// Health probe
    async fn ping(&self) -> Result<(), CacheError>;
}
