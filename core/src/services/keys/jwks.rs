//! Publication of the JWKS document to the shared cache

use std::sync::Arc;

use jsonwebtoken::Algorithm;
use tracing::{debug, error};

use super::config::algorithm_name;
use crate::domain::entities::KeySet;
use crate::errors::{DomainError, KeyError};
use crate::repositories::{SharedCache, JWKS_KEY};

/// Writes the public form of the key set to the shared cache and serves it back
///
/// The stored document is served byte-for-byte, so every instance answers
/// JWKS requests identically regardless of which one published last.
pub struct JwksPublisher<C: SharedCache + ?Sized> {
    cache: Arc<C>,
    algorithm: Algorithm,
    ttl_seconds: u64,
}

impl<C: SharedCache + ?Sized> Clone for JwksPublisher<C> {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
            algorithm: self.algorithm,
            ttl_seconds: self.ttl_seconds,
        }
    }
}

impl<C: SharedCache + ?Sized> JwksPublisher<C> {
    pub fn new(cache: Arc<C>, algorithm: Algorithm, ttl_seconds: u64) -> Self {
        Self {
            cache,
            algorithm,
            ttl_seconds,
        }
    }

    /// Renders the JWKS for `keys` and stores it with the configured TTL
    pub async fn publish(&self, keys: &KeySet) -> Result<(), DomainError> {
        let document = keys.to_jwks(&algorithm_name(self.algorithm));
        let body = serde_json::to_string(&document).map_err(|e| DomainError::Internal {
            message: format!("Failed to serialize JWKS: {}", e),
        })?;

        self.cache
            .set_with_expiry(JWKS_KEY, &body, self.ttl_seconds)
            .await
            .map_err(|e| KeyError::KeyStoreUnavailable {
                message: format!("Failed to publish JWKS: {}", e),
            })?;

        debug!(keys = document.keys.len(), "Published JWKS document");
        Ok(())
    }

    /// Returns the published document verbatim
    ///
    /// # Returns
    /// * `Ok(String)` - The JSON body as last published
    /// * `Err(KeyError::JwksUnavailable)` - Absent, or the cache failed
    pub async fn serve(&self) -> Result<String, DomainError> {
        match self.cache.get(JWKS_KEY).await {
            Ok(Some(body)) => Ok(body),
            Ok(None) => {
                error!("JWKS document missing from the shared cache");
                Err(KeyError::JwksUnavailable.into())
            }
            Err(e) => {
                error!(error = %e, "Failed to read JWKS document");
                Err(KeyError::JwksUnavailable.into())
            }
        }
    }

    /// Whether a JWKS document is currently stored
    pub async fn is_published(&self) -> Result<bool, DomainError> {
        self.cache
            .get(JWKS_KEY)
            .await
            .map(|body| body.is_some())
            .map_err(|e| {
                KeyError::KeyStoreUnavailable {
                    message: e.to_string(),
                }
                .into()
            })
    }
}
