//! Token issuance and refresh

use std::sync::Arc;

use chrono::Utc;
use jsonwebtoken::{encode, Header};
use tracing::{info, warn};

use super::config::TokenServiceConfig;
use super::validator::TokenValidator;
use crate::domain::entities::{Claims, IssuedToken, SigningKey};
use crate::errors::{DomainError, DomainResult, TokenError};
use crate::repositories::SharedCache;
use crate::services::keys::KeyLifecycleManager;
use crate::services::session::SessionRegistry;

/// Signs tokens with the current key and binds them as the principal's session
pub struct TokenIssuer<C: SharedCache + ?Sized> {
    keys: Arc<KeyLifecycleManager<C>>,
    sessions: SessionRegistry<C>,
    validator: Arc<TokenValidator<C>>,
    config: TokenServiceConfig,
}

impl<C: SharedCache + ?Sized> TokenIssuer<C> {
    pub fn new(
        keys: Arc<KeyLifecycleManager<C>>,
        sessions: SessionRegistry<C>,
        validator: Arc<TokenValidator<C>>,
        config: TokenServiceConfig,
    ) -> Self {
        Self {
            keys,
            sessions,
            validator,
            config,
        }
    }

    /// Issues a token for an already authenticated principal
    ///
    /// The token only reaches the caller once it is recorded as the
    /// principal's session; if that write fails the signed token is dropped.
    ///
    /// # Returns
    /// * `Ok(IssuedToken)` - Signed and registered
    /// * `Err(NoKeyAvailable)` - Keys were never initialized
    /// * `Err(SigningFailed)` - The signer rejected the key or claims
    /// * `Err(SessionWriteFailed)` - The session could not be recorded
    pub async fn issue(&self, principal_id: &str) -> DomainResult<IssuedToken> {
        if principal_id.trim().is_empty() {
            return Err(DomainError::Validation {
                message: "principal id must not be empty".to_string(),
            });
        }

        let key = self.keys.current_key().await?;

        let issued_at = Utc::now();
        let claims = Claims::new(&self.config.issuer, principal_id, issued_at, self.config.ttl());
        let token = self.sign(&key, &claims)?;

        if let Err(e) = self
            .sessions
            .bind(principal_id, &token, claims.remaining_seconds(issued_at))
            .await
        {
            warn!(principal_id, error = %e, "Discarding signed token, session not recorded");
            return Err(e);
        }

        info!(principal_id, kid = key.kid(), "Issued token");
        Ok(IssuedToken {
            token,
            kid: key.kid().to_string(),
            issued_at: claims.issued_at(),
            expires_at: claims.expires_at(),
            expires_in: self.config.ttl_seconds,
        })
    }

    /// Exchanges a valid token for a fresh one, invalidating the old one
    ///
    /// # Returns
    /// * `Ok(IssuedToken)` - The replacement token
    /// * `Err(RefreshDenied)` - The presented token failed validation; nothing changed
    pub async fn refresh(&self, old_token: &str) -> DomainResult<IssuedToken> {
        let principal = self
            .validator
            .validate(old_token)
            .await
            .map_err(|e| match e {
                DomainError::Token(kind) => DomainError::Token(TokenError::RefreshDenied {
                    reason: kind.to_string(),
                }),
                other => other,
            })?;

        self.sessions.revoke(&principal.principal_id).await?;
        self.issue(&principal.principal_id).await
    }

    /// Encodes claims into a JWT carrying the signing key's kid
    pub(crate) fn sign(&self, key: &SigningKey, claims: &Claims) -> Result<String, TokenError> {
        let mut header = Header::new(self.config.algorithm);
        header.kid = Some(key.kid().to_string());
        encode(&header, claims, key.encoding_key()).map_err(|e| {
            warn!(kid = key.kid(), error = %e, "Token signing failed");
            TokenError::SigningFailed
        })
    }
}
