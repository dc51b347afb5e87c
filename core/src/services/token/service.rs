//! Main token service implementation

use std::sync::Arc;

use async_trait::async_trait;

use super::config::TokenServiceConfig;
use super::issuer::TokenIssuer;
use super::validator::TokenValidator;
use crate::domain::entities::{AuthenticatedPrincipal, IssuedToken};
use crate::errors::DomainResult;
use crate::repositories::SharedCache;
use crate::services::keys::KeyLifecycleManager;
use crate::services::session::SessionRegistry;

/// Validates bearer tokens on behalf of the HTTP layer
///
/// Object safe so the middleware can hold it as `dyn BearerValidator`
/// without knowing the cache backend.
#[async_trait]
pub trait BearerValidator: Send + Sync {
    async fn validate_bearer(&self, token: &str) -> DomainResult<AuthenticatedPrincipal>;
}

/// Service for issuing, validating, refreshing and revoking tokens
pub struct TokenService<C: SharedCache + ?Sized> {
    keys: Arc<KeyLifecycleManager<C>>,
    sessions: SessionRegistry<C>,
    issuer: TokenIssuer<C>,
    validator: Arc<TokenValidator<C>>,
    config: TokenServiceConfig,
}

impl<C: SharedCache + ?Sized> TokenService<C> {
    /// Creates a new token service instance
    ///
    /// # Arguments
    ///
    /// * `keys` - Initialized key manager; it also supplies the shared cache
    /// * `config` - Token service configuration
    pub fn new(keys: Arc<KeyLifecycleManager<C>>, config: TokenServiceConfig) -> Self {
        let sessions = SessionRegistry::new(keys.cache());
        let validator = Arc::new(TokenValidator::new(
            Arc::clone(&keys),
            sessions.clone(),
            config.clone(),
        ));
        let issuer = TokenIssuer::new(
            Arc::clone(&keys),
            sessions.clone(),
            Arc::clone(&validator),
            config.clone(),
        );

        Self {
            keys,
            sessions,
            issuer,
            validator,
            config,
        }
    }

    pub async fn issue(&self, principal_id: &str) -> DomainResult<IssuedToken> {
        self.issuer.issue(principal_id).await
    }

    pub async fn validate(&self, token: &str) -> DomainResult<AuthenticatedPrincipal> {
        self.validator.validate(token).await
    }

    pub async fn refresh(&self, old_token: &str) -> DomainResult<IssuedToken> {
        self.issuer.refresh(old_token).await
    }

    /// Ends the principal's session; succeeds whether or not one existed
    pub async fn logout(&self, principal_id: &str) -> DomainResult<()> {
        self.sessions.revoke(principal_id).await?;
        Ok(())
    }

    pub fn keys(&self) -> &Arc<KeyLifecycleManager<C>> {
        &self.keys
    }

    pub fn sessions(&self) -> &SessionRegistry<C> {
        &self.sessions
    }

    pub fn issuer(&self) -> &TokenIssuer<C> {
        &self.issuer
    }

    pub fn validator(&self) -> &TokenValidator<C> {
        &self.validator
    }

    pub fn config(&self) -> &TokenServiceConfig {
        &self.config
    }
}

#[async_trait]
impl<C: SharedCache + ?Sized + 'static> BearerValidator for TokenService<C> {
    async fn validate_bearer(&self, token: &str) -> DomainResult<AuthenticatedPrincipal> {
        self.validate(token).await
    }
}
