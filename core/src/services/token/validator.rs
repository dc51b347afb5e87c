//! Token validation
//!
//! Checks run in a fixed order: structure, key id, key lookup, signature,
//! expiry, then the session registry. Everything up to and including the
//! expiry check is local, so malformed or forged tokens are rejected before
//! the shared cache is consulted.

use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use constant_time_eq::constant_time_eq;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Header, Validation};
use serde::de::DeserializeOwned;
use tracing::warn;

use super::config::TokenServiceConfig;
use crate::domain::entities::{AuthenticatedPrincipal, Claims};
use crate::errors::{DomainError, DomainResult, TokenError};
use crate::repositories::SharedCache;
use crate::services::keys::KeyLifecycleManager;
use crate::services::session::SessionRegistry;

/// Verifies presented tokens against the trusted keys and the session registry
pub struct TokenValidator<C: SharedCache + ?Sized> {
    keys: Arc<KeyLifecycleManager<C>>,
    sessions: SessionRegistry<C>,
    config: TokenServiceConfig,
    validation: Validation,
}

impl<C: SharedCache + ?Sized> TokenValidator<C> {
    pub fn new(
        keys: Arc<KeyLifecycleManager<C>>,
        sessions: SessionRegistry<C>,
        config: TokenServiceConfig,
    ) -> Self {
        let mut validation = Validation::new(config.algorithm);
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation.validate_exp = true;
        validation.validate_aud = false;
        validation.leeway = config.leeway_seconds;

        Self {
            keys,
            sessions,
            config,
            validation,
        }
    }

    /// Runs every check and returns the authenticated principal
    ///
    /// # Returns
    /// * `Ok(AuthenticatedPrincipal)` - The token is genuine, live and the principal's current session
    /// * `Err(TokenError)` - The first failed check
    /// * `Err(KeyStoreUnavailable | Cache)` - The shared cache could not be consulted
    pub async fn validate(&self, token: &str) -> DomainResult<AuthenticatedPrincipal> {
        match self.check(token).await {
            Ok(principal) => Ok(principal),
            Err(DomainError::Token(kind)) => {
                warn!(reason = ?kind, "Token rejected");
                Err(kind.into())
            }
            Err(e) => {
                warn!(error = %e, "Token validation could not complete");
                Err(e)
            }
        }
    }

    async fn check(&self, token: &str) -> DomainResult<AuthenticatedPrincipal> {
        let (claims, kid) = self.verify(token).await?;

        let stored = self
            .sessions
            .lookup(&claims.sub)
            .await?
            .ok_or(TokenError::SessionNotFound)?;
        if !constant_time_eq(stored.as_bytes(), token.as_bytes()) {
            return Err(TokenError::SessionMismatch.into());
        }

        Ok(AuthenticatedPrincipal::from_claims(&claims, kid))
    }

    /// Structural, key, signature and expiry checks without the session lookup
    ///
    /// # Returns
    /// * `Ok((claims, kid))` - The verified claims and the key that signed them
    pub async fn verify(&self, token: &str) -> DomainResult<(Claims, String)> {
        let header = self.parse(token)?;
        let kid = header.kid.ok_or(TokenError::UnknownKey)?;

        let key = self
            .keys
            .resolve(&kid)
            .await?
            .ok_or(TokenError::UnknownKey)?;

        let data = decode::<Claims>(token, key.decoding_key(), &self.validation)
            .map_err(|e| classify(e.kind()))?;

        Ok((data.claims, kid))
    }

    /// Checks the token has a decodable header of the expected algorithm and
    /// a payload carrying the typed claims
    ///
    /// Everything after the second dot is the signature segment, so a
    /// corrupted signature is a bad signature even when it contains a dot.
    fn parse(&self, token: &str) -> Result<Header, TokenError> {
        let mut segments = token.splitn(3, '.');
        let (header, payload, signature) =
            match (segments.next(), segments.next(), segments.next()) {
                (Some(header), Some(payload), Some(signature)) => (header, payload, signature),
                _ => return Err(TokenError::Malformed),
            };

        let header: Header = decode_segment(header)?;
        if header.alg != self.config.algorithm {
            return Err(TokenError::Malformed);
        }
        decode_segment::<Claims>(payload)?;

        if signature.contains('.') || URL_SAFE_NO_PAD.decode(signature).is_err() {
            return Err(TokenError::BadSignature);
        }

        Ok(header)
    }
}

/// Decodes one base64url JSON segment of a compact JWT
fn decode_segment<T: DeserializeOwned>(segment: &str) -> Result<T, TokenError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| TokenError::Malformed)?;
    serde_json::from_slice(&bytes).map_err(|_| TokenError::Malformed)
}

/// Maps a verification failure from `jsonwebtoken` onto the rejection kinds
///
/// Header and payload were decoded beforehand, so a base64 failure here can
/// only come from the signature segment.
fn classify(kind: &ErrorKind) -> TokenError {
    match kind {
        ErrorKind::InvalidSignature | ErrorKind::Base64(_) | ErrorKind::Crypto(_) => {
            TokenError::BadSignature
        }
        ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Malformed,
    }
}
