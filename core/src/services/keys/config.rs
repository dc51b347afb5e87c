//! Configuration for the key lifecycle manager

use std::str::FromStr;
use std::time::Duration;

use ak_shared::config::{KeyConfig, TokenConfig, MAX_GRACE_SECONDS};
use jsonwebtoken::Algorithm;

use crate::errors::DomainError;

/// Configuration for the key lifecycle manager
#[derive(Debug, Clone)]
pub struct KeyManagerConfig {
    /// JWT signing algorithm advertised in the JWKS document
    pub algorithm: Algorithm,
    /// Lifetime of the published JWKS entry in seconds
    pub jwks_ttl_seconds: u64,
    /// How long a retired key stays trusted before it may be pruned
    pub grace_period: chrono::Duration,
    /// Minimum spacing between cache reloads triggered by unknown kids
    pub min_reload_interval: Duration,
}

impl Default for KeyManagerConfig {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::RS256,
            jwks_ttl_seconds: 30 * 24 * 60 * 60, // 30 days
            grace_period: chrono::Duration::seconds(3600 + 60),
            min_reload_interval: Duration::from_secs(5),
        }
    }
}

impl KeyManagerConfig {
    /// Builds the manager settings from the application configuration
    pub fn from_app_config(token: &TokenConfig, keys: &KeyConfig) -> Result<Self, DomainError> {
        let algorithm = parse_algorithm(&token.algorithm)?;
        let grace_seconds = keys.effective_grace_seconds(token);
        if grace_seconds > MAX_GRACE_SECONDS {
            return Err(DomainError::Validation {
                message: format!("Key grace period must be at most {} seconds", MAX_GRACE_SECONDS),
            });
        }

        Ok(Self {
            algorithm,
            jwks_ttl_seconds: keys.jwks_ttl_seconds,
            grace_period: chrono::Duration::seconds(grace_seconds as i64),
            ..Self::default()
        })
    }
}

/// Parses an algorithm name, accepting only the RSA family
pub(crate) fn parse_algorithm(name: &str) -> Result<Algorithm, DomainError> {
    let algorithm = Algorithm::from_str(name).map_err(|_| DomainError::Validation {
        message: format!("Unknown signing algorithm: {}", name),
    })?;

    match algorithm {
        Algorithm::RS256
        | Algorithm::RS384
        | Algorithm::RS512
        | Algorithm::PS256
        | Algorithm::PS384
        | Algorithm::PS512 => Ok(algorithm),
        _ => Err(DomainError::Validation {
            message: format!("Signing algorithm {} does not use RSA keys", name),
        }),
    }
}

/// Name of the algorithm as it appears in JWT headers and JWKs
pub(crate) fn algorithm_name(algorithm: Algorithm) -> String {
    format!("{:?}", algorithm)
}
