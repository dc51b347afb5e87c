//! Configuration for the token service

use ak_shared::config::{TokenConfig, MAX_LEEWAY_SECONDS, MAX_TOKEN_TTL_SECONDS};
use chrono::Duration;
use jsonwebtoken::Algorithm;

use crate::errors::DomainError;
use crate::services::keys::config::parse_algorithm;

/// Configuration for the token service
#[derive(Debug, Clone)]
pub struct TokenServiceConfig {
    /// Value of the `iss` claim, checked on validation
    pub issuer: String,
    /// Token lifetime in seconds
    pub ttl_seconds: u64,
    /// JWT signing algorithm
    pub algorithm: Algorithm,
    /// Clock skew tolerated when checking expiry, in seconds
    pub leeway_seconds: u64,
}

impl Default for TokenServiceConfig {
    fn default() -> Self {
        Self {
            issuer: "authkeep".to_string(),
            ttl_seconds: 3600, // 1 hour
            algorithm: Algorithm::RS256,
            leeway_seconds: 0,
        }
    }
}

impl TokenServiceConfig {
    /// Token lifetime, capped at the longest lifetime the server accepts
    pub fn ttl(&self) -> Duration {
        Duration::seconds(self.ttl_seconds.min(MAX_TOKEN_TTL_SECONDS) as i64)
    }
}

impl TryFrom<&TokenConfig> for TokenServiceConfig {
    type Error = DomainError;

    fn try_from(config: &TokenConfig) -> Result<Self, Self::Error> {
        if config.ttl_seconds == 0 || config.ttl_seconds > MAX_TOKEN_TTL_SECONDS {
            return Err(DomainError::Validation {
                message: format!(
                    "Token lifetime must be between 1 and {} seconds",
                    MAX_TOKEN_TTL_SECONDS
                ),
            });
        }
        if config.leeway_seconds > MAX_LEEWAY_SECONDS {
            return Err(DomainError::Validation {
                message: format!("Validation leeway must be at most {} seconds", MAX_LEEWAY_SECONDS),
            });
        }

        Ok(Self {
            issuer: config.issuer.clone(),
            ttl_seconds: config.ttl_seconds,
            algorithm: parse_algorithm(&config.algorithm)?,
            leeway_seconds: config.leeway_seconds,
        })
    }
}
