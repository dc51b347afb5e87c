//! Configuration module with business-specific sub-modules
//!
//! This module organizes configuration into logical areas:
//! - `auth` - Token issuance, signing keys and development principals
//! - `cache` - Shared cache (Redis) connection settings
//! - `environment` - Environment detection and logging configuration
//! - `server` - HTTP server configuration
//!
//! Configuration is layered: built-in defaults, then an optional TOML file,
//! then `AUTH__`-prefixed environment variables (`AUTH__TOKEN__TTL_SECONDS`).

pub mod auth;
pub mod cache;
pub mod environment;
pub mod server;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// Re-export commonly used types
pub use auth::{KeyConfig, PrincipalSeed, TokenConfig};
pub use cache::{CacheBackend, CacheConfig};
pub use environment::{Environment, LogFormat, LoggingConfig};
pub use server::ServerConfig;

/// Default configuration file, read when present
pub const DEFAULT_CONFIG_FILE: &str = "config/default";

/// Environment variable overriding the configuration file path
pub const CONFIG_FILE_ENV: &str = "AUTH_CONFIG_FILE";

/// Prefix for configuration environment variables
pub const ENV_PREFIX: &str = "AUTH";

/// Shortest rotation interval accepted
pub const MIN_ROTATION_INTERVAL_SECONDS: u64 = 600;

/// Smallest RSA modulus accepted for signing keys
pub const MIN_RSA_BITS: usize = 2048;

/// Longest token lifetime accepted (one year)
pub const MAX_TOKEN_TTL_SECONDS: u64 = 365 * 24 * 3600;

/// Largest validation leeway accepted
pub const MAX_LEEWAY_SECONDS: u64 = 300;

/// Longest retention of a superseded key (two years)
pub const MAX_GRACE_SECONDS: u64 = 2 * MAX_TOKEN_TTL_SECONDS;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration value for {field}: {message}")]
    Invalid { field: &'static str, message: String },
}

impl ConfigError {
    fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            message: message.into(),
        }
    }
}

/// Complete application configuration combining all sub-configurations
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// Environment configuration
    pub environment: Environment,

    /// Server configuration
    pub server: ServerConfig,

    /// Shared cache configuration
    pub cache: CacheConfig,

    /// Token issuance configuration
    pub token: TokenConfig,

    /// Signing key lifecycle configuration
    pub keys: KeyConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Principals seeded into the in-memory principal store
    pub principals: Vec<PrincipalSeed>,
}

impl AppConfig {
    /// Load configuration from defaults, the config file and the environment
    ///
    /// A `.env` file in the working directory is applied to the process
    /// environment first. The result is validated before it is returned.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let file = std::env::var(CONFIG_FILE_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());

        let config: AppConfig = config::Config::builder()
            .add_source(config::File::with_name(&file).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints that serde defaults cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.token.ttl_seconds == 0 {
            return Err(ConfigError::invalid("token.ttl_seconds", "must be greater than zero"));
        }

        if self.token.ttl_seconds > MAX_TOKEN_TTL_SECONDS {
            return Err(ConfigError::invalid(
                "token.ttl_seconds",
                format!("must be at most {}", MAX_TOKEN_TTL_SECONDS),
            ));
        }

        if self.token.leeway_seconds > MAX_LEEWAY_SECONDS {
            return Err(ConfigError::invalid(
                "token.leeway_seconds",
                format!("must be at most {}", MAX_LEEWAY_SECONDS),
            ));
        }

        if !self.token.algorithm.starts_with("RS") {
            return Err(ConfigError::invalid(
                "token.algorithm",
                format!("{} is not an RSA signing algorithm", self.token.algorithm),
            ));
        }

        if self.keys.rsa_bits < MIN_RSA_BITS {
            return Err(ConfigError::invalid(
                "keys.rsa_bits",
                format!("must be at least {}", MIN_RSA_BITS),
            ));
        }

        if self.keys.rotation_interval_seconds != 0
            && self.keys.rotation_interval_seconds < MIN_ROTATION_INTERVAL_SECONDS
        {
            return Err(ConfigError::invalid(
                "keys.rotation_interval_seconds",
                format!("must be 0 or at least {}", MIN_ROTATION_INTERVAL_SECONDS),
            ));
        }

        // Without periodic sync a shared-cache instance never learns that a
        // peer rotated, and keeps signing with a key the peer will prune.
        if self.keys.sync_interval_seconds == 0 && self.cache.backend != CacheBackend::Memory {
            return Err(ConfigError::invalid(
                "keys.sync_interval_seconds",
                "must be greater than zero when the cache is shared",
            ));
        }

        let min_grace = self.keys.min_grace_seconds(&self.token);
        if self.keys.rotation_grace_seconds != 0 && self.keys.rotation_grace_seconds < min_grace {
            return Err(ConfigError::invalid(
                "keys.rotation_grace_seconds",
                format!(
                    "must be at least token.ttl_seconds + keys.sync_interval_seconds + token.leeway_seconds ({})",
                    min_grace
                ),
            ));
        }

        if self.keys.effective_grace_seconds(&self.token) > MAX_GRACE_SECONDS {
            return Err(ConfigError::invalid(
                "keys.rotation_grace_seconds",
                format!("must be at most {}", MAX_GRACE_SECONDS),
            ));
        }

        if self.environment.is_production() && self.cache.backend == CacheBackend::Memory {
            return Err(ConfigError::invalid(
                "cache.backend",
                "the memory backend cannot be shared between instances",
            ));
        }

        Ok(())
    }
}
