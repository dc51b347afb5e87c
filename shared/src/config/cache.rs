//! Shared cache configuration module

use serde::{Deserialize, Serialize};

/// Which shared cache implementation backs keys and sessions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    /// Redis, shared by every server instance
    Redis,
    /// In-process map, single instance only
    Memory,
}

impl Default for CacheBackend {
    fn default() -> Self {
        CacheBackend::Redis
    }
}

/// Redis cache configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache implementation
    pub backend: CacheBackend,

    /// Redis connection URL
    pub url: String,

    /// Optional namespace prepended to every cache key
    pub key_prefix: Option<String>,

    /// Connection timeout in milliseconds
    pub connection_timeout_ms: u64,

    /// Timeout applied to every cache command in milliseconds
    pub response_timeout_ms: u64,

    /// Attempts per command on the request path (1 = fail fast)
    pub max_attempts: u32,

    /// Base delay between attempts in milliseconds
    pub retry_delay_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::default(),
            url: String::from("redis://localhost:6379"),
            key_prefix: None,
            connection_timeout_ms: 5000,
            response_timeout_ms: 1000,
            max_attempts: 1,
            retry_delay_ms: 100,
        }
    }
}

impl CacheConfig {
    /// Create a new cache configuration with URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Set the key prefix for all cache keys
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }

    /// Generate a cache key with prefix
    pub fn make_key(&self, key: &str) -> String {
        match &self.key_prefix {
            Some(prefix) => format!("{}:{}", prefix, key),
            None => key.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_make_key() {
        let config = CacheConfig::new("redis://localhost:6379");
        assert_eq!(config.make_key("auth:jwks"), "auth:jwks");

        let config = config.with_prefix("staging");
        assert_eq!(config.make_key("auth:jwks"), "staging:auth:jwks");
    }
}
