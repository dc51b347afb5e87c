//! Redis cache client implementation
//!
//! This module provides the Redis-backed [`SharedCache`] used when several
//! instances share signing keys and sessions. Every command runs on a
//! multiplexed connection, is bounded by the configured response timeout,
//! and is retried only for transient errors and only as often as
//! `max_attempts` allows.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use ak_core::errors::CacheError;
use ak_core::repositories::SharedCache;
use async_trait::async_trait;
use redis::{aio::MultiplexedConnection, AsyncCommands, Client, RedisError, RedisResult};
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, warn};

use crate::cache::CacheConfig;
use crate::InfrastructureError;

type RedisFuture<T> = Pin<Box<dyn Future<Output = RedisResult<T>> + Send>>;

/// Redis cache client with bounded timeouts and retry logic
#[derive(Clone)]
pub struct RedisClient {
    /// Redis multiplexed connection for async operations
    connection: MultiplexedConnection,
    /// Configuration used to create this client
    config: CacheConfig,
}

impl RedisClient {
    /// Connects to Redis, retrying the initial connection with backoff
    ///
    /// # Arguments
    /// * `config` - Cache configuration settings
    ///
    /// # Returns
    /// * `Result<Self, InfrastructureError>` - Redis client or error
    ///
    /// # Example
    /// ```no_run
    /// use ak_infra::cache::{CacheConfig, RedisClient};
    ///
    /// async fn create_client() -> Result<RedisClient, Box<dyn std::error::Error>> {
    ///     let config = CacheConfig::new("redis://localhost:6379").with_prefix("authkeep");
    ///     let client = RedisClient::new(config).await?;
    ///     Ok(client)
    /// }
    /// ```
    pub async fn new(config: CacheConfig) -> Result<Self, InfrastructureError> {
        info!("Creating Redis client with URL: {}", mask_url(&config.url));

        // Parse Redis URL and create client
        let client = Client::open(config.url.as_str()).map_err(|e| {
            error!("Failed to parse Redis URL: {}", e);
            InfrastructureError::Config(format!("Invalid Redis URL: {}", e))
        })?;

        let connection = Self::create_connection_with_retry(client, &config).await?;

        info!("Redis client created successfully");

        Ok(Self { connection, config })
    }

    /// Create multiplexed connection with retry logic
    async fn create_connection_with_retry(
        client: Client,
        config: &CacheConfig,
    ) -> Result<MultiplexedConnection, InfrastructureError> {
        let max_attempts = config.max_attempts.max(3);
        let connect_timeout = Duration::from_millis(config.connection_timeout_ms);
        let mut attempts = 0;
        let mut delay = config.retry_delay_ms;

        loop {
            attempts += 1;
            debug!("Attempting to connect to Redis (attempt {})", attempts);

            let outcome = timeout(connect_timeout, client.get_multiplexed_async_connection()).await;
            let failure = match outcome {
                Ok(Ok(connection)) => {
                    info!("Successfully connected to Redis");
                    return Ok(connection);
                }
                Ok(Err(e)) => e.to_string(),
                Err(_) => format!("connection timed out after {:?}", connect_timeout),
            };

            if attempts >= max_attempts {
                error!(
                    "Failed to connect to Redis after {} attempts: {}",
                    attempts, failure
                );
                return Err(InfrastructureError::Connection(failure));
            }

            warn!(
                "Failed to connect to Redis (attempt {}/{}): {}. Retrying in {}ms...",
                attempts, max_attempts, failure, delay
            );
            sleep(Duration::from_millis(delay)).await;
            // Exponential backoff with cap at 5 seconds
            delay = (delay * 2).min(5000);
        }
    }

    /// Check if the Redis connection is healthy
    ///
    /// Performs a PING command to verify connectivity.
    pub async fn health_check(&self) -> Result<bool, CacheError> {
        let response = self
            .execute_with_retry("PING", |mut conn| {
                Box::pin(async move { redis::cmd("PING").query_async::<_, String>(&mut conn).await })
            })
            .await?;

        if response == "PONG" {
            debug!("Redis health check passed");
            Ok(true)
        } else {
            warn!("Redis health check returned unexpected response: {}", response);
            Ok(false)
        }
    }

    /// Execute a Redis operation with a response timeout and retry logic
    ///
    /// Timeouts and transient connection errors are retried up to
    /// `max_attempts` with exponential backoff; everything else fails at once.
    async fn execute_with_retry<F, T>(&self, operation: &str, command: F) -> Result<T, CacheError>
    where
        F: Fn(MultiplexedConnection) -> RedisFuture<T>,
    {
        let max_attempts = self.config.max_attempts.max(1);
        let response_timeout = Duration::from_millis(self.config.response_timeout_ms);
        let mut attempts = 0;
        let mut delay = self.config.retry_delay_ms;

        loop {
            attempts += 1;
            let conn = self.connection.clone();

            let error = match timeout(response_timeout, command(conn)).await {
                Ok(Ok(result)) => return Ok(result),
                Ok(Err(e)) if is_retriable_error(&e) => CacheError::Unavailable {
                    message: e.to_string(),
                },
                Ok(Err(e)) => {
                    error!("Redis {} failed: {}", operation, e);
                    return Err(CacheError::Unavailable {
                        message: e.to_string(),
                    });
                }
                Err(_) => CacheError::Timeout {
                    operation: operation.to_string(),
                },
            };

            if attempts >= max_attempts {
                error!(
                    "Redis {} failed after {} attempts: {}",
                    operation, attempts, error
                );
                return Err(error);
            }

            warn!(
                "Redis {} failed (attempt {}/{}): {}. Retrying in {}ms...",
                operation, attempts, max_attempts, error, delay
            );
            sleep(Duration::from_millis(delay)).await;
            // Exponential backoff with cap at 5 seconds
            delay = (delay * 2).min(5000);
        }
    }
}

#[async_trait]
impl SharedCache for RedisClient {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let key = self.config.make_key(key);
        debug!("Getting key '{}'", key);

        self.execute_with_retry("GET", |mut conn| {
            let key = key.clone();
            Box::pin(async move { conn.get::<_, Option<String>>(key).await })
        })
        .await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        let key = self.config.make_key(key);
        debug!("Setting key '{}'", key);

        self.execute_with_retry("SET", |mut conn| {
            let key = key.clone();
            let value = value.to_string();
            Box::pin(async move { conn.set::<_, _, ()>(key, value).await })
        })
        .await
    }

    async fn set_if_absent(&self, key: &str, value: &str) -> Result<bool, CacheError> {
        let key = self.config.make_key(key);
        debug!("Setting key '{}' if absent", key);

        self.execute_with_retry("SETNX", |mut conn| {
            let key = key.clone();
            let value = value.to_string();
            Box::pin(async move { conn.set_nx::<_, _, bool>(key, value).await })
        })
        .await
    }

    async fn set_with_expiry(
        &self,
        key: &str,
        value: &str,
        expiry_seconds: u64,
    ) -> Result<(), CacheError> {
        let key = self.config.make_key(key);
        debug!("Setting key '{}' with expiry {}s", key, expiry_seconds);

        self.execute_with_retry("SETEX", |mut conn| {
            let key = key.clone();
            let value = value.to_string();
            Box::pin(async move { conn.set_ex::<_, _, ()>(key, value, expiry_seconds).await })
        })
        .await
    }

    async fn delete(&self, key: &str) -> Result<bool, CacheError> {
        let key = self.config.make_key(key);
        debug!("Deleting key '{}'", key);

        let deleted_count = self
            .execute_with_retry("DEL", |mut conn| {
                let key = key.clone();
                Box::pin(async move { conn.del::<_, u32>(key).await })
            })
            .await?;

        Ok(deleted_count > 0)
    }

    async fn ping(&self) -> Result<(), CacheError> {
        match self.health_check().await? {
            true => Ok(()),
            false => Err(CacheError::unavailable("unexpected PING response")),
        }
    }
}

/// Check if a Redis error is retriable
///
/// Determines if an error is transient and the operation should be retried.
pub(crate) fn is_retriable_error(error: &RedisError) -> bool {
    error.is_io_error()
        || error.is_connection_dropped()
        || matches!(
            error.kind(),
            redis::ErrorKind::BusyLoadingError | redis::ErrorKind::TryAgain
        )
}

/// Mask sensitive parts of Redis URL for logging
pub(crate) fn mask_url(url: &str) -> String {
    if let Some(at_pos) = url.find('@') {
        if let Some(proto_end) = url.find("://") {
            let proto = &url[..proto_end + 3];
            let host_part = &url[at_pos..];
            return format!("{}****{}", proto, host_part);
        }
    }
    url.to_string()
}
