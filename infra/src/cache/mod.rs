//! Cache module: shared cache backends
//!
//! This module provides the Redis client used in multi-instance deployments
//! and an in-process map for single-instance development.

pub mod memory;
pub mod redis_client;


use std::sync::Arc;

use ak_core::repositories::SharedCache;
use ak_shared::config::CacheBackend;
use tracing::{info, warn};

use crate::InfrastructureError;

pub use memory::MemoryCache;
pub use redis_client::RedisClient;

// Re-export commonly used types
pub use ak_shared::config::CacheConfig;

/// Builds the cache backend selected by the configuration
pub async fn build_cache(config: &CacheConfig) -> Result<Arc<dyn SharedCache>, InfrastructureError> {
    let cache: Arc<dyn SharedCache> = match config.backend {
        CacheBackend::Redis => Arc::new(RedisClient::new(config.clone()).await?),
        CacheBackend::Memory => {
            warn!("Using the in-memory cache; keys and sessions are not shared between instances");
            Arc::new(MemoryCache::from_config(config))
        }
    };

    info!(backend = ?config.backend, "Shared cache ready");
    Ok(cache)
}
