//! In-process cache backend
//!
//! Suitable for a single instance in development and for tests. Entries
//! with an expiry are dropped lazily on access.

use std::collections::HashMap;
use std::time::Duration;

use ak_core::errors::CacheError;
use ak_core::repositories::SharedCache;
use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::cache::CacheConfig;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| now < at)
    }
}

/// [`SharedCache`] kept in a mutex-guarded map
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, Entry>>,
    key_prefix: Option<String>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses the same key namespacing as the Redis backend
    pub fn from_config(config: &CacheConfig) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            key_prefix: config.key_prefix.clone(),
        }
    }

    /// Number of live entries
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .lock()
            .await
            .values()
            .filter(|entry| entry.is_live(now))
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn make_key(&self, key: &str) -> String {
        match &self.key_prefix {
            Some(prefix) => format!("{}:{}", prefix, key),
            None => key.to_string(),
        }
    }

    async fn insert(&self, key: &str, value: &str, expires_at: Option<Instant>) {
        let key = self.make_key(key);
        debug!("Setting key '{}'", key);
        self.entries.lock().await.insert(
            key,
            Entry {
                value: value.to_string(),
                expires_at,
            },
        );
    }
}

#[async_trait]
impl SharedCache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let key = self.make_key(key);
        let now = Instant::now();
        let mut entries = self.entries.lock().await;

        match entries.get(&key) {
            Some(entry) if entry.is_live(now) => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(&key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        self.insert(key, value, None).await;
        Ok(())
    }

    async fn set_if_absent(&self, key: &str, value: &str) -> Result<bool, CacheError> {
        let full_key = self.make_key(key);
        let now = Instant::now();
        let mut entries = self.entries.lock().await;

        if entries.get(&full_key).is_some_and(|entry| entry.is_live(now)) {
            return Ok(false);
        }

        entries.insert(
            full_key,
            Entry {
                value: value.to_string(),
                expires_at: None,
            },
        );
        Ok(true)
    }

    async fn set_with_expiry(
        &self,
        key: &str,
        value: &str,
        expiry_seconds: u64,
    ) -> Result<(), CacheError> {
        let expires_at = Instant::now() + Duration::from_secs(expiry_seconds);
        self.insert(key, value, Some(expires_at)).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, CacheError> {
        let key = self.make_key(key);
        let now = Instant::now();
        let removed = self.entries.lock().await.remove(&key);
        Ok(removed.is_some_and(|entry| entry.is_live(now)))
    }

    async fn ping(&self) -> Result<(), CacheError> {
        Ok(())
    }
}
