//! In-process [`SharedCache`] double with outage injection and access counters.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::errors::CacheError;
use crate::repositories::SharedCache;

#[derive(Debug, Default)]
pub struct MockCache {
    entries: Mutex<HashMap<String, (String, Option<Instant>)>>,
    offline: AtomicBool,
    fail_writes: AtomicBool,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl MockCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every operation fails with `CacheError::Unavailable` while offline
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Write operations fail while reads keep working
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn reset_counters(&self) {
        self.reads.store(0, Ordering::SeqCst);
        self.writes.store(0, Ordering::SeqCst);
    }

    /// Reads an entry without touching the counters or the outage switches
    pub fn raw_get(&self, key: &str) -> Option<String> {
        let entries = self.entries.lock().unwrap();
        entries
            .get(key)
            .filter(|(_, expiry)| expiry.map_or(true, |at| Instant::now() < at))
            .map(|(value, _)| value.clone())
    }

    pub fn raw_set(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), (value.to_string(), None));
    }

    pub fn raw_remove(&self, key: &str) {
        self.entries.lock().unwrap().remove(key);
    }

    /// Remaining lifetime of an entry, `None` when absent or persistent
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        let entries = self.entries.lock().unwrap();
        entries
            .get(key)
            .and_then(|(_, expiry)| *expiry)
            .map(|at| at.saturating_duration_since(Instant::now()))
    }

    fn check_read(&self) -> Result<(), CacheError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            return Err(CacheError::unavailable("mock cache offline"));
        }
        Ok(())
    }

    fn check_write(&self) -> Result<(), CacheError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) || self.fail_writes.load(Ordering::SeqCst) {
            return Err(CacheError::unavailable("mock cache rejected write"));
        }
        Ok(())
    }

    fn put(&self, key: &str, value: &str, expiry: Option<Instant>) {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), (value.to_string(), expiry));
    }
}

#[async_trait]
impl SharedCache for MockCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.check_read()?;
        Ok(self.raw_get(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        self.check_write()?;
        self.put(key, value, None);
        Ok(())
    }

    async fn set_if_absent(&self, key: &str, value: &str) -> Result<bool, CacheError> {
        self.check_write()?;
        if self.raw_get(key).is_some() {
            return Ok(false);
        }
        self.put(key, value, None);
        Ok(true)
    }

    async fn set_with_expiry(
        &self,
        key: &str,
        value: &str,
        expiry_seconds: u64,
    ) -> Result<(), CacheError> {
        self.check_write()?;
        let expiry = Instant::now() + Duration::from_secs(expiry_seconds);
        self.put(key, value, Some(expiry));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, CacheError> {
        self.check_write()?;
        let removed = self.entries.lock().unwrap().remove(key);
        Ok(removed.is_some())
    }

    async fn ping(&self) -> Result<(), CacheError> {
        self.check_read()
    }
}
