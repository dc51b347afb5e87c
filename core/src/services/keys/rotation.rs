//! Background key rotation and multi-instance sync
//!
//! Two timers drive the key manager: a rotation timer that mints a new key
//! and prunes expired ones, and a sync timer that reloads the shared key set
//! so every instance converges on the same keys. Failed cycles are retried
//! with bounded exponential backoff.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use ak_shared::config::KeyConfig;
use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::{Interval, MissedTickBehavior};
use tracing::{error, info, warn};

use super::manager::KeyLifecycleManager;
use crate::errors::DomainError;
use crate::repositories::SharedCache;

/// Upper bound on the delay between retries
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Configuration for the key rotation service
#[derive(Debug, Clone)]
pub struct KeyRotationConfig {
    /// How often to rotate (in seconds), 0 disables scheduled rotation
    pub rotation_interval_seconds: u64,
    /// How often to reload the shared key set (in seconds), 0 disables sync
    pub sync_interval_seconds: u64,
    /// Attempts per cycle before giving up until the next tick
    pub max_attempts: u32,
    /// Delay before the first retry, doubled on every further attempt
    pub backoff_ms: u64,
}

impl Default for KeyRotationConfig {
    fn default() -> Self {
        Self {
            rotation_interval_seconds: 0,
            sync_interval_seconds: 60,
            max_attempts: 5,
            backoff_ms: 500,
        }
    }
}

impl From<&KeyConfig> for KeyRotationConfig {
    fn from(config: &KeyConfig) -> Self {
        Self {
            rotation_interval_seconds: config.rotation_interval_seconds,
            sync_interval_seconds: config.sync_interval_seconds,
            max_attempts: config.rotation_max_attempts,
            backoff_ms: config.rotation_backoff_ms,
        }
    }
}

/// Service driving scheduled rotation, pruning and sync
pub struct KeyRotationService<C: SharedCache + ?Sized + 'static> {
    manager: Arc<KeyLifecycleManager<C>>,
    config: KeyRotationConfig,
}

impl<C: SharedCache + ?Sized + 'static> KeyRotationService<C> {
    pub fn new(manager: Arc<KeyLifecycleManager<C>>, config: KeyRotationConfig) -> Self {
        Self { manager, config }
    }

    /// Run a single rotation cycle
    ///
    /// This method performs the following tasks:
    /// 1. Rotate to a freshly generated key
    /// 2. Prune retired keys past their grace period
    ///
    /// A failed rotation leaves the previous key set in place; pruning still runs.
    pub async fn run_rotation(&self) -> RotationReport {
        info!("Starting key rotation cycle");

        let mut report = RotationReport::default();

        let manager = Arc::clone(&self.manager);
        match self
            .with_retry("rotate", move || {
                let manager = Arc::clone(&manager);
                async move { manager.rotate().await }
            })
            .await
        {
            Ok(kid) => report.new_kid = Some(kid),
            Err(e) => {
                error!("Key rotation failed: {}", e);
                report.errors.push(format!("Rotation error: {}", e));
            }
        }

        self.prune_into(&mut report).await;

        info!(
            "Key rotation cycle completed - New key: {:?}, Pruned: {}",
            report.new_kid,
            report.pruned.len()
        );

        report
    }

    /// Run a single sync cycle: reload the shared key set, then prune
    pub async fn run_sync(&self) -> RotationReport {
        let mut report = RotationReport::default();

        let manager = Arc::clone(&self.manager);
        match self
            .with_retry("sync", move || {
                let manager = Arc::clone(&manager);
                async move { manager.sync().await }
            })
            .await
        {
            Ok(changed) => report.reloaded = changed,
            Err(e) => {
                error!("Key set sync failed: {}", e);
                report.errors.push(format!("Sync error: {}", e));
            }
        }

        self.prune_into(&mut report).await;
        report
    }

    /// Start the rotation and sync timers as a background task
    ///
    /// The first tick of each timer fires one full interval after start,
    /// since startup has just initialized the keys.
    ///
    /// # Returns
    /// * `Some(handle)` - Abort it on shutdown
    /// * `None` - Both timers are disabled
    pub fn start_background_task(self: Arc<Self>) -> Option<JoinHandle<()>> {
        let rotation_secs = self.config.rotation_interval_seconds;
        let sync_secs = self.config.sync_interval_seconds;

        if rotation_secs == 0 && sync_secs == 0 {
            warn!("Key rotation and sync are both disabled");
            return None;
        }

        Some(tokio::spawn(async move {
            info!(
                "Key rotation service started - rotation every {}s, sync every {}s (0 = off)",
                rotation_secs, sync_secs
            );

            let mut rotation_timer = delayed_interval(rotation_secs);
            let mut sync_timer = delayed_interval(sync_secs);

            loop {
                tokio::select! {
                    _ = tick(&mut rotation_timer) => {
                        let report = self.run_rotation().await;
                        if !report.is_success() {
                            warn!("Rotation cycle completed with errors: {:?}", report.errors);
                        }
                    }
                    _ = tick(&mut sync_timer) => {
                        let report = self.run_sync().await;
                        if !report.is_success() {
                            warn!("Sync cycle completed with errors: {:?}", report.errors);
                        }
                    }
                }
            }
        }))
    }

    async fn prune_into(&self, report: &mut RotationReport) {
        let manager = Arc::clone(&self.manager);
        match self
            .with_retry("prune", move || {
                let manager = Arc::clone(&manager);
                async move { manager.prune(Utc::now()).await }
            })
            .await
        {
            Ok(pruned) => report.pruned = pruned,
            Err(e) => {
                error!("Key pruning failed: {}", e);
                report.errors.push(format!("Prune error: {}", e));
            }
        }
    }

    async fn with_retry<T, F, Fut>(&self, operation: &str, mut attempt: F) -> Result<T, DomainError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, DomainError>>,
    {
        let max_attempts = self.config.max_attempts.max(1);
        let mut delay = Duration::from_millis(self.config.backoff_ms);

        for attempt_no in 1..max_attempts {
            match attempt().await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    warn!(
                        operation,
                        attempt = attempt_no,
                        max_attempts,
                        "Attempt failed, retrying in {:?}: {}",
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                    delay = (delay * 2).min(MAX_BACKOFF);
                }
            }
        }

        attempt().await
    }
}

fn delayed_interval(seconds: u64) -> Option<Interval> {
    if seconds == 0 {
        return None;
    }
    let period = Duration::from_secs(seconds);
    let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    Some(interval)
}

async fn tick(timer: &mut Option<Interval>) {
    match timer {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

/// Result of a rotation or sync cycle
#[derive(Debug, Default)]
pub struct RotationReport {
    /// Kid of the key minted in this cycle
    pub new_kid: Option<String>,
    /// Whether a sync picked up a changed key set
    pub reloaded: bool,
    /// Kids removed after their grace period
    pub pruned: Vec<String>,
    /// Any errors encountered during the cycle
    pub errors: Vec<String>,
}

impl RotationReport {
    /// Check if the cycle was successful (no errors)
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}
