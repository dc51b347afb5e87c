//! Signing key lifecycle: initialization, rotation, sync and pruning

use std::sync::{Arc, Mutex as StdMutex};

use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::Algorithm;
use rsa::RsaPrivateKey;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::config::KeyManagerConfig;
use super::generator::KeyGenerator;
use super::jwks::JwksPublisher;
use crate::domain::entities::signing_key::kid_for;
use crate::domain::entities::{KeySet, SigningKey};
use crate::errors::{CacheError, DomainError, KeyError};
use crate::repositories::{SharedCache, KEYSET_KEY};

/// How [`KeyLifecycleManager::initialize`] obtained its keys
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitOutcome {
    /// A key set already existed in the shared cache
    Loaded { keys: usize, current_kid: String },
    /// No key set existed; a first key was generated and persisted
    Generated { kid: String },
}

impl InitOutcome {
    pub fn current_kid(&self) -> &str {
        match self {
            InitOutcome::Loaded { current_kid, .. } => current_kid,
            InitOutcome::Generated { kid } => kid,
        }
    }
}

/// Owns the trusted signing keys of this instance
///
/// Readers take a cheap snapshot (`Arc<KeySet>`) under a read lock that is
/// only ever held for a pointer copy. Every mutation builds a complete new
/// set, persists it, republishes the JWKS and then swaps the snapshot; the
/// `mutation` mutex keeps those sequences from interleaving.
pub struct KeyLifecycleManager<C: SharedCache + ?Sized> {
    cache: Arc<C>,
    generator: Arc<dyn KeyGenerator>,
    publisher: JwksPublisher<C>,
    config: KeyManagerConfig,
    keys: RwLock<Arc<KeySet>>,
    mutation: Mutex<()>,
    last_reload: StdMutex<Option<Instant>>,
}

impl<C: SharedCache + ?Sized> KeyLifecycleManager<C> {
    pub fn new(cache: Arc<C>, generator: Arc<dyn KeyGenerator>, config: KeyManagerConfig) -> Self {
        let publisher = JwksPublisher::new(
            Arc::clone(&cache),
            config.algorithm,
            config.jwks_ttl_seconds,
        );

        Self {
            cache,
            generator,
            publisher,
            config,
            keys: RwLock::new(Arc::new(KeySet::new())),
            mutation: Mutex::new(()),
            last_reload: StdMutex::new(None),
        }
    }

    pub fn cache(&self) -> Arc<C> {
        Arc::clone(&self.cache)
    }

    pub fn publisher(&self) -> &JwksPublisher<C> {
        &self.publisher
    }

    pub fn algorithm(&self) -> Algorithm {
        self.config.algorithm
    }

    pub fn config(&self) -> &KeyManagerConfig {
        &self.config
    }

    /// Current in-memory key set
    pub async fn snapshot(&self) -> Arc<KeySet> {
        Arc::clone(&*self.keys.read().await)
    }

    /// Loads the key set from the shared cache, or generates the first key
    ///
    /// Calling this again on an initialized deployment loads the existing set
    /// and generates nothing. When several instances start against an empty
    /// cache at once, exactly one key set wins the conditional write and the
    /// others adopt it.
    ///
    /// # Returns
    /// * `Ok(InitOutcome)` - Keys are loaded and the JWKS is published
    /// * `Err(KeyStoreUnavailable)` - The cache failed or held a corrupt set
    /// * `Err(KeyGenerationFailed)` - A first key was needed and could not be made
    pub async fn initialize(&self) -> Result<InitOutcome, DomainError> {
        let _guard = self.mutation.lock().await;

        let stored = self.load_stored().await?;
        if let Some(existing) = stored.as_ref().filter(|set| !set.is_empty()) {
            let existing = existing.clone();
            self.ensure_published(&existing).await?;
            let outcome = InitOutcome::Loaded {
                keys: existing.len(),
                current_kid: current_kid(&existing)?,
            };
            self.install(existing).await;
            info!(
                current_kid = outcome.current_kid(),
                "Loaded signing keys from the shared cache"
            );
            return Ok(outcome);
        }

        info!("No signing keys in the shared cache, generating the first key pair");
        let private_key = self.generate_private_key().await?;
        let created_at = next_created_at(None);
        let key = SigningKey::from_private_key(kid_for(created_at), created_at, private_key)?;
        let kid = key.kid().to_string();

        let mut set = KeySet::new();
        set.insert(key);
        let json = set.to_json()?;

        // An existing but empty entry cannot be claimed with a conditional write.
        let won = if stored.is_some() {
            self.cache.set(KEYSET_KEY, &json).await.map_err(store_error)?;
            true
        } else {
            self.cache
                .set_if_absent(KEYSET_KEY, &json)
                .await
                .map_err(store_error)?
        };

        if !won {
            let adopted = self
                .load_stored()
                .await?
                .filter(|set| !set.is_empty())
                .ok_or_else(|| KeyError::KeyStoreUnavailable {
                    message: "Key set vanished during initialization".to_string(),
                })?;
            self.ensure_published(&adopted).await?;
            let outcome = InitOutcome::Loaded {
                keys: adopted.len(),
                current_kid: current_kid(&adopted)?,
            };
            self.install(adopted).await;
            info!(
                current_kid = outcome.current_kid(),
                "Another instance initialized the key set first, adopted it"
            );
            return Ok(outcome);
        }

        self.publisher.publish(&set).await?;
        self.install(set).await;
        info!(kid = %kid, "Generated and published the first signing key");
        Ok(InitOutcome::Generated { kid })
    }

    /// Generates a new current key, retiring the previous one
    ///
    /// The previous key stays in the set, and therefore in the JWKS, so tokens
    /// it signed keep validating until it is pruned. The new key is persisted
    /// and published before it becomes visible to the signer.
    ///
    /// # Returns
    /// * `Ok(kid)` - Identifier of the new current key
    pub async fn rotate(&self) -> Result<String, DomainError> {
        // Generation can take a while; do it before serializing against other mutations.
        let private_key = self.generate_private_key().await?;

        let _guard = self.mutation.lock().await;
        let mut set = self.latest_set().await?;

        let previous = set.current();
        let created_at = next_created_at(previous.as_ref().map(|k| k.created_at()));
        let key = SigningKey::from_private_key(kid_for(created_at), created_at, private_key)?;
        let kid = key.kid().to_string();

        if let Some(previous) = previous {
            set.insert(previous.retired(created_at));
        }
        set.insert(key);

        self.persist(&set).await?;
        self.publisher.publish(&set).await?;
        self.install(set).await;

        info!(kid = %kid, "Rotated signing key");
        Ok(kid)
    }

    /// Reloads the key set from the shared cache
    ///
    /// Keeps instances converged after another instance rotates or prunes. If
    /// the entry has disappeared (eviction, flush) the local set is written
    /// back so the deployment does not lose its keys.
    ///
    /// # Returns
    /// * `Ok(true)` - The loaded set changed
    /// * `Ok(false)` - Nothing new
    pub async fn sync(&self) -> Result<bool, DomainError> {
        let _guard = self.mutation.lock().await;
        self.mark_reloaded();

        let local = self.snapshot().await;
        match self.load_stored().await? {
            Some(stored) if !stored.is_empty() => {
                self.ensure_published(&stored).await?;
                let changed = stored.fingerprint() != local.fingerprint();
                if changed {
                    info!(
                        keys = stored.len(),
                        current_kid = ?stored.current().map(|k| k.kid().to_string()),
                        "Key set changed in the shared cache, reloaded"
                    );
                    self.install(stored).await;
                }
                Ok(changed)
            }
            _ if local.is_empty() => Ok(false),
            _ => {
                warn!("Key set missing from the shared cache, restoring the local copy");
                self.persist(&local).await?;
                self.publisher.publish(&local).await?;
                Ok(false)
            }
        }
    }

    /// Removes retired keys whose grace period has elapsed at `now`
    ///
    /// The current key is never pruned.
    ///
    /// # Returns
    /// * `Ok(kids)` - Identifiers of the removed keys, possibly empty
    pub async fn prune(&self, now: DateTime<Utc>) -> Result<Vec<String>, DomainError> {
        let _guard = self.mutation.lock().await;
        let mut set = self.latest_set().await?;

        let expired = set.prunable(self.config.grace_period, now);
        if expired.is_empty() {
            debug!("No retired keys past their grace period");
            return Ok(expired);
        }

        for kid in &expired {
            set.remove(kid);
        }

        self.persist(&set).await?;
        self.publisher.publish(&set).await?;
        self.install(set).await;

        info!(pruned = ?expired, "Pruned retired signing keys");
        Ok(expired)
    }

    /// The key new tokens are signed with
    pub async fn current_key(&self) -> Result<Arc<SigningKey>, DomainError> {
        self.snapshot()
            .await
            .current()
            .ok_or_else(|| KeyError::NoKeyAvailable.into())
    }

    /// Finds the verification key for `kid`
    ///
    /// A miss triggers one reload from the shared cache, at most once per
    /// `min_reload_interval`, so a key minted by another instance is picked up
    /// without letting unknown-kid tokens hammer the cache.
    ///
    /// # Returns
    /// * `Ok(Some(key))` - Key is trusted
    /// * `Ok(None)` - Unknown kid
    /// * `Err(KeyStoreUnavailable)` - The reload failed
    pub async fn resolve(&self, kid: &str) -> Result<Option<Arc<SigningKey>>, DomainError> {
        if let Some(key) = self.snapshot().await.get(kid) {
            return Ok(Some(key));
        }

        if !self.claim_reload() {
            debug!(kid, "Unknown kid, reload throttled");
            return Ok(None);
        }

        debug!(kid, "Unknown kid, reloading key set from the shared cache");
        self.sync().await?;
        Ok(self.snapshot().await.get(kid))
    }

    async fn generate_private_key(&self) -> Result<RsaPrivateKey, DomainError> {
        let generator = Arc::clone(&self.generator);
        let private_key = tokio::task::spawn_blocking(move || generator.generate())
            .await
            .map_err(|e| KeyError::KeyGenerationFailed {
                message: format!("Key generation task failed: {}", e),
            })??;
        Ok(private_key)
    }

    /// Reads and parses the persisted set; `Ok(None)` when the entry is absent
    async fn load_stored(&self) -> Result<Option<KeySet>, DomainError> {
        let json = self.cache.get(KEYSET_KEY).await.map_err(store_error)?;
        match json {
            Some(json) => Ok(Some(KeySet::from_json(&json)?)),
            None => Ok(None),
        }
    }

    /// The persisted set if there is one, else the local snapshot
    async fn latest_set(&self) -> Result<KeySet, DomainError> {
        match self.load_stored().await? {
            Some(stored) if !stored.is_empty() => Ok(stored),
            _ => Ok(self.snapshot().await.as_ref().clone()),
        }
    }

    async fn persist(&self, set: &KeySet) -> Result<(), DomainError> {
        let json = set.to_json()?;
        self.cache.set(KEYSET_KEY, &json).await.map_err(store_error)?;
        Ok(())
    }

    async fn ensure_published(&self, set: &KeySet) -> Result<(), DomainError> {
        if !self.publisher.is_published().await? {
            info!("JWKS document missing, republishing");
            self.publisher.publish(set).await?;
        }
        Ok(())
    }

    async fn install(&self, set: KeySet) {
        *self.keys.write().await = Arc::new(set);
    }

    fn claim_reload(&self) -> bool {
        let mut last = match self.last_reload.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let due = last.map_or(true, |at| at.elapsed() >= self.config.min_reload_interval);
        if due {
            *last = Some(Instant::now());
        }
        due
    }

    fn mark_reloaded(&self) {
        let mut last = match self.last_reload.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *last = Some(Instant::now());
    }
}

fn store_error(error: CacheError) -> KeyError {
    KeyError::KeyStoreUnavailable {
        message: error.to_string(),
    }
}

fn current_kid(set: &KeySet) -> Result<String, KeyError> {
    set.current()
        .map(|k| k.kid().to_string())
        .ok_or(KeyError::NoKeyAvailable)
}

/// Creation time for a new key, in whole milliseconds and strictly after
/// `latest` so kids stay unique and ordered
fn next_created_at(latest: Option<DateTime<Utc>>) -> DateTime<Utc> {
    let now_ms = Utc::now().timestamp_millis();
    let millis = match latest {
        Some(latest) => now_ms.max(latest.timestamp_millis() + 1),
        None => now_ms,
    };
    Utc.timestamp_millis_opt(millis)
        .single()
        .unwrap_or_else(Utc::now)
}
