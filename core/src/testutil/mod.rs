//! Test support shared by this crate's unit tests and, behind the
//! `test-utils` feature, by the API crate's integration tests.

mod cache;
mod keys;

use std::sync::Arc;

pub use cache::MockCache;
pub use keys::{
    fixture_private_key, FailingKeyGenerator, FixtureKeyGenerator, FIXTURE_KEYS, FIXTURE_KEY_1,
    FIXTURE_KEY_2, FIXTURE_KEY_3,
};

use crate::services::keys::{KeyGenerator, KeyLifecycleManager, KeyManagerConfig};
use crate::services::token::{TokenService, TokenServiceConfig};

/// Key manager settings for tests: no reload throttling
pub fn test_key_config() -> KeyManagerConfig {
    KeyManagerConfig {
        min_reload_interval: std::time::Duration::ZERO,
        ..KeyManagerConfig::default()
    }
}

/// An uninitialized key manager backed by `cache` and the fixture keys
pub fn key_manager(cache: Arc<MockCache>) -> Arc<KeyLifecycleManager<MockCache>> {
    key_manager_with(cache, Arc::new(FixtureKeyGenerator::new()), test_key_config())
}

pub fn key_manager_with(
    cache: Arc<MockCache>,
    generator: Arc<dyn KeyGenerator>,
    config: KeyManagerConfig,
) -> Arc<KeyLifecycleManager<MockCache>> {
    Arc::new(KeyLifecycleManager::new(cache, generator, config))
}

/// A key manager that has already generated and published its first key
pub async fn initialized_manager(cache: Arc<MockCache>) -> Arc<KeyLifecycleManager<MockCache>> {
    let manager = key_manager(cache);
    manager
        .initialize()
        .await
        .expect("initialization against the mock cache must succeed");
    manager
}

/// A token service over an initialized key manager, default token settings
pub async fn token_service(cache: Arc<MockCache>) -> TokenService<MockCache> {
    let manager = initialized_manager(cache).await;
    TokenService::new(manager, TokenServiceConfig::default())
}
