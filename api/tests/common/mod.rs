//! Shared setup for the HTTP integration tests

use std::sync::Arc;

use actix_web::web;
use ak_api::app::AppState;
use ak_core::repositories::SharedCache;
use ak_core::services::{KeyLifecycleManager, TokenService, TokenServiceConfig};
use ak_core::testutil::{test_key_config, FixtureKeyGenerator, MockCache};
use ak_infra::principals::InMemoryPrincipalStore;

pub const EMAIL: &str = "alice@example.com";
pub const PASSWORD: &str = "correct horse";
pub const PRINCIPAL_ID: &str = "user-42";

pub struct TestContext {
    pub cache: Arc<MockCache>,
    pub keys: Arc<KeyLifecycleManager<dyn SharedCache>>,
    pub state: web::Data<AppState>,
}

/// Initialized keys over a mock cache and one seeded principal
pub async fn setup() -> TestContext {
    let cache = Arc::new(MockCache::new());
    let shared: Arc<dyn SharedCache> = cache.clone();

    let keys = Arc::new(KeyLifecycleManager::new(
        shared,
        Arc::new(FixtureKeyGenerator::new()),
        test_key_config(),
    ));
    keys.initialize().await.unwrap();

    let tokens = Arc::new(TokenService::new(
        Arc::clone(&keys),
        TokenServiceConfig::default(),
    ));

    let mut principals = InMemoryPrincipalStore::new();
    principals.add(PRINCIPAL_ID, EMAIL, PASSWORD, 4).unwrap();

    TestContext {
        cache,
        keys,
        state: web::Data::new(AppState::new(tokens, Arc::new(principals))),
    }
}
