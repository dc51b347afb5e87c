use std::sync::Arc;

use actix_web::{web, HttpServer};
use anyhow::{anyhow, Context};
use tracing::info;

use ak_api::app::{create_app, AppState};
use ak_api::telemetry::init_tracing;
use ak_core::services::{
    KeyLifecycleManager, KeyManagerConfig, KeyRotationConfig, KeyRotationService,
    RsaKeyGenerator, TokenService, TokenServiceConfig,
};
use ak_infra::cache::build_cache;
use ak_infra::principals::{InMemoryPrincipalStore, DEFAULT_HASH_COST};
use ak_shared::AppConfig;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;
    init_tracing(&config.logging).map_err(|e| anyhow!("Failed to initialise tracing: {}", e))?;

    info!(environment = %config.environment, "Starting AuthKeep server");

    let cache = build_cache(&config.cache)
        .await
        .context("Failed to connect to the shared cache")?;

    let key_config = KeyManagerConfig::from_app_config(&config.token, &config.keys)?;
    let keys = Arc::new(KeyLifecycleManager::new(
        cache,
        Arc::new(RsaKeyGenerator::new(config.keys.rsa_bits)),
        key_config,
    ));

    // No keys, no service: refuse to start rather than serve 503s
    let outcome = keys
        .initialize()
        .await
        .context("Failed to initialise signing keys")?;
    info!(kid = outcome.current_kid(), "Signing keys ready");

    let token_config = TokenServiceConfig::try_from(&config.token)?;
    let tokens = Arc::new(TokenService::new(Arc::clone(&keys), token_config));

    let principals = Arc::new(
        InMemoryPrincipalStore::from_seeds(&config.principals, DEFAULT_HASH_COST)
            .context("Failed to build the principal store")?,
    );

    let rotation = Arc::new(KeyRotationService::new(
        Arc::clone(&keys),
        KeyRotationConfig::from(&config.keys),
    ));
    let rotation_job = rotation.start_background_task();

    let state = web::Data::new(AppState::new(tokens, principals));
    let bind_address = config.server.bind_address();
    info!("Server will bind to: {}", bind_address);

    let mut server = HttpServer::new(move || create_app(state.clone()));
    if config.server.workers > 0 {
        server = server.workers(config.server.workers);
    }
    let result = server.bind(&bind_address)?.run().await;

    if let Some(job) = rotation_job {
        job.abort();
        info!("Key rotation job stopped");
    }

    result.context("HTTP server failed")
}
