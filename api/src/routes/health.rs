use actix_web::{web, HttpResponse};
use ak_shared::{error_codes, ErrorResponse};
use tracing::warn;

use crate::app::AppState;

/// Handler for GET /health
///
/// Reports healthy only while the shared cache answers.
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let keys = state.tokens.keys();

    if let Err(e) = keys.cache().ping().await {
        warn!(error = %e, "Health check failed");
        return HttpResponse::ServiceUnavailable().json(
            ErrorResponse::new(error_codes::SERVICE_UNAVAILABLE, "Shared cache unreachable")
                .add_detail("status", "unhealthy"),
        );
    }

    let current_kid = keys
        .snapshot()
        .await
        .current()
        .map(|key| key.kid().to_string());

    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "authkeep",
        "version": env!("CARGO_PKG_VERSION"),
        "current_kid": current_kid,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
