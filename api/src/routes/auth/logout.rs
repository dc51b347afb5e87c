use actix_web::{web, HttpResponse};
use tracing::info;

use crate::app::AppState;
use crate::dto::auth::LogoutResponse;
use crate::handlers::error::ApiError;
use crate::middleware::auth::AuthContext;

/// Handler for POST /api/v1/auth/logout
///
/// Revokes the authenticated principal's session. Requires authentication
/// via Bearer token in the Authorization header.
pub async fn logout(
    state: web::Data<AppState>,
    auth: AuthContext,
) -> Result<HttpResponse, ApiError> {
    state.tokens.logout(&auth.principal_id).await?;
    info!(principal_id = %auth.principal_id, "Principal logged out");

    Ok(HttpResponse::Ok().json(LogoutResponse {
        message: "Logged out successfully".to_string(),
    }))
}
