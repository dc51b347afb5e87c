use actix_web::{web, HttpResponse};
use ak_core::errors::DomainError;
use ak_core::repositories::Credentials;
use tracing::info;
use validator::Validate;

use crate::app::AppState;
use crate::dto::auth::{SigninRequest, TokenResponse};
use crate::handlers::error::ApiError;

/// Handler for POST /api/v1/auth/signin
///
/// Resolves the credentials to a principal and issues a token bound to a
/// fresh session, replacing any session the principal already had.
///
/// # Request Body
///
/// ```json
/// {
///     "email": "alice@example.com",
///     "password": "string"
/// }
/// ```
///
/// # Response
///
/// ## Success (200 OK)
/// ```json
/// {
///     "token": "eyJ...",
///     "token_type": "Bearer",
///     "expires_in": 3600,
///     "expires_at": "2024-01-01T01:00:00Z"
/// }
/// ```
///
/// ## Errors
/// - 400 Bad Request: Invalid email or empty password
/// - 401 Unauthorized: Unknown principal or wrong password
/// - 500 Internal Server Error: Token could not be issued
/// - 503 Service Unavailable: Shared cache unreachable
pub async fn signin(
    state: web::Data<AppState>,
    request: web::Json<SigninRequest>,
) -> Result<HttpResponse, ApiError> {
    request.validate()?;

    let credentials = Credentials::from(request.into_inner());
    let principal_id = state
        .principals
        .resolve(&credentials)
        .await?
        .ok_or(DomainError::InvalidCredentials)?;

    let issued = state.tokens.issue(&principal_id).await?;
    info!(principal_id = %principal_id, kid = %issued.kid, "Principal signed in");

    Ok(HttpResponse::Ok().json(TokenResponse::from(issued)))
}
