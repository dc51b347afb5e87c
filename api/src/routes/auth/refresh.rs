use actix_web::{web, HttpRequest, HttpResponse};

use crate::app::AppState;
use crate::dto::auth::TokenResponse;
use crate::handlers::error::ApiError;
use crate::middleware::auth::parse_bearer;

/// Handler for POST /api/v1/auth/refresh
///
/// Exchanges the bearer token for a new one. The presented token stops
/// validating once the replacement is issued.
///
/// # Headers
///
/// ```text
/// Authorization: Bearer {token}
/// ```
///
/// ## Errors
/// - 401 Unauthorized: Missing header or a token that does not validate
/// - 500 Internal Server Error: The replacement could not be issued
/// - 503 Service Unavailable: Shared cache unreachable
pub async fn refresh(
    req: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let token = parse_bearer(req.headers())?;
    let issued = state.tokens.refresh(token).await?;

    Ok(HttpResponse::Ok().json(TokenResponse::from(issued)))
}
