use actix_web::{
    http::header::{ContentType, CACHE_CONTROL},
    web, HttpResponse,
};

use crate::app::AppState;
use crate::handlers::error::ApiError;

/// How long relying services may cache the key set
const JWKS_CACHE_CONTROL: &str = "public, max-age=300";

/// Handler for GET /.well-known/jwks.json
///
/// Returns the published document byte for byte. When nothing is published
/// the response is a 500 error body, never a partial key set.
pub async fn jwks(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let document = state.tokens.keys().publisher().serve().await?;

    Ok(HttpResponse::Ok()
        .content_type(ContentType::json())
        .insert_header((CACHE_CONTROL, JWKS_CACHE_CONTROL))
        .body(document))
}
