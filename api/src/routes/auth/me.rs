use actix_web::HttpResponse;

use crate::dto::auth::PrincipalResponse;
use crate::middleware::auth::AuthContext;

/// Handler for GET /api/v1/auth/me
pub async fn me(auth: AuthContext) -> HttpResponse {
    HttpResponse::Ok().json(PrincipalResponse::from(auth.0))
}
