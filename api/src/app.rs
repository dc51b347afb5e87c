//! Application state and factory
//!
//! This module holds the state shared by every worker and provides the
//! factory for creating the Actix-web application.

use std::sync::Arc;

use actix_web::{
    body::MessageBody,
    dev::{ServiceFactory, ServiceRequest, ServiceResponse},
    web, App, Error, HttpResponse,
};
use ak_core::repositories::{PrincipalResolver, SharedCache};
use ak_core::services::{BearerValidator, TokenService};
use ak_shared::{error_codes, ErrorResponse};
use tracing_actix_web::TracingLogger;

use crate::handlers::error::ApiError;
use crate::middleware::auth::JwtAuth;
use crate::routes::{auth, health, jwks};

/// Services shared by all request handlers
pub struct AppState {
    pub tokens: Arc<TokenService<dyn SharedCache>>,
    pub principals: Arc<dyn PrincipalResolver>,
}

impl AppState {
    pub fn new(
        tokens: Arc<TokenService<dyn SharedCache>>,
        principals: Arc<dyn PrincipalResolver>,
    ) -> Self {
        Self { tokens, principals }
    }
}

/// Create and configure the application with all dependencies
pub fn create_app(
    state: web::Data<AppState>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = Error,
        InitError = (),
    >,
> {
    let validator: Arc<dyn BearerValidator> = state.tokens.clone();

    App::new()
        .app_data(state)
        .app_data(web::Data::from(validator))
        .app_data(web::JsonConfig::default().error_handler(|err, _req| {
            ApiError::bad_request(format!("Invalid request body: {}", err)).into()
        }))
        .wrap(TracingLogger::default())
        // Unauthenticated endpoints
        .route("/health", web::get().to(health::health_check))
        .route("/.well-known/jwks.json", web::get().to(jwks::jwks))
        // API v1 routes
        .service(
            web::scope("/api/v1/auth")
                .route("/signin", web::post().to(auth::signin::signin))
                .route("/refresh", web::post().to(auth::refresh::refresh))
                .service(
                    web::resource("/logout")
                        .wrap(JwtAuth::new())
                        .route(web::post().to(auth::logout::logout)),
                )
                .service(
                    web::resource("/me")
                        .wrap(JwtAuth::new())
                        .route(web::get().to(auth::me::me)),
                ),
        )
        // Default 404 handler
        .default_service(web::route().to(not_found))
}

/// Default 404 handler
async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(ErrorResponse::new(
        error_codes::NOT_FOUND,
        "The requested resource was not found",
    ))
}
