//! Bearer token authentication middleware for protecting API endpoints.
//!
//! The middleware extracts the token from the `Authorization` header, runs it
//! through the [`BearerValidator`] registered as app data and injects the
//! resulting [`AuthContext`] into the request extensions.

use std::future::{ready, Ready};
use std::ops::Deref;
use std::rc::Rc;
use std::task::{Context, Poll};

use actix_web::{
    body::EitherBody,
    dev::{Payload, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{HeaderMap, AUTHORIZATION},
    web, Error, FromRequest, HttpMessage, HttpRequest,
};
use ak_core::domain::entities::AuthenticatedPrincipal;
use ak_core::services::BearerValidator;
use futures_util::future::LocalBoxFuture;
use tracing::error;

use crate::handlers::error::ApiError;

/// Authenticated principal injected into requests
#[derive(Debug, Clone)]
pub struct AuthContext(pub AuthenticatedPrincipal);

impl Deref for AuthContext {
    type Target = AuthenticatedPrincipal;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Bearer authentication middleware factory
///
/// Requires `web::Data<dyn BearerValidator>` in the app data.
#[derive(Debug, Clone, Default)]
pub struct JwtAuth;

impl JwtAuth {
    pub fn new() -> Self {
        Self
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtAuthMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtAuthMiddleware {
            service: Rc::new(service),
        }))
    }
}

/// Bearer authentication middleware service
pub struct JwtAuthMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for JwtAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, ctx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            let token = match parse_bearer(req.headers()).map(str::to_string) {
                Ok(token) => token,
                Err(e) => return Ok(req.error_response(e).map_into_right_body()),
            };

            let validator = match req.app_data::<web::Data<dyn BearerValidator>>() {
                Some(validator) => validator.clone(),
                None => {
                    error!("No bearer validator registered; rejecting request");
                    return Ok(req.error_response(ApiError::internal()).map_into_right_body());
                }
            };

            match validator.validate_bearer(&token).await {
                Ok(principal) => {
                    req.extensions_mut().insert(AuthContext(principal));
                    let res = service.call(req).await?;
                    Ok(res.map_into_left_body())
                }
                Err(e) => Ok(req.error_response(ApiError::from(e)).map_into_right_body()),
            }
        })
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` header
///
/// # Returns
/// * `Ok(token)` - Header present with a non-empty bearer token
/// * `Err(missing_auth_header)` - No `Authorization` header
/// * `Err(invalid_auth_header)` - Any other scheme, or an empty token
pub fn parse_bearer(headers: &HeaderMap) -> Result<&str, ApiError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or_else(ApiError::missing_auth_header)?;
    let value = value.to_str().map_err(|_| ApiError::invalid_auth_header())?;

    match value.strip_prefix("Bearer ").map(str::trim) {
        Some(token) if !token.is_empty() => Ok(token),
        _ => Err(ApiError::invalid_auth_header()),
    }
}

/// Extractor for required authentication
impl FromRequest for AuthContext {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let result = req
            .extensions()
            .get::<AuthContext>()
            .cloned()
            .ok_or_else(|| Error::from(ApiError::invalid_token()));

        ready(result)
    }
}
