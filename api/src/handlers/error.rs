//! Mapping from domain errors to HTTP responses
//!
//! Every token rejection collapses into one `invalid_token` response so a
//! caller cannot tell which check failed; the precise kind is only logged.

use std::fmt;

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use ak_core::errors::{DomainError, KeyError, TokenError};
use ak_shared::{error_codes, ErrorResponse};
use tracing::{error, warn};
use validator::ValidationErrors;

/// An error ready to be rendered as a JSON [`ErrorResponse`]
#[derive(Debug, Clone)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
    fields: Vec<String>,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            fields: Vec::new(),
        }
    }

    pub fn missing_auth_header() -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            error_codes::MISSING_AUTH_HEADER,
            "Authorization header is required",
        )
    }

    pub fn invalid_auth_header() -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            error_codes::INVALID_AUTH_HEADER,
            "Authorization header must be 'Bearer <token>'",
        )
    }

    pub fn invalid_token() -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            error_codes::INVALID_TOKEN,
            "Invalid or expired token",
        )
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error_codes::VALIDATION_ERROR, message)
    }

    pub fn internal() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            error_codes::INTERNAL_ERROR,
            "An internal error occurred",
        )
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &'static str {
        self.code
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        self.status
    }

    fn error_response(&self) -> HttpResponse {
        let mut body = ErrorResponse::new(self.code, &self.message);
        if !self.fields.is_empty() {
            body = body.add_detail("fields", &self.fields);
        }
        HttpResponse::build(self.status).json(body)
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields: Vec<String> = errors
            .field_errors()
            .keys()
            .map(|field| field.to_string())
            .collect();
        fields.sort();

        Self {
            fields,
            ..Self::bad_request("Request validation failed")
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(error: DomainError) -> Self {
        handle_domain_error(&error)
    }
}

/// Maps a domain error onto its HTTP status and error code
pub fn handle_domain_error(error: &DomainError) -> ApiError {
    match error {
        DomainError::Token(TokenError::SigningFailed | TokenError::SessionWriteFailed { .. }) => {
            error!(error = %error, "Token issuance failed");
            ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                error_codes::TOKEN_ISSUE_FAILED,
                "Token could not be issued",
            )
        }
        DomainError::Token(kind) => {
            warn!(reason = %kind, "Rejecting request with invalid token");
            ApiError::invalid_token()
        }
        DomainError::InvalidCredentials => ApiError::new(
            StatusCode::UNAUTHORIZED,
            error_codes::INVALID_CREDENTIALS,
            "Invalid email or password",
        ),
        DomainError::Validation { message } => ApiError::bad_request(message.clone()),
        DomainError::Key(KeyError::KeyGenerationFailed { .. }) => {
            error!(error = %error, "Key generation failed");
            ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                error_codes::TOKEN_ISSUE_FAILED,
                "Token could not be issued",
            )
        }
        DomainError::Key(KeyError::JwksUnavailable) => {
            error!("JWKS document unavailable");
            ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                error_codes::JWKS_UNAVAILABLE,
                "Key set is unavailable",
            )
        }
        DomainError::Key(KeyError::KeyStoreUnavailable { .. } | KeyError::NoKeyAvailable)
        | DomainError::Cache(_) => {
            error!(error = %error, "Dependency unavailable");
            ApiError::new(
                StatusCode::SERVICE_UNAVAILABLE,
                error_codes::SERVICE_UNAVAILABLE,
                "Service temporarily unavailable",
            )
        }
        DomainError::Internal { .. } => {
            error!(error = %error, "Internal error");
            ApiError::internal()
        }
    }
}
