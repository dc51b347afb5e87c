use std::fmt;

use ak_core::domain::entities::{AuthenticatedPrincipal, IssuedToken};
use ak_core::repositories::Credentials;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Clone, Deserialize, Validate)]
pub struct SigninRequest {
    #[validate(email)]
    pub email: String,

    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

impl fmt::Debug for SigninRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigninRequest")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl From<SigninRequest> for Credentials {
    fn from(request: SigninRequest) -> Self {
        Credentials {
            email: request.email,
            password: request.password,
        }
    }
}

/// Body returned by sign-in and refresh
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
    pub token_type: String,
    /// Seconds until the token expires
    pub expires_in: u64,
    pub expires_at: DateTime<Utc>,
}

impl From<IssuedToken> for TokenResponse {
    fn from(issued: IssuedToken) -> Self {
        Self {
            token: issued.token,
            token_type: "Bearer".to_string(),
            expires_in: issued.expires_in,
            expires_at: issued.expires_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrincipalResponse {
    pub principal_id: String,
    pub kid: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl From<AuthenticatedPrincipal> for PrincipalResponse {
    fn from(principal: AuthenticatedPrincipal) -> Self {
        Self {
            principal_id: principal.principal_id,
            kid: principal.kid,
            issued_at: principal.issued_at,
            expires_at: principal.expires_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogoutResponse {
    pub message: String,
}
