//! Token entities for JWT-based authentication.

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Claims structure for JWT payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Issuer
    pub iss: String,

    /// Subject (principal ID)
    pub sub: String,

    /// Issued at timestamp
    pub iat: i64,

    /// Expiration timestamp
    pub exp: i64,

    /// JWT ID, unique per issued token so that two tokens minted for the
    /// same principal in the same second still differ
    pub jti: String,
}

impl Claims {
    /// Creates claims for a token issued at `issued_at` and valid for `ttl`
    pub fn new(
        issuer: impl Into<String>,
        subject: impl Into<String>,
        issued_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        let expiry = issued_at + ttl;

        Self {
            iss: issuer.into(),
            sub: subject.into(),
            iat: issued_at.timestamp(),
            exp: expiry.timestamp(),
            jti: Uuid::new_v4().to_string(),
        }
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.iat, 0).single().unwrap_or_default()
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0).single().unwrap_or_default()
    }

    /// Seconds remaining until expiry, never less than zero
    pub fn remaining_seconds(&self, now: DateTime<Utc>) -> u64 {
        (self.exp - now.timestamp()).max(0) as u64
    }
}

/// A freshly signed token together with the metadata callers hand back to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedToken {
    pub token: String,
    /// Identifier of the key that signed the token
    pub kid: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// Lifetime in seconds, as reported in `expires_in` responses
    pub expires_in: u64,
}

/// Result of a successful validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedPrincipal {
    pub principal_id: String,
    pub kid: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub jti: String,
}

impl AuthenticatedPrincipal {
    pub fn from_claims(claims: &Claims, kid: impl Into<String>) -> Self {
        Self {
            principal_id: claims.sub.clone(),
            kid: kid.into(),
            issued_at: claims.issued_at(),
            expires_at: claims.expires_at(),
            jti: claims.jti.clone(),
        }
    }
}
