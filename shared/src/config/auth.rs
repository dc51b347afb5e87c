//! Token issuance and signing key configuration

use serde::{Deserialize, Serialize};

/// Token issuance configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TokenConfig {
    /// `iss` claim written into every token and required on validation
    pub issuer: String,

    /// Token lifetime in seconds; the session entry shares it
    pub ttl_seconds: u64,

    /// JWS algorithm (RS256, RS384 or RS512)
    pub algorithm: String,

    /// Clock skew tolerated when checking `exp`, in seconds
    pub leeway_seconds: u64,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            issuer: String::from("authkeep"),
            ttl_seconds: 3600, // 1 hour
            algorithm: String::from("RS256"),
            leeway_seconds: 0,
        }
    }
}

/// Signing key lifecycle configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct KeyConfig {
    /// RSA modulus size for generated keys
    pub rsa_bits: usize,

    /// TTL of the published JWKS cache entry in seconds
    pub jwks_ttl_seconds: u64,

    /// How often this instance rotates in a new key (0 = never)
    pub rotation_interval_seconds: u64,

    /// How often this instance reloads the key set from the cache (0 = never)
    pub sync_interval_seconds: u64,

    /// How long a superseded key stays resolvable (0 = derived from token TTL)
    pub rotation_grace_seconds: u64,

    /// Attempts per background rotation cycle before giving up until the next tick
    pub rotation_max_attempts: u32,

    /// Base backoff between background attempts in milliseconds
    pub rotation_backoff_ms: u64,
}

impl Default for KeyConfig {
    fn default() -> Self {
        Self {
            rsa_bits: 2048,
            jwks_ttl_seconds: 30 * 24 * 3600, // 30 days
            rotation_interval_seconds: 0,
            sync_interval_seconds: 60,
            rotation_grace_seconds: 0,
            rotation_max_attempts: 5,
            rotation_backoff_ms: 500,
        }
    }
}

impl KeyConfig {
    /// Shortest grace period that keeps every token verifiable
    ///
    /// A peer keeps signing with a superseded key until its next sync, and
    /// the last token it signs lives one token lifetime plus the validation
    /// leeway after that.
    pub fn min_grace_seconds(&self, token: &TokenConfig) -> u64 {
        token
            .ttl_seconds
            .saturating_add(self.sync_interval_seconds)
            .saturating_add(token.leeway_seconds)
    }

    /// Grace period after which a superseded key may be pruned
    pub fn effective_grace_seconds(&self, token: &TokenConfig) -> u64 {
        if self.rotation_grace_seconds != 0 {
            return self.rotation_grace_seconds;
        }
        self.min_grace_seconds(token)
    }
}

/// Principal record for the in-memory development principal store
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PrincipalSeed {
    /// Principal identifier written into the `sub` claim
    pub id: String,
    /// Login email
    pub email: String,
    /// Plain-text password, hashed when the store is built
    pub password: String,
}
