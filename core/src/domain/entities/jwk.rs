//! Public JSON Web Key representation of the signing keys.

use serde::{Deserialize, Serialize};

/// Key type published for every RSA signing key
pub const KEY_TYPE_RSA: &str = "RSA";

/// Intended use published for every signing key
pub const KEY_USE_SIGNATURE: &str = "sig";

/// A single RSA public key as published in the JWKS document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwk {
    pub kty: String,
    #[serde(rename = "use")]
    pub key_use: String,
    pub alg: String,
    pub kid: String,
    /// Base64url-encoded modulus, no padding
    pub n: String,
    /// Base64url-encoded public exponent, no padding
    pub e: String,
}

impl Jwk {
    pub fn rsa_signing(kid: impl Into<String>, alg: impl Into<String>, n: String, e: String) -> Self {
        Self {
            kty: KEY_TYPE_RSA.to_string(),
            key_use: KEY_USE_SIGNATURE.to_string(),
            alg: alg.into(),
            kid: kid.into(),
            n,
            e,
        }
    }
}

/// The JWKS document: `{"keys": [...]}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwkSet {
    pub keys: Vec<Jwk>,
}

impl JwkSet {
    pub fn find(&self, kid: &str) -> Option<&Jwk> {
        self.keys.iter().find(|k| k.kid == kid)
    }

    pub fn kids(&self) -> Vec<&str> {
        self.keys.iter().map(|k| k.kid.as_str()).collect()
    }
}
