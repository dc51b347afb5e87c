//! RSA signing keys and the set of keys trusted for verification.
//!
//! A [`KeySet`] is the unit that is persisted to the shared cache and
//! swapped into the key manager. The newest key in the set is the current
//! signing key; every other key is still trusted for verification until it
//! is pruned.

use std::collections::BTreeMap;
use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey};
use rsa::pkcs1::{DecodeRsaPrivateKey, EncodeRsaPrivateKey, LineEnding};
use rsa::traits::PublicKeyParts;
use rsa::RsaPrivateKey;
use serde::{Deserialize, Serialize};

use super::jwk::{Jwk, JwkSet};
use crate::errors::KeyError;

/// Prefix of every generated key identifier
pub const KID_PREFIX: &str = "key-";

/// Builds the key identifier for a key created at `created_at`
pub fn kid_for(created_at: DateTime<Utc>) -> String {
    format!("{}{}", KID_PREFIX, created_at.timestamp_millis())
}

/// A loaded RSA key pair with its derived signing and verification keys
#[derive(Clone)]
pub struct SigningKey {
    kid: String,
    created_at: DateTime<Utc>,
    retired_at: Option<DateTime<Utc>>,
    private_key: RsaPrivateKey,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    modulus: String,
    exponent: String,
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey")
            .field("kid", &self.kid)
            .field("created_at", &self.created_at)
            .field("retired_at", &self.retired_at)
            .field("private_key", &"[REDACTED]")
            .finish()
    }
}

impl SigningKey {
    /// Wraps a private key, deriving the JWT encoding/decoding keys and the
    /// base64url public components
    pub fn from_private_key(
        kid: impl Into<String>,
        created_at: DateTime<Utc>,
        private_key: RsaPrivateKey,
    ) -> Result<Self, KeyError> {
        let der = private_key
            .to_pkcs1_der()
            .map_err(|e| KeyError::KeyGenerationFailed {
                message: format!("Failed to encode private key: {}", e),
            })?;
        let encoding_key = EncodingKey::from_rsa_der(der.as_bytes());

        let modulus = URL_SAFE_NO_PAD.encode(private_key.n().to_bytes_be());
        let exponent = URL_SAFE_NO_PAD.encode(private_key.e().to_bytes_be());
        let decoding_key = DecodingKey::from_rsa_components(&modulus, &exponent).map_err(|e| {
            KeyError::KeyGenerationFailed {
                message: format!("Failed to derive public key: {}", e),
            }
        })?;

        Ok(Self {
            kid: kid.into(),
            created_at,
            retired_at: None,
            private_key,
            encoding_key,
            decoding_key,
            modulus,
            exponent,
        })
    }

    pub fn kid(&self) -> &str {
        &self.kid
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn retired_at(&self) -> Option<DateTime<Utc>> {
        self.retired_at
    }

    pub fn encoding_key(&self) -> &EncodingKey {
        &self.encoding_key
    }

    pub fn decoding_key(&self) -> &DecodingKey {
        &self.decoding_key
    }

    /// Returns a copy of this key marked as retired at `at`
    pub fn retired(&self, at: DateTime<Utc>) -> Self {
        let mut key = self.clone();
        key.retired_at = Some(at);
        key
    }

    /// Public half of the key in JWK form
    pub fn to_jwk(&self, alg: &str) -> Jwk {
        Jwk::rsa_signing(&self.kid, alg, self.modulus.clone(), self.exponent.clone())
    }

    /// Persistence form carrying the PKCS#1 PEM private key
    pub fn to_stored(&self) -> Result<StoredKey, KeyError> {
        let pem = self
            .private_key
            .to_pkcs1_pem(LineEnding::LF)
            .map_err(|e| KeyError::KeyStoreUnavailable {
                message: format!("Failed to serialize key {}: {}", self.kid, e),
            })?;

        Ok(StoredKey {
            kid: self.kid.clone(),
            private_key_pem: pem.as_str().to_owned(),
            created_at: self.created_at,
            retired_at: self.retired_at,
        })
    }
}

/// Serialized form of a signing key as kept in the shared cache
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredKey {
    pub kid: String,
    pub private_key_pem: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retired_at: Option<DateTime<Utc>>,
}

impl std::fmt::Debug for StoredKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredKey")
            .field("kid", &self.kid)
            .field("private_key_pem", &"[REDACTED]")
            .field("created_at", &self.created_at)
            .field("retired_at", &self.retired_at)
            .finish()
    }
}

impl StoredKey {
    /// Parses the PEM back into a live signing key
    pub fn into_signing_key(self) -> Result<SigningKey, KeyError> {
        let private_key = RsaPrivateKey::from_pkcs1_pem(&self.private_key_pem).map_err(|e| {
            KeyError::KeyStoreUnavailable {
                message: format!("Corrupt private key for {}: {}", self.kid, e),
            }
        })?;

        let mut key = SigningKey::from_private_key(self.kid.clone(), self.created_at, private_key)
            .map_err(|e| KeyError::KeyStoreUnavailable {
                message: format!("Unusable key {}: {}", self.kid, e),
            })?;
        key.retired_at = self.retired_at;
        Ok(key)
    }
}

/// Immutable collection of signing keys, keyed by kid
///
/// Mutations produce a new set which is then swapped in whole, so readers
/// holding an `Arc<KeySet>` never observe a half-applied rotation.
#[derive(Debug, Clone, Default)]
pub struct KeySet {
    keys: BTreeMap<String, Arc<SigningKey>>,
}

impl KeySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn get(&self, kid: &str) -> Option<Arc<SigningKey>> {
        self.keys.get(kid).cloned()
    }

    pub fn contains(&self, kid: &str) -> bool {
        self.keys.contains_key(kid)
    }

    /// The newest key, used for signing
    pub fn current(&self) -> Option<Arc<SigningKey>> {
        self.keys
            .values()
            .max_by(|a, b| {
                a.created_at
                    .cmp(&b.created_at)
                    .then_with(|| a.kid.cmp(&b.kid))
            })
            .cloned()
    }

    /// Inserts or replaces the key with the same kid
    pub fn insert(&mut self, key: SigningKey) {
        self.keys.insert(key.kid.clone(), Arc::new(key));
    }

    pub fn remove(&mut self, kid: &str) -> Option<Arc<SigningKey>> {
        self.keys.remove(kid)
    }

    /// Key identifiers ordered oldest first
    pub fn kids(&self) -> Vec<String> {
        self.sorted().iter().map(|k| k.kid.clone()).collect()
    }

    /// Cheap summary used to detect whether a reloaded set differs from the loaded one
    pub fn fingerprint(&self) -> Vec<(String, Option<DateTime<Utc>>)> {
        self.keys
            .values()
            .map(|k| (k.kid.clone(), k.retired_at))
            .collect()
    }

    /// Keys other than the current one whose retirement is at least `grace` old at `now`
    ///
    /// A key without an explicit retirement time is treated as retired when the
    /// next newer key was created.
    pub fn prunable(&self, grace: Duration, now: DateTime<Utc>) -> Vec<String> {
        let sorted = self.sorted();
        let mut expired = Vec::new();

        // The last entry is the current key and is never pruned.
        for window in sorted.windows(2) {
            let (key, successor) = (&window[0], &window[1]);
            let retired_at = key.retired_at.unwrap_or(successor.created_at);
            if retired_at + grace <= now {
                expired.push(key.kid.clone());
            }
        }

        expired
    }

    /// Public JWKS document, newest key first
    pub fn to_jwks(&self, alg: &str) -> JwkSet {
        JwkSet {
            keys: self.sorted().iter().rev().map(|k| k.to_jwk(alg)).collect(),
        }
    }

    /// JSON persistence form: an object mapping kid to [`StoredKey`]
    pub fn to_json(&self) -> Result<String, KeyError> {
        let stored = self
            .keys
            .iter()
            .map(|(kid, key)| Ok((kid.clone(), key.to_stored()?)))
            .collect::<Result<BTreeMap<_, _>, KeyError>>()?;

        serde_json::to_string(&stored).map_err(|e| KeyError::KeyStoreUnavailable {
            message: format!("Failed to serialize key set: {}", e),
        })
    }

    /// Parses the persistence form; any defect is reported as `KeyStoreUnavailable`
    pub fn from_json(json: &str) -> Result<Self, KeyError> {
        let stored: BTreeMap<String, StoredKey> =
            serde_json::from_str(json).map_err(|e| KeyError::KeyStoreUnavailable {
                message: format!("Corrupt key set: {}", e),
            })?;

        let mut set = KeySet::new();
        for (kid, entry) in stored {
            if kid != entry.kid {
                return Err(KeyError::KeyStoreUnavailable {
                    message: format!("Corrupt key set: entry {} holds key {}", kid, entry.kid),
                });
            }
            set.insert(entry.into_signing_key()?);
        }
        Ok(set)
    }

    fn sorted(&self) -> Vec<Arc<SigningKey>> {
        let mut keys: Vec<_> = self.keys.values().cloned().collect();
        keys.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.kid.cmp(&b.kid))
        });
        keys
    }
}
