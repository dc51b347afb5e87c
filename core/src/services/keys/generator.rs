//! RSA key pair generation

use rand::rngs::OsRng;
use rsa::RsaPrivateKey;

use crate::errors::KeyError;

/// Default modulus size in bits
pub const DEFAULT_RSA_BITS: usize = 2048;

/// Source of fresh RSA private keys
///
/// Generation is CPU-bound; callers run it on a blocking thread.
pub trait KeyGenerator: Send + Sync {
    fn generate(&self) -> Result<RsaPrivateKey, KeyError>;
}

/// Generates keys from the operating system's entropy source
#[derive(Debug, Clone)]
pub struct RsaKeyGenerator {
    bits: usize,
}

impl RsaKeyGenerator {
    pub fn new(bits: usize) -> Self {
        Self { bits }
    }

    pub fn bits(&self) -> usize {
        self.bits
    }
}

impl Default for RsaKeyGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_RSA_BITS)
    }
}

impl KeyGenerator for RsaKeyGenerator {
    fn generate(&self) -> Result<RsaPrivateKey, KeyError> {
        RsaPrivateKey::new(&mut OsRng, self.bits).map_err(|e| KeyError::KeyGenerationFailed {
            message: format!("RSA-{} generation failed: {}", self.bits, e),
        })
    }
}
