//! Seeded, in-memory principal store with bcrypt password hashes

use std::collections::HashMap;

use ak_core::errors::DomainError;
use ak_core::repositories::{Credentials, PrincipalResolver};
use ak_shared::config::PrincipalSeed;
use async_trait::async_trait;
use tracing::{debug, info};

use crate::InfrastructureError;

/// bcrypt cost used for seeded principals outside tests
pub const DEFAULT_HASH_COST: u32 = bcrypt::DEFAULT_COST;

#[derive(Debug, Clone)]
struct PrincipalRecord {
    id: String,
    password_hash: String,
}

/// Resolves credentials against a fixed set of principals
///
/// Emails are matched case-insensitively. Hashing and verification run on
/// the blocking pool.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPrincipalStore {
    by_email: HashMap<String, PrincipalRecord>,
}

impl InMemoryPrincipalStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hashes every seed's password with the given bcrypt cost
    pub fn from_seeds(seeds: &[PrincipalSeed], cost: u32) -> Result<Self, InfrastructureError> {
        let mut store = Self::new();
        for seed in seeds {
            store.add(&seed.id, &seed.email, &seed.password, cost)?;
        }
        info!(principals = store.len(), "Loaded principal store");
        Ok(store)
    }

    /// Adds a principal, hashing its password
    pub fn add(
        &mut self,
        id: &str,
        email: &str,
        password: &str,
        cost: u32,
    ) -> Result<(), InfrastructureError> {
        let password_hash = bcrypt::hash(password, cost)
            .map_err(|e| InfrastructureError::General(format!("Failed to hash password: {}", e)))?;
        self.add_hashed(id, email, password_hash);
        Ok(())
    }

    /// Adds a principal with an existing bcrypt hash
    pub fn add_hashed(&mut self, id: &str, email: &str, password_hash: impl Into<String>) {
        self.by_email.insert(
            normalize_email(email),
            PrincipalRecord {
                id: id.to_string(),
                password_hash: password_hash.into(),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.by_email.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_email.is_empty()
    }
}

#[async_trait]
impl PrincipalResolver for InMemoryPrincipalStore {
    async fn resolve(&self, credentials: &Credentials) -> Result<Option<String>, DomainError> {
        let record = match self.by_email.get(&normalize_email(&credentials.email)) {
            Some(record) => record.clone(),
            None => {
                debug!("Sign-in for unknown email");
                return Ok(None);
            }
        };

        let password = credentials.password.clone();
        let hash = record.password_hash.clone();
        let matches = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|e| DomainError::Internal {
                message: format!("Password check task failed: {}", e),
            })?
            .map_err(|e| DomainError::Internal {
                message: format!("Stored password hash is invalid: {}", e),
            })?;

        Ok(matches.then_some(record.id))
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
