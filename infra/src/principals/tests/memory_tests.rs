//! Unit tests for the in-memory principal store

use ak_core::errors::DomainError;
use ak_core::repositories::{Credentials, PrincipalResolver};
use ak_shared::config::PrincipalSeed;

use crate::principals::InMemoryPrincipalStore;

// Lowest cost bcrypt accepts; keeps the tests fast
const TEST_COST: u32 = 4;

fn credentials(email: &str, password: &str) -> Credentials {
    Credentials {
        email: email.to_string(),
        password: password.to_string(),
    }
}

fn seeded_store() -> InMemoryPrincipalStore {
    let seeds = vec![PrincipalSeed {
        id: "user-42".to_string(),
        email: "alice@example.com".to_string(),
        password: "correct horse".to_string(),
    }];
    InMemoryPrincipalStore::from_seeds(&seeds, TEST_COST).unwrap()
}

#[tokio::test]
async fn test_valid_credentials_resolve_to_principal() {
    let store = seeded_store();

    let principal = store
        .resolve(&credentials("alice@example.com", "correct horse"))
        .await
        .unwrap();

    assert_eq!(principal, Some("user-42".to_string()));
}

#[tokio::test]
async fn test_email_match_ignores_case_and_whitespace() {
    let store = seeded_store();

    let principal = store
        .resolve(&credentials("  Alice@Example.COM ", "correct horse"))
        .await
        .unwrap();

    assert_eq!(principal, Some("user-42".to_string()));
}

#[tokio::test]
async fn test_wrong_password_and_unknown_email_resolve_to_none() {
    let store = seeded_store();

    assert_eq!(
        store
            .resolve(&credentials("alice@example.com", "battery staple"))
            .await
            .unwrap(),
        None
    );
    assert_eq!(
        store
            .resolve(&credentials("bob@example.com", "correct horse"))
            .await
            .unwrap(),
        None
    );
}

#[tokio::test]
async fn test_corrupt_hash_is_an_internal_error() {
    let mut store = InMemoryPrincipalStore::new();
    store.add_hashed("user-1", "broken@example.com", "not-a-bcrypt-hash");

    let err = store
        .resolve(&credentials("broken@example.com", "anything"))
        .await
        .unwrap_err();

    assert!(matches!(err, DomainError::Internal { .. }));
}

#[test]
fn test_passwords_are_not_stored_in_clear() {
    let store = seeded_store();
    assert_eq!(store.len(), 1);
    assert!(!format!("{:?}", store).contains("correct horse"));
}
