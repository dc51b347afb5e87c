//! Tests for the session registry

use std::sync::Arc;
use std::time::Duration;

use crate::errors::{DomainError, TokenError};
use crate::services::session::{session_key, SessionRegistry};
use crate::testutil::MockCache;

#[test]
fn test_session_key_format() {
    assert_eq!(session_key("user-42"), "auth:token:user-42");
}

#[tokio::test]
async fn test_bind_then_lookup() {
    let cache = Arc::new(MockCache::new());
    let registry = SessionRegistry::new(Arc::clone(&cache));

    registry.bind("user-42", "token-a", 3600).await.unwrap();

    assert_eq!(
        registry.lookup("user-42").await.unwrap(),
        Some("token-a".to_string())
    );
    assert_eq!(registry.lookup("user-7").await.unwrap(), None);
    assert!(cache.ttl("auth:token:user-42").unwrap() <= Duration::from_secs(3600));
}

#[tokio::test]
async fn test_bind_replaces_previous_token() {
    let registry = SessionRegistry::new(Arc::new(MockCache::new()));

    registry.bind("user-42", "token-a", 3600).await.unwrap();
    registry.bind("user-42", "token-b", 3600).await.unwrap();

    assert_eq!(
        registry.lookup("user-42").await.unwrap(),
        Some("token-b".to_string())
    );
}

#[tokio::test]
async fn test_revoke_removes_session() {
    let registry = SessionRegistry::new(Arc::new(MockCache::new()));

    registry.bind("user-42", "token-a", 3600).await.unwrap();
    assert!(registry.revoke("user-42").await.unwrap());
    assert!(!registry.revoke("user-42").await.unwrap());
    assert_eq!(registry.lookup("user-42").await.unwrap(), None);
}

#[tokio::test(start_paused = true)]
async fn test_session_expires_with_token() {
    let registry = SessionRegistry::new(Arc::new(MockCache::new()));

    registry.bind("user-42", "token-a", 60).await.unwrap();
    tokio::time::advance(Duration::from_secs(61)).await;

    assert_eq!(registry.lookup("user-42").await.unwrap(), None);
}

#[tokio::test]
async fn test_zero_ttl_is_clamped() {
    let cache = Arc::new(MockCache::new());
    let registry = SessionRegistry::new(Arc::clone(&cache));

    registry.bind("user-42", "token-a", 0).await.unwrap();
    assert!(cache.raw_get("auth:token:user-42").is_some());
}

#[tokio::test]
async fn test_write_failure_is_reported() {
    let cache = Arc::new(MockCache::new());
    let registry = SessionRegistry::new(Arc::clone(&cache));
    cache.set_fail_writes(true);

    let err = registry.bind("user-42", "token-a", 3600).await.unwrap_err();
    assert!(matches!(
        err,
        DomainError::Token(TokenError::SessionWriteFailed { .. })
    ));
}

#[tokio::test]
async fn test_revoke_failure_is_a_cache_error() {
    let cache = Arc::new(MockCache::new());
    let registry = SessionRegistry::new(Arc::clone(&cache));
    registry.bind("user-42", "token-a", 3600).await.unwrap();
    cache.set_fail_writes(true);

    let err = registry.revoke("user-42").await.unwrap_err();
    assert!(matches!(err, DomainError::Cache(_)));
    assert!(err.is_transient());
    assert_eq!(cache.raw_get("auth:token:user-42").as_deref(), Some("token-a"));
}

#[tokio::test]
async fn test_lookup_failure_propagates() {
    let cache = Arc::new(MockCache::new());
    let registry = SessionRegistry::new(Arc::clone(&cache));
    cache.set_offline(true);

    let err = registry.lookup("user-42").await.unwrap_err();
    assert!(matches!(err, DomainError::Cache(_)));
}
