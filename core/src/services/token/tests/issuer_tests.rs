//! Tests for token issuance and refresh

use std::sync::Arc;

use crate::errors::{DomainError, KeyError, TokenError};
use crate::services::session::session_key;
use crate::services::token::{TokenService, TokenServiceConfig};
use crate::testutil::{key_manager, token_service, MockCache};

#[tokio::test]
async fn test_issue_signs_with_current_key_and_binds_session() {
    let cache = Arc::new(MockCache::new());
    let service = token_service(Arc::clone(&cache)).await;
    let current = service.keys().current_key().await.unwrap();

    let issued = service.issue("user-42").await.unwrap();

    assert_eq!(issued.kid, current.kid());
    assert_eq!(issued.expires_in, 3600);
    assert_eq!(
        (issued.expires_at - issued.issued_at).num_seconds(),
        3600
    );
    assert_eq!(
        cache.raw_get(&session_key("user-42")),
        Some(issued.token.clone())
    );

    let header = jsonwebtoken::decode_header(&issued.token).unwrap();
    assert_eq!(header.alg, jsonwebtoken::Algorithm::RS256);
    assert_eq!(header.kid.as_deref(), Some(current.kid()));
}

#[tokio::test]
async fn test_session_ttl_matches_token_lifetime() {
    let cache = Arc::new(MockCache::new());
    let service = token_service(Arc::clone(&cache)).await;

    service.issue("user-42").await.unwrap();

    let ttl = cache.ttl(&session_key("user-42")).unwrap();
    assert!(ttl.as_secs() <= 3600);
    assert!(ttl.as_secs() >= 3590);
}

#[tokio::test]
async fn test_tokens_issued_back_to_back_differ() {
    let service = token_service(Arc::new(MockCache::new())).await;

    let first = service.issue("user-42").await.unwrap();
    let second = service.issue("user-42").await.unwrap();

    assert_ne!(first.token, second.token);
}

#[tokio::test]
async fn test_issue_without_keys_fails() {
    let cache = Arc::new(MockCache::new());
    let service = TokenService::new(key_manager(Arc::clone(&cache)), TokenServiceConfig::default());

    let err = service.issue("user-42").await.unwrap_err();

    assert_eq!(err, DomainError::Key(KeyError::NoKeyAvailable));
    assert!(cache.raw_get(&session_key("user-42")).is_none());
}

#[tokio::test]
async fn test_issue_rejects_empty_principal() {
    let service = token_service(Arc::new(MockCache::new())).await;

    let err = service.issue("  ").await.unwrap_err();
    assert!(matches!(err, DomainError::Validation { .. }));
}

#[tokio::test]
async fn test_session_write_failure_withholds_token() {
    let cache = Arc::new(MockCache::new());
    let service = token_service(Arc::clone(&cache)).await;
    cache.set_fail_writes(true);

    let err = service.issue("user-42").await.unwrap_err();

    assert!(matches!(
        err,
        DomainError::Token(TokenError::SessionWriteFailed { .. })
    ));
    assert!(cache.raw_get(&session_key("user-42")).is_none());
}

#[tokio::test]
async fn test_refresh_replaces_session() {
    let cache = Arc::new(MockCache::new());
    let service = token_service(Arc::clone(&cache)).await;
    let t1 = service.issue("u1").await.unwrap();

    let t2 = service.refresh(&t1.token).await.unwrap();

    assert_ne!(t1.token, t2.token);
    assert_eq!(cache.raw_get(&session_key("u1")), Some(t2.token.clone()));
    assert_eq!(
        service.validate(&t1.token).await.unwrap_err(),
        DomainError::Token(TokenError::SessionMismatch)
    );
    assert_eq!(service.validate(&t2.token).await.unwrap().principal_id, "u1");
}

#[tokio::test]
async fn test_refresh_with_invalid_token_changes_nothing() {
    let cache = Arc::new(MockCache::new());
    let service = token_service(Arc::clone(&cache)).await;
    let current = service.issue("u1").await.unwrap();
    cache.reset_counters();

    let err = service.refresh("not.a.token").await.unwrap_err();

    assert!(matches!(
        err,
        DomainError::Token(TokenError::RefreshDenied { .. })
    ));
    assert_eq!(cache.writes(), 0);
    assert_eq!(cache.raw_get(&session_key("u1")), Some(current.token));
}

#[tokio::test]
async fn test_refresh_of_superseded_token_is_denied() {
    let cache = Arc::new(MockCache::new());
    let service = token_service(Arc::clone(&cache)).await;
    let t1 = service.issue("u1").await.unwrap();
    let t2 = service.issue("u1").await.unwrap();

    let err = service.refresh(&t1.token).await.unwrap_err();

    assert_eq!(
        err,
        DomainError::Token(TokenError::RefreshDenied {
            reason: TokenError::SessionMismatch.to_string()
        })
    );
    assert_eq!(cache.raw_get(&session_key("u1")), Some(t2.token));
}

#[tokio::test]
async fn test_refresh_surfaces_cache_outage_as_outage() {
    let cache = Arc::new(MockCache::new());
    let service = token_service(Arc::clone(&cache)).await;
    let t1 = service.issue("u1").await.unwrap();
    cache.set_offline(true);

    let err = service.refresh(&t1.token).await.unwrap_err();

    assert!(matches!(err, DomainError::Cache(_)));
}
