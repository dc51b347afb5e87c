//! Tests for the token validation state machine

use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};

use crate::domain::entities::Claims;
use crate::errors::{DomainError, TokenError};
use crate::services::token::TokenService;
use crate::testutil::{token_service, MockCache};

fn rejection(result: Result<impl std::fmt::Debug, DomainError>) -> TokenError {
    match result {
        Err(DomainError::Token(kind)) => kind,
        other => panic!("expected a token rejection, got {:?}", other),
    }
}

/// Replaces one character in the middle of the signature segment
fn flip_signature_char(token: &str) -> String {
    let dot = token.rfind('.').unwrap();
    let mut bytes = token.as_bytes().to_vec();
    let index = dot + 1 + (token.len() - dot - 1) / 2;
    bytes[index] = if bytes[index] == b'A' { b'B' } else { b'A' };
    String::from_utf8(bytes).unwrap()
}

/// Signs arbitrary claims with the service's current key
async fn sign_claims(service: &TokenService<MockCache>, claims: &Claims) -> String {
    let key = service.keys().current_key().await.unwrap();
    service.issuer().sign(&key, claims).unwrap()
}

#[tokio::test]
async fn test_round_trip_returns_principal() {
    let service = token_service(Arc::new(MockCache::new())).await;
    let issued = service.issue("user-42").await.unwrap();

    let principal = service.validate(&issued.token).await.unwrap();

    assert_eq!(principal.principal_id, "user-42");
    assert_eq!(principal.kid, issued.kid);
    assert_eq!(principal.expires_at, issued.expires_at);
}

#[tokio::test]
async fn test_second_issue_invalidates_first_token() {
    let service = token_service(Arc::new(MockCache::new())).await;
    let first = service.issue("user-42").await.unwrap();
    let second = service.issue("user-42").await.unwrap();

    assert_eq!(
        rejection(service.validate(&first.token).await),
        TokenError::SessionMismatch
    );
    assert!(service.validate(&second.token).await.is_ok());
}

#[tokio::test]
async fn test_revoked_session_is_rejected() {
    let service = token_service(Arc::new(MockCache::new())).await;
    let issued = service.issue("user-42").await.unwrap();

    service.sessions().revoke("user-42").await.unwrap();

    assert_eq!(
        rejection(service.validate(&issued.token).await),
        TokenError::SessionNotFound
    );
}

#[tokio::test]
async fn test_tokens_survive_rotation() {
    let service = token_service(Arc::new(MockCache::new())).await;
    let before = service.issue("user-42").await.unwrap();
    assert!(service.validate(&before.token).await.is_ok());

    let new_kid = service.keys().rotate().await.unwrap();

    let principal = service.validate(&before.token).await.unwrap();
    assert_eq!(principal.kid, before.kid);

    let after = service.issue("user-7").await.unwrap();
    assert_eq!(after.kid, new_kid);
    assert!(service.validate(&after.token).await.is_ok());
}

#[tokio::test]
async fn test_flipped_signature_is_rejected() {
    let service = token_service(Arc::new(MockCache::new())).await;
    let issued = service.issue("user-42").await.unwrap();

    let tampered = flip_signature_char(&issued.token);

    assert_ne!(tampered, issued.token);
    assert_eq!(
        rejection(service.validate(&tampered).await),
        TokenError::BadSignature
    );
}

#[tokio::test]
async fn test_truncated_signature_is_rejected() {
    let service = token_service(Arc::new(MockCache::new())).await;
    let issued = service.issue("user-42").await.unwrap();

    let truncated = &issued.token[..issued.token.len() - 4];

    assert_eq!(
        rejection(service.validate(truncated).await),
        TokenError::BadSignature
    );
}

#[tokio::test]
async fn test_dot_in_signature_is_a_bad_signature() {
    let service = token_service(Arc::new(MockCache::new())).await;
    let issued = service.issue("user-42").await.unwrap();

    let dot = issued.token.rfind('.').unwrap();
    let mut bytes = issued.token.as_bytes().to_vec();
    bytes[dot + 10] = b'.';
    let tampered = String::from_utf8(bytes).unwrap();

    assert_eq!(
        rejection(service.validate(&tampered).await),
        TokenError::BadSignature
    );

    let appended = format!("{}.extra", issued.token);
    assert_eq!(
        rejection(service.validate(&appended).await),
        TokenError::BadSignature
    );
}

#[tokio::test]
async fn test_swapped_payload_is_rejected() {
    let service = token_service(Arc::new(MockCache::new())).await;
    let issued = service.issue("user-42").await.unwrap();

    let mut claims: Claims = {
        let payload = issued.token.split('.').nth(1).unwrap();
        serde_json::from_slice(&URL_SAFE_NO_PAD.decode(payload).unwrap()).unwrap()
    };
    claims.sub = "admin".to_string();
    let forged_payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims).unwrap());

    let mut parts: Vec<&str> = issued.token.split('.').collect();
    parts[1] = &forged_payload;
    let forged = parts.join(".");

    assert_eq!(
        rejection(service.validate(&forged).await),
        TokenError::BadSignature
    );
}

#[tokio::test]
async fn test_forged_tokens_never_reach_the_cache() {
    let cache = Arc::new(MockCache::new());
    let service = token_service(Arc::clone(&cache)).await;
    let issued = service.issue("user-42").await.unwrap();
    cache.reset_counters();

    let _ = service.validate("garbage").await;
    let _ = service.validate(&flip_signature_char(&issued.token)).await;

    assert_eq!(cache.reads(), 0);
    assert_eq!(cache.writes(), 0);
}

#[tokio::test]
async fn test_expired_token_is_rejected_even_with_matching_session() {
    let service = token_service(Arc::new(MockCache::new())).await;
    let issued_at = Utc::now() - Duration::hours(2);
    let claims = Claims::new("authkeep", "user-42", issued_at, Duration::hours(1));
    let token = sign_claims(&service, &claims).await;
    service
        .sessions()
        .bind("user-42", &token, 3600)
        .await
        .unwrap();

    assert_eq!(
        rejection(service.validate(&token).await),
        TokenError::Expired
    );
}

#[tokio::test]
async fn test_malformed_tokens_are_rejected() {
    let service = token_service(Arc::new(MockCache::new())).await;

    for token in ["", "abc", "a.b", "a.b.c.d", "not.a.token"] {
        assert_eq!(
            rejection(service.validate(token).await),
            TokenError::Malformed,
            "token {:?}",
            token
        );
    }
}

#[tokio::test]
async fn test_payload_without_typed_claims_is_malformed() {
    let service = token_service(Arc::new(MockCache::new())).await;
    let issued = service.issue("user-42").await.unwrap();

    let mut parts: Vec<String> = issued.token.split('.').map(str::to_string).collect();
    parts[1] = URL_SAFE_NO_PAD.encode(br#"{"sub":"user-42"}"#);
    let token = parts.join(".");

    assert_eq!(
        rejection(service.validate(&token).await),
        TokenError::Malformed
    );
}

#[tokio::test]
async fn test_symmetric_algorithm_is_malformed() {
    let service = token_service(Arc::new(MockCache::new())).await;
    let kid = service.keys().current_key().await.unwrap().kid().to_string();
    let claims = Claims::new("authkeep", "user-42", Utc::now(), Duration::hours(1));

    let mut header = Header::new(Algorithm::HS256);
    header.kid = Some(kid);
    let token = encode(&header, &claims, &EncodingKey::from_secret(b"guessable")).unwrap();

    assert_eq!(
        rejection(service.validate(&token).await),
        TokenError::Malformed
    );
}

#[tokio::test]
async fn test_missing_kid_is_unknown_key() {
    let service = token_service(Arc::new(MockCache::new())).await;
    let key = service.keys().current_key().await.unwrap();
    let claims = Claims::new("authkeep", "user-42", Utc::now(), Duration::hours(1));

    let token = encode(&Header::new(Algorithm::RS256), &claims, key.encoding_key()).unwrap();

    assert_eq!(
        rejection(service.validate(&token).await),
        TokenError::UnknownKey
    );
}

#[tokio::test]
async fn test_unrecognized_kid_is_unknown_key() {
    let service = token_service(Arc::new(MockCache::new())).await;
    let key = service.keys().current_key().await.unwrap();
    let claims = Claims::new("authkeep", "user-42", Utc::now(), Duration::hours(1));

    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some("key-1".to_string());
    let token = encode(&header, &claims, key.encoding_key()).unwrap();

    assert_eq!(
        rejection(service.validate(&token).await),
        TokenError::UnknownKey
    );
}

#[tokio::test]
async fn test_foreign_issuer_is_malformed() {
    let service = token_service(Arc::new(MockCache::new())).await;
    let claims = Claims::new("someone-else", "user-42", Utc::now(), Duration::hours(1));
    let token = sign_claims(&service, &claims).await;
    service
        .sessions()
        .bind("user-42", &token, 3600)
        .await
        .unwrap();

    assert_eq!(
        rejection(service.validate(&token).await),
        TokenError::Malformed
    );
}

#[tokio::test]
async fn test_token_from_another_instance_validates() {
    let cache = Arc::new(MockCache::new());
    let a = token_service(Arc::clone(&cache)).await;
    let b = token_service(Arc::clone(&cache)).await;

    a.keys().rotate().await.unwrap();
    let issued = a.issue("user-42").await.unwrap();

    let principal = b.validate(&issued.token).await.unwrap();
    assert_eq!(principal.kid, issued.kid);
}

#[tokio::test]
async fn test_cache_outage_is_not_a_rejection() {
    let cache = Arc::new(MockCache::new());
    let service = token_service(Arc::clone(&cache)).await;
    let issued = service.issue("user-42").await.unwrap();
    cache.set_offline(true);

    let err = service.validate(&issued.token).await.unwrap_err();

    assert!(matches!(err, DomainError::Cache(_)));
    assert!(!err.is_token_rejection());
}
