//! Integration tests for the authentication endpoints

mod common;

use actix_web::{http::header, http::StatusCode, test};
use ak_api::app::create_app;
use ak_api::dto::{PrincipalResponse, TokenResponse};
use serde_json::{json, Value};

use common::{setup, EMAIL, PASSWORD, PRINCIPAL_ID};

fn bearer(token: &str) -> (header::HeaderName, String) {
    (header::AUTHORIZATION, format!("Bearer {}", token))
}

fn signin_request() -> test::TestRequest {
    test::TestRequest::post()
        .uri("/api/v1/auth/signin")
        .set_json(json!({ "email": EMAIL, "password": PASSWORD }))
}

#[actix_web::test]
async fn test_signin_issues_bearer_token() {
    let ctx = setup().await;
    let app = test::init_service(create_app(ctx.state.clone())).await;

    let resp = test::call_service(&app, signin_request().to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: TokenResponse = test::read_body_json(resp).await;
    assert_eq!(body.token_type, "Bearer");
    assert_eq!(body.expires_in, 3600);
    assert!(!body.token.is_empty());
}

#[actix_web::test]
async fn test_signin_rejects_wrong_password() {
    let ctx = setup().await;
    let app = test::init_service(create_app(ctx.state.clone())).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/signin")
        .set_json(json!({ "email": EMAIL, "password": "battery staple" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "invalid_credentials");
}

#[actix_web::test]
async fn test_signin_validates_request() {
    let ctx = setup().await;
    let app = test::init_service(create_app(ctx.state.clone())).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/signin")
        .set_json(json!({ "email": "not-an-email", "password": "" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["details"]["fields"], json!(["email", "password"]));

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/signin")
        .insert_header(header::ContentType::json())
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_me_returns_authenticated_principal() {
    let ctx = setup().await;
    let app = test::init_service(create_app(ctx.state.clone())).await;

    let issued: TokenResponse =
        test::read_body_json(test::call_service(&app, signin_request().to_request()).await).await;

    let req = test::TestRequest::get()
        .uri("/api/v1/auth/me")
        .insert_header(bearer(&issued.token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let principal: PrincipalResponse = test::read_body_json(resp).await;
    assert_eq!(principal.principal_id, PRINCIPAL_ID);
    assert_eq!(principal.expires_at, issued.expires_at);
}

#[actix_web::test]
async fn test_bearer_header_errors_are_distinguished() {
    let ctx = setup().await;
    let app = test::init_service(create_app(ctx.state.clone())).await;

    let cases = [
        (None, "missing_auth_header"),
        (Some("Basic YWxpY2U6c2VjcmV0".to_string()), "invalid_auth_header"),
        (Some("Bearer not.a.token".to_string()), "invalid_token"),
    ];

    for (authorization, expected) in cases {
        let mut req = test::TestRequest::get().uri("/api/v1/auth/me");
        if let Some(value) = authorization {
            req = req.insert_header((header::AUTHORIZATION, value));
        }
        let resp = test::call_service(&app, req.to_request()).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], expected);
    }
}

#[actix_web::test]
async fn test_second_signin_supersedes_first_token() {
    let ctx = setup().await;
    let app = test::init_service(create_app(ctx.state.clone())).await;

    let first: TokenResponse =
        test::read_body_json(test::call_service(&app, signin_request().to_request()).await).await;
    let second: TokenResponse =
        test::read_body_json(test::call_service(&app, signin_request().to_request()).await).await;
    assert_ne!(first.token, second.token);

    let req = test::TestRequest::get()
        .uri("/api/v1/auth/me")
        .insert_header(bearer(&first.token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::get()
        .uri("/api/v1/auth/me")
        .insert_header(bearer(&second.token))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_refresh_replaces_token() {
    let ctx = setup().await;
    let app = test::init_service(create_app(ctx.state.clone())).await;

    let original: TokenResponse =
        test::read_body_json(test::call_service(&app, signin_request().to_request()).await).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/refresh")
        .insert_header(bearer(&original.token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let refreshed: TokenResponse = test::read_body_json(resp).await;
    assert_ne!(refreshed.token, original.token);

    // The old token can neither authenticate nor be refreshed again
    let req = test::TestRequest::post()
        .uri("/api/v1/auth/refresh")
        .insert_header(bearer(&original.token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "invalid_token");

    let req = test::TestRequest::get()
        .uri("/api/v1/auth/me")
        .insert_header(bearer(&refreshed.token))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_refresh_requires_bearer_header() {
    let ctx = setup().await;
    let app = test::init_service(create_app(ctx.state.clone())).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/refresh")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "missing_auth_header");
}

#[actix_web::test]
async fn test_logout_revokes_session() {
    let ctx = setup().await;
    let app = test::init_service(create_app(ctx.state.clone())).await;

    let issued: TokenResponse =
        test::read_body_json(test::call_service(&app, signin_request().to_request()).await).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/logout")
        .insert_header(bearer(&issued.token))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri("/api/v1/auth/me")
        .insert_header(bearer(&issued.token))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNAUTHORIZED
    );
}

#[actix_web::test]
async fn test_cache_outage_fails_closed() {
    let ctx = setup().await;
    let app = test::init_service(create_app(ctx.state.clone())).await;

    let issued: TokenResponse =
        test::read_body_json(test::call_service(&app, signin_request().to_request()).await).await;

    ctx.cache.set_offline(true);

    let req = test::TestRequest::get()
        .uri("/api/v1/auth/me")
        .insert_header(bearer(&issued.token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "service_unavailable");

    let resp = test::call_service(&app, signin_request().to_request()).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "token_issue_failed");
}

#[actix_web::test]
async fn test_logout_during_cache_write_outage_is_unavailable() {
    let ctx = setup().await;
    let app = test::init_service(create_app(ctx.state.clone())).await;

    let issued: TokenResponse =
        test::read_body_json(test::call_service(&app, signin_request().to_request()).await).await;

    ctx.cache.set_fail_writes(true);

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/logout")
        .insert_header(bearer(&issued.token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "service_unavailable");

    // The session survived, so the token still authenticates
    ctx.cache.set_fail_writes(false);
    let req = test::TestRequest::get()
        .uri("/api/v1/auth/me")
        .insert_header(bearer(&issued.token))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_health_reflects_cache() {
    let ctx = setup().await;
    let app = test::init_service(create_app(ctx.state.clone())).await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "healthy");
    assert!(body["current_kid"].as_str().unwrap().starts_with("key-"));

    ctx.cache.set_offline(true);
    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[actix_web::test]
async fn test_unknown_route_is_json_404() {
    let ctx = setup().await;
    let app = test::init_service(create_app(ctx.state.clone())).await;

    let req = test::TestRequest::get().uri("/nowhere").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "not_found");
}
