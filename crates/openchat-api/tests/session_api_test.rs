//! Session, auth configuration, health and rate limiting endpoints.

mod common;

use axum::http::StatusCode;
use common::*;
use governor::{Quota, RateLimiter};
use openchat_api::{build_router, Environment};
use openchat_auth::{dev_signing_key, sign_eddsa, Claims, DEV_ALT_ISSUER, DEV_ISSUER, DEV_KEY_ID};
use std::num::NonZeroU32;

#[tokio::test]
async fn test_anonymous_session() {
    let app = app();
    let resp = get(&app.router, "/api/v1/session", None).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body, serde_json::json!({ "authenticated": false }));
}

#[tokio::test]
async fn test_authenticated_session() {
    let app = app();
    let resp = get(&app.router, "/api/v1/session", Some(&token("alice"))).await;
    assert_eq!(resp.body["authenticated"], true);
    assert_eq!(resp.body["user_id"], "alice");
    assert_eq!(resp.body["issuer"], DEV_ISSUER);
    assert!(resp.body["expires_at"].is_string());
}

#[tokio::test]
async fn test_alternate_port_issuer_accepted_in_development() {
    let app = app();
    let token = sign_eddsa(
        &Claims::new("alice", DEV_ALT_ISSUER, 600),
        &dev_signing_key(),
        Some(DEV_KEY_ID),
    )
    .unwrap();
    let resp = get(&app.router, "/api/v1/session", Some(&token)).await;
    assert_eq!(resp.body["authenticated"], true);
}

#[tokio::test]
async fn test_expired_and_foreign_tokens_are_anonymous() {
    let app = app();
    let expired = sign_eddsa(
        &Claims::new("alice", DEV_ISSUER, -3600),
        &dev_signing_key(),
        Some(DEV_KEY_ID),
    )
    .unwrap();
    let resp = get(&app.router, "/api/v1/session", Some(&expired)).await;
    assert_eq!(resp.body["authenticated"], false);

    let foreign_issuer = sign_eddsa(
        &Claims::new("alice", "https://elsewhere.example", 600),
        &dev_signing_key(),
        Some(DEV_KEY_ID),
    )
    .unwrap();
    let resp = get(&app.router, "/api/v1/session", Some(&foreign_issuer)).await;
    assert_eq!(resp.body["authenticated"], false);
}

#[tokio::test]
async fn test_auth_config_lists_providers() {
    let app = app();
    let resp = get(&app.router, "/api/v1/auth/config", None).await;
    assert_eq!(resp.status, StatusCode::OK);
    let providers = resp.body["providers"].as_array().unwrap();
    assert_eq!(providers.len(), 2);
    assert_eq!(providers[0]["type"], "customJwt");
    assert_eq!(providers[0]["issuer"], DEV_ISSUER);
    assert_eq!(providers[1]["issuer"], DEV_ALT_ISSUER);
    assert!(providers[0]["jwks"]
        .as_str()
        .unwrap()
        .starts_with("data:text/plain;charset=utf-8;base64,"));
}

#[tokio::test]
async fn test_health() {
    let app = app();
    let resp = get(&app.router, "/health", None).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["status"], "healthy");
    assert_eq!(resp.body["storage"], "memory");
    assert_eq!(resp.body["stream_store"], "memory");
    assert_eq!(resp.body["environment"], "development");
}

#[tokio::test]
async fn test_rate_limit_returns_429() {
    let (state, _) = test_state(Environment::Development);
    let quota = Quota::per_hour(NonZeroU32::new(2).unwrap());
    let router = build_router(state.with_rate_limiter(RateLimiter::direct(quota)));

    let status = get(&router, "/api/v1/rate-limit/status", None).await;
    assert_eq!(status.body["enabled"], true);
    assert_eq!(get(&router, "/health", None).await.status, StatusCode::OK);

    let limited = get(&router, "/health", None).await;
    assert_eq!(limited.status, StatusCode::TOO_MANY_REQUESTS);
    assert!(limited.body["error"].is_string());
}

#[tokio::test]
async fn test_rate_limit_disabled_status() {
    let app = app();
    let resp = get(&app.router, "/api/v1/rate-limit/status", None).await;
    assert_eq!(resp.body["enabled"], false);
}
