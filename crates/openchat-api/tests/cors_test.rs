//! CORS behavior per environment through the full router.

mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use common::*;
use openchat_api::Environment;

fn with_origin(method: Method, uri: &str, origin: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::ORIGIN, origin)
        .body(Body::empty())
        .unwrap()
}

fn preflight(uri: &str, origin: &str) -> Request<Body> {
    Request::builder()
        .method(Method::OPTIONS)
        .uri(uri)
        .header(header::ORIGIN, origin)
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "authorization, content-type")
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_strict_mode_rejects_unlisted_origin() {
    let app = app_for(Environment::Test);
    let resp = send(
        &app.router,
        with_origin(Method::GET, "/api/v1/chats", "https://evil.example"),
    )
    .await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);
    assert_eq!(resp.body["error"], "Origin not allowed");
    assert!(!resp.headers.contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
}

#[tokio::test]
async fn test_allowed_origin_is_reflected() {
    let app = app_for(Environment::Test);
    let resp = send(
        &app.router,
        with_origin(Method::GET, "/api/v1/chats", "http://localhost:3000"),
    )
    .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(
        resp.headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://localhost:3000"
    );
    assert_eq!(resp.headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
    assert!(resp
        .headers
        .get_all(header::VARY)
        .iter()
        .any(|v| v.to_str().unwrap().contains("Origin")));
    assert!(resp.headers.contains_key("x-request-id"));
}

#[tokio::test]
async fn test_request_without_origin_passes() {
    let app = app_for(Environment::Production);
    let resp = get(&app.router, "/health", None).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(!resp.headers.contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
}

#[tokio::test]
async fn test_preflight_is_answered_without_routing() {
    let app = app_for(Environment::Test);
    let resp = send(&app.router, preflight("/api/v1/chats", "http://localhost:3001")).await;
    assert_eq!(resp.status, StatusCode::NO_CONTENT);
    assert_eq!(
        resp.headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://localhost:3001"
    );
    assert_eq!(resp.headers[header::ACCESS_CONTROL_MAX_AGE], "0");
    let methods = resp.headers[header::ACCESS_CONTROL_ALLOW_METHODS]
        .to_str()
        .unwrap();
    assert!(methods.contains("PATCH"));
    assert!(methods.contains("DELETE"));
    let allowed = resp.headers[header::ACCESS_CONTROL_ALLOW_HEADERS]
        .to_str()
        .unwrap();
    assert!(allowed.contains("authorization"));
}

#[tokio::test]
async fn test_preflight_from_unlisted_origin_is_forbidden() {
    let app = app_for(Environment::Production);
    let resp = send(&app.router, preflight("/api/v1/chats", "http://localhost:3000")).await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_staging_wildcard_origin() {
    let app = app_for(Environment::Staging);
    let preview = send(
        &app.router,
        with_origin(Method::GET, "/health", "https://openchat-git-feature.vercel.app"),
    )
    .await;
    assert_eq!(preview.status, StatusCode::OK);
    assert_eq!(
        preview.headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "https://openchat-git-feature.vercel.app"
    );

    let apex = send(
        &app.router,
        with_origin(Method::GET, "/health", "https://vercel.app"),
    )
    .await;
    assert_eq!(apex.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_development_reflects_any_origin() {
    let app = app_for(Environment::Development);
    let resp = send(
        &app.router,
        with_origin(Method::GET, "/health", "http://192.168.1.20:5173"),
    )
    .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(
        resp.headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://192.168.1.20:5173"
    );
}
