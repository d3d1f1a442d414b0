//! Shared helpers for router-level tests.
#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use openchat_api::{build_router, AppState, CorsConfig, CorsPolicy, Environment, Storage, StreamStore};
use openchat_auth::{dev_signing_key, sign_eddsa, AuthConfig, Claims, DEV_ISSUER, DEV_KEY_ID};
use openchat_db::InMemoryStore;

pub struct TestApp {
    pub router: Router,
    pub store: InMemoryStore,
}

pub fn test_state(env: Environment) -> (AppState, InMemoryStore) {
    let store = InMemoryStore::new();
    let auth = AuthConfig::from_lookup(|_| None, false).expect("development auth config");
    let state = AppState::new(
        Storage::in_memory(store.clone()),
        StreamStore::in_memory(60),
        auth.verifier(),
        auth.providers.clone(),
        CorsPolicy::new(CorsConfig::for_environment(env)),
        env,
    );
    (state, store)
}

pub fn app() -> TestApp {
    app_for(Environment::Development)
}

pub fn app_for(env: Environment) -> TestApp {
    let (state, store) = test_state(env);
    TestApp {
        router: build_router(state),
        store,
    }
}

/// Bearer token for `sub` signed by the development key.
pub fn token(sub: &str) -> String {
    sign_eddsa(
        &Claims::new(sub, DEV_ISSUER, 600),
        &dev_signing_key(),
        Some(DEV_KEY_ID),
    )
    .expect("sign token")
}

pub fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

pub async fn send(router: &Router, req: Request<Body>) -> TestResponse {
    let response = router.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    TestResponse {
        status,
        headers,
        body,
    }
}

pub async fn get(router: &Router, uri: &str, token: Option<&str>) -> TestResponse {
    send(router, request(Method::GET, uri, token, None)).await
}

pub async fn post(router: &Router, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
    send(router, request(Method::POST, uri, token, Some(body))).await
}

pub async fn create_chat(router: &Router, token: &str, title: &str) -> Value {
    let resp = post(
        router,
        "/api/v1/chats",
        Some(token),
        serde_json::json!({ "title": title }),
    )
    .await;
    assert_eq!(resp.status, StatusCode::CREATED, "create chat: {}", resp.body);
    resp.body
}
