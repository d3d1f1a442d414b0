//! Health and operational endpoints.

use axum::{extract::State, response::IntoResponse, Json};

use crate::state::AppState;

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "environment": state.environment.as_str(),
        "storage": state.storage_backend,
        "stream_store": state.streams.backend_name().await,
    }))
}

/// GET /api/v1/rate-limit/status
pub async fn rate_limit_status(State(state): State<AppState>) -> impl IntoResponse {
    if state.rate_limiter.is_some() {
        Json(serde_json::json!({
            "enabled": true,
            "message": "Rate limiting is active"
        }))
    } else {
        Json(serde_json::json!({
            "enabled": false,
            "message": "Rate limiting is disabled"
        }))
    }
}
