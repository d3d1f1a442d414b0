//! Router construction and cross-cutting middleware.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use uuid::Uuid;

use openchat_core::defaults::MAX_BODY_BYTES;

use crate::cors::cors_middleware;
use crate::handlers::{chats, health, messages, session, streams};
use crate::state::AppState;

/// Generates time-ordered UUIDv7 request correlation IDs.
#[derive(Clone, Default)]
pub struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if let Some(limiter) = &state.rate_limiter {
        if limiter.check().is_err() {
            tracing::warn!(subsystem = "api", path = %request.uri().path(), "Rate limit exceeded");
            return (
                StatusCode::TOO_MANY_REQUESTS,
                Json(serde_json::json!({
                    "error": "Too many requests. Please wait before retrying."
                })),
            )
                .into_response();
        }
    }
    next.run(request).await
}

/// Build the application router.
///
/// Layers, outermost first: request id, trace, CORS, rate limit, body limit.
pub fn build_router(state: AppState) -> Router {
    let cors = state.cors.clone();

    Router::new()
        .route("/health", get(health::health_check))
        .route("/api/v1/rate-limit/status", get(health::rate_limit_status))
        // Auth
        .route("/api/v1/auth/config", get(session::auth_config))
        .route("/api/v1/session", get(session::get_session))
        // Chats
        .route(
            "/api/v1/chats",
            get(chats::list_chats).post(chats::create_chat),
        )
        .route(
            "/api/v1/chats/:id",
            get(chats::get_chat)
                .patch(chats::update_chat)
                .delete(chats::delete_chat),
        )
        .route("/api/v1/chats/:id/viewport", put(chats::update_viewport))
        // Messages
        .route(
            "/api/v1/chats/:id/messages",
            get(messages::list_messages).post(messages::send_message),
        )
        .route(
            "/api/v1/messages/:id",
            axum::routing::patch(messages::update_message),
        )
        .route(
            "/api/v1/messages/:id/position",
            put(messages::update_position),
        )
        .route("/api/v1/messages/:id/thread", get(messages::get_thread))
        // Streams
        .route("/api/v1/streams", post(streams::open_stream))
        .route(
            "/api/v1/streams/:id",
            get(streams::get_stream).delete(streams::drop_stream),
        )
        .route("/api/v1/streams/:id/chunks", post(streams::append_chunk))
        // Middleware
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .layer(middleware::from_fn_with_state(cors, cors_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .with_state(state)
}
