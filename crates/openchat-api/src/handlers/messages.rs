//! Message and mind-map handlers.

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use openchat_core::{Message, Position, SendMessageRequest};

use crate::auth::{Auth, RequireAuth};
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UpdateMessageRequest {
    pub content: String,
}

/// GET /api/v1/chats/:id/messages
pub async fn list_messages(
    State(state): State<AppState>,
    auth: Auth,
    ApiPath(chat_id): ApiPath<Uuid>,
) -> Result<Json<Vec<Message>>, ApiError> {
    Ok(Json(
        state.chats.list_messages(auth.user_id(), chat_id).await?,
    ))
}

/// POST /api/v1/chats/:id/messages
pub async fn send_message(
    State(state): State<AppState>,
    auth: RequireAuth,
    ApiPath(chat_id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<SendMessageRequest>,
) -> Result<(StatusCode, Json<Message>), ApiError> {
    let message = state
        .chats
        .send_message(auth.user_id(), chat_id, req)
        .await?;
    Ok((StatusCode::CREATED, Json(message)))
}

/// PUT /api/v1/messages/:id/position
pub async fn update_position(
    State(state): State<AppState>,
    auth: RequireAuth,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(position): ApiJson<Position>,
) -> Result<Json<Message>, ApiError> {
    Ok(Json(
        state
            .chats
            .update_message_position(auth.user_id(), id, position)
            .await?,
    ))
}

/// PATCH /api/v1/messages/:id
pub async fn update_message(
    State(state): State<AppState>,
    auth: RequireAuth,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UpdateMessageRequest>,
) -> Result<Json<Message>, ApiError> {
    Ok(Json(
        state
            .chats
            .update_message_content(auth.user_id(), id, req.content)
            .await?,
    ))
}

/// GET /api/v1/messages/:id/thread
pub async fn get_thread(
    State(state): State<AppState>,
    auth: Auth,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Vec<Message>>, ApiError> {
    Ok(Json(state.chats.thread(auth.user_id(), id).await?))
}
