//! Stream data handlers.

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use openchat_core::StreamRecord;

use crate::auth::{Auth, RequireAuth};
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct OpenStreamRequest {
    #[serde(default)]
    pub chat_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct AppendChunkRequest {
    pub chunk: String,
    #[serde(default)]
    pub done: bool,
}

/// POST /api/v1/streams
pub async fn open_stream(
    State(state): State<AppState>,
    auth: RequireAuth,
    ApiJson(req): ApiJson<OpenStreamRequest>,
) -> Result<(StatusCode, Json<StreamRecord>), ApiError> {
    if let Some(chat_id) = req.chat_id {
        state.chats.owned_chat(auth.user_id(), chat_id).await?;
    }
    let record = state.streams.open(auth.user_id(), req.chat_id).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// POST /api/v1/streams/:id/chunks
pub async fn append_chunk(
    State(state): State<AppState>,
    auth: RequireAuth,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<AppendChunkRequest>,
) -> Result<Json<StreamRecord>, ApiError> {
    let record = state
        .streams
        .append_chunk(auth.user_id(), id, req.chunk, req.done)
        .await?;
    Ok(Json(record))
}

/// GET /api/v1/streams/:id
pub async fn get_stream(
    State(state): State<AppState>,
    auth: Auth,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Option<StreamRecord>>, ApiError> {
    let Some(user_id) = auth.user_id() else {
        return Ok(Json(None));
    };
    Ok(Json(state.streams.get_record(user_id, id).await?))
}

/// DELETE /api/v1/streams/:id
pub async fn drop_stream(
    State(state): State<AppState>,
    auth: RequireAuth,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.streams.drop_stream(auth.user_id(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
