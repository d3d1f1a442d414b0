//! Chat CRUD handlers.

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use openchat_core::defaults::clamp_limit;
use openchat_core::{Chat, CreateChatRequest, UpdateChatRequest, Viewport};

use super::ListResponse;
use crate::auth::{Auth, RequireAuth};
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListChatsQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// GET /api/v1/chats
///
/// Anonymous callers get an empty page.
pub async fn list_chats(
    State(state): State<AppState>,
    auth: Auth,
    ApiQuery(query): ApiQuery<ListChatsQuery>,
) -> Result<Json<ListResponse<Chat>>, ApiError> {
    let limit = clamp_limit(query.limit);
    let offset = query.offset.unwrap_or(0).max(0);
    let (chats, total) = state
        .chats
        .list_chats(auth.user_id(), limit, offset)
        .await?;
    Ok(Json(ListResponse::new(
        chats,
        total.max(0) as usize,
        limit as usize,
        offset as usize,
    )))
}

/// POST /api/v1/chats
pub async fn create_chat(
    State(state): State<AppState>,
    auth: RequireAuth,
    ApiJson(req): ApiJson<CreateChatRequest>,
) -> Result<(StatusCode, Json<Chat>), ApiError> {
    let chat = state.chats.create_chat(auth.user_id(), req).await?;
    Ok((StatusCode::CREATED, Json(chat)))
}

/// GET /api/v1/chats/:id
///
/// `null` when missing, not owned, or anonymous.
pub async fn get_chat(
    State(state): State<AppState>,
    auth: Auth,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Option<Chat>>, ApiError> {
    Ok(Json(state.chats.get_chat(auth.user_id(), id).await?))
}

/// PATCH /api/v1/chats/:id
pub async fn update_chat(
    State(state): State<AppState>,
    auth: RequireAuth,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UpdateChatRequest>,
) -> Result<Json<Chat>, ApiError> {
    Ok(Json(state.chats.update_chat(auth.user_id(), id, req).await?))
}

/// PUT /api/v1/chats/:id/viewport
pub async fn update_viewport(
    State(state): State<AppState>,
    auth: RequireAuth,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(viewport): ApiJson<Viewport>,
) -> Result<Json<Chat>, ApiError> {
    Ok(Json(
        state
            .chats
            .update_viewport(auth.user_id(), id, viewport)
            .await?,
    ))
}

/// DELETE /api/v1/chats/:id
pub async fn delete_chat(
    State(state): State<AppState>,
    auth: RequireAuth,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.chats.delete_chat(auth.user_id(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
