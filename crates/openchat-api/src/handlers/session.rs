//! Auth configuration and session introspection.

use axum::{extract::State, Json};
use serde::Serialize;

use openchat_auth::AuthProvider;

use crate::auth::Auth;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct AuthConfigResponse {
    pub providers: Vec<AuthProvider>,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// GET /api/v1/auth/config
pub async fn auth_config(State(state): State<AppState>) -> Json<AuthConfigResponse> {
    Json(AuthConfigResponse {
        providers: state.auth_providers.as_ref().clone(),
    })
}

/// GET /api/v1/session
pub async fn get_session(auth: Auth) -> Json<SessionResponse> {
    Json(match auth.session {
        Some(session) => SessionResponse {
            authenticated: true,
            user_id: Some(session.user_id),
            issuer: Some(session.issuer),
            expires_at: session.expires_at,
        },
        None => SessionResponse {
            authenticated: false,
            user_id: None,
            issuer: None,
            expires_at: None,
        },
    })
}
