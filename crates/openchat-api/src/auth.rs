//! Caller identity extractors.
//!
//! `Authorization: Bearer <jwt>` is verified against the configured
//! providers. A missing or invalid token makes the caller anonymous: reads
//! degrade to empty results and mutations are rejected by [`RequireAuth`].

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use chrono::{DateTime, Utc};
use openchat_auth::Claims;
use tracing::debug;

use crate::error::ApiError;
use crate::state::AppState;

/// Verified caller identity.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: String,
    pub issuer: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub claims: Claims,
}

impl From<Claims> for Session {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub.clone(),
            issuer: claims.iss.clone(),
            expires_at: claims.exp.and_then(|exp| DateTime::from_timestamp(exp, 0)),
            claims,
        }
    }
}

/// Optional authentication; never rejects.
#[derive(Debug, Clone, Default)]
pub struct Auth {
    pub session: Option<Session>,
}

impl Auth {
    pub fn user_id(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.user_id.as_str())
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

#[axum::async_trait]
impl FromRequestParts<AppState> for Auth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = match bearer_token(parts) {
            Some(token) => token,
            None => return Ok(Auth::default()),
        };

        match state.verifier.verify(token) {
            Ok(claims) => Ok(Auth {
                session: Some(Session::from(claims)),
            }),
            Err(e) => {
                debug!(subsystem = "auth", component = "extractor", reason = %e, "Rejected bearer token");
                Ok(Auth::default())
            }
        }
    }
}

/// Extractor that requires a verified session.
#[derive(Debug, Clone)]
pub struct RequireAuth {
    pub session: Session,
}

impl RequireAuth {
    pub fn user_id(&self) -> &str {
        &self.session.user_id
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = Auth::from_request_parts(parts, state).await?;
        match auth.session {
            Some(session) => Ok(RequireAuth { session }),
            None => Err(ApiError::not_authenticated()),
        }
    }
}
