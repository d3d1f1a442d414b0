//! HTTP error mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::error;

/// Errors returned by handlers, rendered as `{"error": message}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Internal(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Conflict(String),
}

impl ApiError {
    pub fn not_authenticated() -> Self {
        ApiError::Unauthorized("Not authenticated".to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
        }
    }
}

impl From<openchat_core::Error> for ApiError {
    fn from(err: openchat_core::Error) -> Self {
        use openchat_core::Error;
        match err {
            Error::NotFound(msg) => ApiError::NotFound(msg),
            Error::ChatNotFound(_) | Error::MessageNotFound(_) => ApiError::NotFound(err.to_string()),
            Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            Error::Conflict(msg) => ApiError::Conflict(msg),
            Error::Database(ref sqlx_err) => match sqlx_err.as_database_error() {
                Some(db_err) if db_err.is_foreign_key_violation() => {
                    ApiError::BadRequest(db_err.message().to_string())
                }
                _ => ApiError::Internal(err.to_string()),
            },
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(subsystem = "api", error = %self, "Request failed");
        }
        let body = Json(serde_json::json!({
            "error": self.to_string(),
        }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_core_error_mapping() {
        let cases: Vec<(openchat_core::Error, StatusCode)> = vec![
            (
                openchat_core::Error::ChatNotFound(Uuid::nil()),
                StatusCode::NOT_FOUND,
            ),
            (
                openchat_core::Error::InvalidInput("bad".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                openchat_core::Error::Conflict("done".into()),
                StatusCode::CONFLICT,
            ),
            (
                openchat_core::Error::Internal("boom".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[derive(Debug)]
    struct ConstraintError {
        foreign_key: bool,
    }

    impl std::fmt::Display for ConstraintError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("violates constraint")
        }
    }

    impl std::error::Error for ConstraintError {}

    impl sqlx::error::DatabaseError for ConstraintError {
        fn message(&self) -> &str {
            "violates constraint"
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> sqlx::error::ErrorKind {
            if self.foreign_key {
                sqlx::error::ErrorKind::ForeignKeyViolation
            } else {
                sqlx::error::ErrorKind::UniqueViolation
            }
        }
    }

    fn db_error(foreign_key: bool) -> openchat_core::Error {
        openchat_core::Error::Database(sqlx::Error::Database(Box::new(ConstraintError {
            foreign_key,
        })))
    }

    #[test]
    fn test_foreign_key_violation_is_bad_request() {
        let err = ApiError::from(db_error(true));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "violates constraint");

        let err = ApiError::from(db_error(false));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_not_authenticated_message() {
        let err = ApiError::not_authenticated();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.to_string(), "Not authenticated");
    }
}
