//! Error types for OpenChat.

use thiserror::Error;

/// Result type alias using OpenChat's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for OpenChat operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Chat not found (or not visible to the caller)
    #[error("Chat not found: {0}")]
    ChatNotFound(uuid::Uuid),

    /// Message not found (or not visible to the caller)
    #[error("Message not found: {0}")]
    MessageNotFound(uuid::Uuid),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// State conflict (e.g. appending to a finished stream)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
