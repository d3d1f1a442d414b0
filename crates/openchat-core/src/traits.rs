//! Core traits for OpenChat storage abstractions.
//!
//! These traits define the interfaces that concrete implementations
//! must satisfy, enabling pluggable backends and testability.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// CHAT REPOSITORY
// =============================================================================

/// Repository for chat documents.
///
/// Implementations filter only; ownership decisions belong to the caller.
#[async_trait]
pub trait ChatRepository: Send + Sync {
    /// Insert a new chat.
    async fn insert(&self, chat: &Chat) -> Result<()>;

    /// Get a chat by ID.
    async fn get(&self, id: Uuid) -> Result<Option<Chat>>;

    /// List chats owned by `user_id`, most recently updated first.
    async fn list_by_owner(&self, user_id: &str, limit: i64, offset: i64) -> Result<Vec<Chat>>;

    /// Count chats owned by `user_id`.
    async fn count_by_owner(&self, user_id: &str) -> Result<i64>;

    /// Persist title, view mode, viewport and `updated_at` of an existing chat.
    async fn update(&self, chat: &Chat) -> Result<()>;

    /// Set `updated_at` without touching other fields.
    async fn touch(&self, id: Uuid, at: DateTime<Utc>) -> Result<()>;

    /// Delete a chat and all of its messages. Returns whether a chat was removed.
    async fn delete(&self, id: Uuid) -> Result<bool>;
}

// =============================================================================
// MESSAGE REPOSITORY
// =============================================================================

/// Repository for message documents.
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Insert a new message.
    async fn insert(&self, message: &Message) -> Result<()>;

    /// Get a message by ID.
    async fn get(&self, id: Uuid) -> Result<Option<Message>>;

    /// All messages of a chat in insertion order (`created_at`, then `id`).
    async fn list_by_chat(&self, chat_id: Uuid) -> Result<Vec<Message>>;

    /// Move a message node on the canvas, stamping `updated_at`.
    async fn update_position(&self, id: Uuid, position: Position, at: DateTime<Utc>) -> Result<()>;

    /// Replace message content.
    async fn update_content(&self, id: Uuid, content: &str, at: DateTime<Utc>) -> Result<()>;
}
