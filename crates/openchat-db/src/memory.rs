//! In-memory repository implementation.
//!
//! Backs both [`ChatRepository`] and [`MessageRepository`] with maps behind a
//! single lock, suitable for development without PostgreSQL and for tests.
//! Nothing is persisted.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use openchat_core::{
    Chat, ChatRepository, Error, Message, MessageRepository, Position, Result,
};

#[derive(Debug, Default)]
struct Tables {
    chats: HashMap<Uuid, Chat>,
    messages: HashMap<Uuid, Message>,
}

/// Shared in-memory store. Clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    /// Creates a new, empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| Error::Internal("in-memory store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| Error::Internal("in-memory store lock poisoned".to_string()))
    }

    /// Number of stored messages across all chats.
    pub fn message_count(&self) -> Result<usize> {
        Ok(self.read()?.messages.len())
    }
}

#[async_trait]
impl ChatRepository for InMemoryStore {
    async fn insert(&self, chat: &Chat) -> Result<()> {
        let mut tables = self.write()?;
        if tables.chats.contains_key(&chat.id) {
            return Err(Error::Conflict(format!("chat {} already exists", chat.id)));
        }
        tables.chats.insert(chat.id, chat.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Chat>> {
        Ok(self.read()?.chats.get(&id).cloned())
    }

    async fn list_by_owner(&self, user_id: &str, limit: i64, offset: i64) -> Result<Vec<Chat>> {
        let tables = self.read()?;
        let mut owned: Vec<Chat> = tables
            .chats
            .values()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(b.id.cmp(&a.id)));
        Ok(owned
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn count_by_owner(&self, user_id: &str) -> Result<i64> {
        let tables = self.read()?;
        Ok(tables.chats.values().filter(|c| c.user_id == user_id).count() as i64)
    }

    async fn update(&self, chat: &Chat) -> Result<()> {
        let mut tables = self.write()?;
        match tables.chats.get_mut(&chat.id) {
            Some(existing) => {
                existing.title = chat.title.clone();
                existing.view_mode = chat.view_mode;
                existing.viewport = chat.viewport;
                existing.updated_at = chat.updated_at;
                Ok(())
            }
            None => Err(Error::ChatNotFound(chat.id)),
        }
    }

    async fn touch(&self, id: Uuid, at: DateTime<Utc>) -> Result<()> {
        if let Some(chat) = self.write()?.chats.get_mut(&id) {
            chat.updated_at = at;
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let mut tables = self.write()?;
        tables.messages.retain(|_, m| m.chat_id != id);
        Ok(tables.chats.remove(&id).is_some())
    }
}

#[async_trait]
impl MessageRepository for InMemoryStore {
    async fn insert(&self, message: &Message) -> Result<()> {
        let mut tables = self.write()?;
        if !tables.chats.contains_key(&message.chat_id) {
            return Err(Error::ChatNotFound(message.chat_id));
        }
        tables.messages.insert(message.id, message.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Message>> {
        Ok(self.read()?.messages.get(&id).cloned())
    }

    async fn list_by_chat(&self, chat_id: Uuid) -> Result<Vec<Message>> {
        let tables = self.read()?;
        let mut messages: Vec<Message> = tables
            .messages
            .values()
            .filter(|m| m.chat_id == chat_id)
            .cloned()
            .collect();
        messages.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(messages)
    }

    async fn update_position(&self, id: Uuid, position: Position, at: DateTime<Utc>) -> Result<()> {
        match self.write()?.messages.get_mut(&id) {
            Some(m) => {
                m.position = Some(position);
                m.updated_at = at;
                Ok(())
            }
            None => Err(Error::MessageNotFound(id)),
        }
    }

    async fn update_content(&self, id: Uuid, content: &str, at: DateTime<Utc>) -> Result<()> {
        match self.write()?.messages.get_mut(&id) {
            Some(m) => {
                m.content = content.to_string();
                m.updated_at = at;
                Ok(())
            }
            None => Err(Error::MessageNotFound(id)),
        }
    }
}
