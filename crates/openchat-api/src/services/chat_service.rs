//! Chat and message operations with owner-scoped authorization.
//!
//! Every lookup goes through the owner check: a chat (or a message through
//! its chat) that exists but belongs to someone else is reported exactly like
//! a missing one. Anonymous reads return empty results.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use openchat_core::defaults::MAX_THREAD_DEPTH;
use openchat_core::{
    ancestor_path, normalize_title, Chat, ChatRepository, CreateChatRequest, Error, Message,
    MessageRepository, MessageRole, Position, Result, SendMessageRequest, UpdateChatRequest,
    Viewport,
};

#[derive(Clone)]
pub struct ChatService {
    chats: Arc<dyn ChatRepository>,
    messages: Arc<dyn MessageRepository>,
}

impl ChatService {
    pub fn new(chats: Arc<dyn ChatRepository>, messages: Arc<dyn MessageRepository>) -> Self {
        Self { chats, messages }
    }

    // -------------------------------------------------------------------------
    // Chats
    // -------------------------------------------------------------------------

    /// Page of the caller's chats plus the total count.
    pub async fn list_chats(
        &self,
        user_id: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Chat>, i64)> {
        let Some(user_id) = user_id else {
            return Ok((Vec::new(), 0));
        };
        let offset = offset.max(0);
        let chats = self.chats.list_by_owner(user_id, limit, offset).await?;
        let total = self.chats.count_by_owner(user_id).await?;
        debug!(
            subsystem = "chats",
            op = "list",
            user_id,
            result_count = chats.len(),
            "Listed chats"
        );
        Ok((chats, total))
    }

    pub async fn create_chat(&self, user_id: &str, req: CreateChatRequest) -> Result<Chat> {
        let chat = Chat::new(
            user_id,
            req.title.as_deref(),
            req.view_mode.unwrap_or_default(),
        )?;
        self.chats.insert(&chat).await?;

        if let Some(content) = req.initial_message.filter(|c| !c.trim().is_empty()) {
            let message = Message::from_request(
                &chat,
                SendMessageRequest {
                    role: MessageRole::User,
                    content,
                    ..Default::default()
                },
            )?;
            self.messages.insert(&message).await?;
        }

        info!(
            subsystem = "chats",
            op = "create",
            user_id,
            chat_id = %chat.id,
            "Chat created"
        );
        Ok(chat)
    }

    /// The chat when it exists and belongs to the caller.
    pub async fn get_chat(&self, user_id: Option<&str>, chat_id: Uuid) -> Result<Option<Chat>> {
        let Some(user_id) = user_id else {
            return Ok(None);
        };
        Ok(self
            .chats
            .get(chat_id)
            .await?
            .filter(|chat| chat.is_owned_by(user_id)))
    }

    /// Like [`get_chat`](Self::get_chat) but missing is an error.
    pub async fn owned_chat(&self, user_id: &str, chat_id: Uuid) -> Result<Chat> {
        self.get_chat(Some(user_id), chat_id)
            .await?
            .ok_or(Error::ChatNotFound(chat_id))
    }

    pub async fn update_chat(
        &self,
        user_id: &str,
        chat_id: Uuid,
        req: UpdateChatRequest,
    ) -> Result<Chat> {
        if req.is_empty() {
            return Err(Error::InvalidInput("no fields to update".to_string()));
        }
        let mut chat = self.owned_chat(user_id, chat_id).await?;

        if let Some(title) = req.title.as_deref() {
            chat.title = normalize_title(title)?;
        }
        if let Some(view_mode) = req.view_mode {
            chat.view_mode = view_mode;
        }
        if let Some(viewport) = req.viewport {
            viewport.validate()?;
            chat.viewport = Some(viewport);
        }
        chat.updated_at = Utc::now();
        self.chats.update(&chat).await?;

        debug!(subsystem = "chats", op = "update", user_id, chat_id = %chat_id, "Chat updated");
        Ok(chat)
    }

    pub async fn update_viewport(
        &self,
        user_id: &str,
        chat_id: Uuid,
        viewport: Viewport,
    ) -> Result<Chat> {
        self.update_chat(
            user_id,
            chat_id,
            UpdateChatRequest {
                viewport: Some(viewport),
                ..Default::default()
            },
        )
        .await
    }

    /// Delete a chat and its messages.
    pub async fn delete_chat(&self, user_id: &str, chat_id: Uuid) -> Result<()> {
        self.owned_chat(user_id, chat_id).await?;
        if !self.chats.delete(chat_id).await? {
            return Err(Error::ChatNotFound(chat_id));
        }
        info!(subsystem = "chats", op = "delete", user_id, chat_id = %chat_id, "Chat deleted");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Messages
    // -------------------------------------------------------------------------

    /// Messages of a chat in insertion order; empty unless the caller owns it.
    pub async fn list_messages(&self, user_id: Option<&str>, chat_id: Uuid) -> Result<Vec<Message>> {
        match self.get_chat(user_id, chat_id).await? {
            Some(chat) => self.messages.list_by_chat(chat.id).await,
            None => Ok(Vec::new()),
        }
    }

    pub async fn send_message(
        &self,
        user_id: &str,
        chat_id: Uuid,
        req: SendMessageRequest,
    ) -> Result<Message> {
        let chat = self.owned_chat(user_id, chat_id).await?;

        if let Some(parent_id) = req.parent_id {
            match self.messages.get(parent_id).await? {
                Some(parent) if parent.chat_id == chat.id => {}
                _ => {
                    return Err(Error::InvalidInput(format!(
                        "parent message {} does not belong to chat {}",
                        parent_id, chat.id
                    )))
                }
            }
        }

        let message = Message::from_request(&chat, req)?;
        self.messages.insert(&message).await?;
        self.chats.touch(chat.id, message.created_at).await?;

        debug!(
            subsystem = "messages",
            op = "send",
            user_id,
            chat_id = %chat.id,
            message_id = %message.id,
            branch = message.parent_id.is_some(),
            "Message stored"
        );
        Ok(message)
    }

    /// The message when its chat belongs to the caller.
    async fn owned_message(&self, user_id: Option<&str>, message_id: Uuid) -> Result<Option<Message>> {
        let Some(user_id) = user_id else {
            return Ok(None);
        };
        let Some(message) = self.messages.get(message_id).await? else {
            return Ok(None);
        };
        Ok(self
            .get_chat(Some(user_id), message.chat_id)
            .await?
            .map(|_| message))
    }

    pub async fn update_message_position(
        &self,
        user_id: &str,
        message_id: Uuid,
        position: Position,
    ) -> Result<Message> {
        position.validate()?;
        let mut message = self
            .owned_message(Some(user_id), message_id)
            .await?
            .ok_or(Error::MessageNotFound(message_id))?;
        let now = Utc::now();
        self.messages
            .update_position(message_id, position, now)
            .await?;
        message.position = Some(position);
        message.updated_at = now;
        Ok(message)
    }

    pub async fn update_message_content(
        &self,
        user_id: &str,
        message_id: Uuid,
        content: String,
    ) -> Result<Message> {
        let mut message = self
            .owned_message(Some(user_id), message_id)
            .await?
            .ok_or(Error::MessageNotFound(message_id))?;
        let now = Utc::now();
        self.messages
            .update_content(message_id, &content, now)
            .await?;
        message.content = content;
        message.updated_at = now;
        Ok(message)
    }

    /// Ancestor path root → message, empty unless the caller owns the chat.
    pub async fn thread(&self, user_id: Option<&str>, message_id: Uuid) -> Result<Vec<Message>> {
        let Some(message) = self.owned_message(user_id, message_id).await? else {
            return Ok(Vec::new());
        };
        let messages = self.messages.list_by_chat(message.chat_id).await?;
        ancestor_path(&messages, message_id, MAX_THREAD_DEPTH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use openchat_core::ViewMode;
    use openchat_db::InMemoryStore;

    fn service() -> (ChatService, InMemoryStore) {
        let store = InMemoryStore::new();
        (
            ChatService::new(Arc::new(store.clone()), Arc::new(store.clone())),
            store,
        )
    }

    fn text(content: &str) -> SendMessageRequest {
        SendMessageRequest {
            content: content.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_anonymous_reads_are_empty() {
        let (svc, _) = service();
        let chat = svc
            .create_chat("alice", CreateChatRequest::default())
            .await
            .unwrap();

        let (chats, total) = svc.list_chats(None, 50, 0).await.unwrap();
        assert!(chats.is_empty());
        assert_eq!(total, 0);
        assert!(svc.get_chat(None, chat.id).await.unwrap().is_none());
        assert!(svc.list_messages(None, chat.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_with_initial_message() {
        let (svc, store) = service();
        let chat = svc
            .create_chat(
                "alice",
                CreateChatRequest {
                    title: Some("  Trip plans ".to_string()),
                    view_mode: Some(ViewMode::Mindmap),
                    initial_message: Some("Where should we go?".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(chat.title, "Trip plans");
        assert_eq!(chat.view_mode, ViewMode::Mindmap);

        let messages = svc.list_messages(Some("alice"), chat.id).await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, MessageRole::User);
        assert_eq!(store.message_count().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_non_owner_sees_not_found() {
        let (svc, _) = service();
        let chat = svc
            .create_chat("alice", CreateChatRequest::default())
            .await
            .unwrap();

        assert!(svc.get_chat(Some("bob"), chat.id).await.unwrap().is_none());
        let err = svc
            .update_chat(
                "bob",
                chat.id,
                UpdateChatRequest {
                    title: Some("mine now".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ChatNotFound(_)));
        assert!(matches!(
            svc.delete_chat("bob", chat.id).await,
            Err(Error::ChatNotFound(_))
        ));
        assert!(matches!(
            svc.send_message("bob", chat.id, text("hi")).await,
            Err(Error::ChatNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_update_rejects_empty_and_blank_title() {
        let (svc, _) = service();
        let chat = svc
            .create_chat("alice", CreateChatRequest::default())
            .await
            .unwrap();
        assert!(matches!(
            svc.update_chat("alice", chat.id, UpdateChatRequest::default())
                .await,
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            svc.update_chat(
                "alice",
                chat.id,
                UpdateChatRequest {
                    title: Some("   ".into()),
                    ..Default::default()
                }
            )
            .await,
            Err(Error::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_parent_must_belong_to_same_chat() {
        let (svc, _) = service();
        let a = svc
            .create_chat("alice", CreateChatRequest::default())
            .await
            .unwrap();
        let b = svc
            .create_chat("alice", CreateChatRequest::default())
            .await
            .unwrap();
        let root_a = svc.send_message("alice", a.id, text("root")).await.unwrap();

        let err = svc
            .send_message(
                "alice",
                b.id,
                SendMessageRequest {
                    parent_id: Some(root_a.id),
                    ..text("cross-chat branch")
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));

        let err = svc
            .send_message(
                "alice",
                a.id,
                SendMessageRequest {
                    parent_id: Some(Uuid::now_v7()),
                    ..text("dangling")
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_thread_follows_parents() {
        let (svc, _) = service();
        let chat = svc
            .create_chat("alice", CreateChatRequest::default())
            .await
            .unwrap();
        let root = svc.send_message("alice", chat.id, text("root")).await.unwrap();
        let child = svc
            .send_message(
                "alice",
                chat.id,
                SendMessageRequest {
                    parent_id: Some(root.id),
                    ..text("child")
                },
            )
            .await
            .unwrap();
        let _sibling = svc
            .send_message(
                "alice",
                chat.id,
                SendMessageRequest {
                    parent_id: Some(root.id),
                    ..text("sibling")
                },
            )
            .await
            .unwrap();
        let leaf = svc
            .send_message(
                "alice",
                chat.id,
                SendMessageRequest {
                    parent_id: Some(child.id),
                    ..text("leaf")
                },
            )
            .await
            .unwrap();

        let path: Vec<Uuid> = svc
            .thread(Some("alice"), leaf.id)
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(path, vec![root.id, child.id, leaf.id]);
        assert!(svc.thread(Some("bob"), leaf.id).await.unwrap().is_empty());
        assert!(svc.thread(None, leaf.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_message_updates_are_owner_scoped() {
        let (svc, _) = service();
        let chat = svc
            .create_chat("alice", CreateChatRequest::default())
            .await
            .unwrap();
        let msg = svc.send_message("alice", chat.id, text("draft")).await.unwrap();

        let moved = svc
            .update_message_position("alice", msg.id, Position { x: 3.0, y: 4.0 })
            .await
            .unwrap();
        assert_eq!(moved.position, Some(Position { x: 3.0, y: 4.0 }));

        let edited = svc
            .update_message_content("alice", msg.id, "final".to_string())
            .await
            .unwrap();
        assert_eq!(edited.content, "final");

        assert!(matches!(
            svc.update_message_content("bob", msg.id, "hijack".to_string())
                .await,
            Err(Error::MessageNotFound(_))
        ));
        assert!(matches!(
            svc.update_message_position("alice", msg.id, Position { x: f64::NAN, y: 0.0 })
                .await,
            Err(Error::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_cascades_messages() {
        let (svc, store) = service();
        let chat = svc
            .create_chat("alice", CreateChatRequest::default())
            .await
            .unwrap();
        svc.send_message("alice", chat.id, text("one")).await.unwrap();
        svc.send_message("alice", chat.id, text("two")).await.unwrap();
        assert_eq!(store.message_count().unwrap(), 2);

        svc.delete_chat("alice", chat.id).await.unwrap();
        assert_eq!(store.message_count().unwrap(), 0);
        assert!(svc.get_chat(Some("alice"), chat.id).await.unwrap().is_none());
    }
}
