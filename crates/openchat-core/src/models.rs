//! Domain models for OpenChat.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::defaults::{DEFAULT_CHAT_TITLE, MAX_TITLE_LEN};
use crate::error::{Error, Result};
use crate::uuid_utils::new_v7;

// =============================================================================
// CHAT TYPES
// =============================================================================

/// How the client renders a chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    /// Linear transcript.
    #[default]
    Chat,
    /// Messages rendered as a node graph following parent pointers.
    Mindmap,
}

impl ViewMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewMode::Chat => "chat",
            ViewMode::Mindmap => "mindmap",
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ViewMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "chat" => Ok(ViewMode::Chat),
            "mindmap" => Ok(ViewMode::Mindmap),
            other => Err(Error::InvalidInput(format!("unknown view mode '{}'", other))),
        }
    }
}

/// Saved camera state of the mind-map canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub zoom: f64,
}

impl Viewport {
    /// Reject non-finite coordinates and non-positive zoom.
    pub fn validate(&self) -> Result<()> {
        if !(self.x.is_finite() && self.y.is_finite() && self.zoom.is_finite()) {
            return Err(Error::InvalidInput(
                "viewport values must be finite".to_string(),
            ));
        }
        if self.zoom <= 0.0 {
            return Err(Error::InvalidInput(
                "viewport zoom must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// A conversation container owned by a single user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chat {
    pub id: Uuid,
    /// Owner (JWT subject).
    pub user_id: String,
    pub title: String,
    pub view_mode: ViewMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewport: Option<Viewport>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Chat {
    /// Build a new chat owned by `user_id`. A blank or missing title falls
    /// back to [`DEFAULT_CHAT_TITLE`].
    pub fn new(user_id: &str, title: Option<&str>, view_mode: ViewMode) -> Result<Self> {
        let title = match title.map(str::trim) {
            Some(t) if !t.is_empty() => normalize_title(t)?,
            _ => DEFAULT_CHAT_TITLE.to_string(),
        };
        let now = Utc::now();
        Ok(Self {
            id: new_v7(),
            user_id: user_id.to_string(),
            title,
            view_mode,
            viewport: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Owner equality check; the only authorization rule.
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }
}

/// Trim and length-check a chat title.
pub fn normalize_title(raw: &str) -> Result<String> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(Error::InvalidInput("title must not be empty".to_string()));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(Error::InvalidInput(format!(
            "title exceeds {} characters",
            MAX_TITLE_LEN
        )));
    }
    Ok(title.to_string())
}

/// Request for creating a chat.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateChatRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub view_mode: Option<ViewMode>,
    /// Stored as the first `user` message when present.
    #[serde(default)]
    pub initial_message: Option<String>,
}

/// Partial update of a chat. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateChatRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub view_mode: Option<ViewMode>,
    #[serde(default)]
    pub viewport: Option<Viewport>,
}

impl UpdateChatRequest {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.view_mode.is_none() && self.viewport.is_none()
    }
}

// =============================================================================
// MESSAGE TYPES
// =============================================================================

/// Author of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    #[default]
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageRole {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "user" => Ok(MessageRole::User),
            "assistant" => Ok(MessageRole::Assistant),
            other => Err(Error::InvalidInput(format!("unknown role '{}'", other))),
        }
    }
}

/// Canvas coordinates of a message node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn validate(&self) -> Result<()> {
        if self.x.is_finite() && self.y.is_finite() {
            Ok(())
        } else {
            Err(Error::InvalidInput(
                "position values must be finite".to_string(),
            ))
        }
    }
}

/// A single turn within a chat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub chat_id: Uuid,
    pub user_id: String,
    pub role: MessageRole,
    pub content: String,
    /// Parent message for mind-map branching (None = root).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    /// Opaque style blob owned by the client renderer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_style: Option<serde_json::Value>,
    /// Excerpt of the parent the branch was created from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlighted_text: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Message {
    /// Build a message for `chat` from a send request. Parent validity is
    /// checked by the caller, which has access to the store.
    pub fn from_request(chat: &Chat, req: SendMessageRequest) -> Result<Self> {
        if let Some(pos) = &req.position {
            pos.validate()?;
        }
        if let Some(style) = &req.node_style {
            if !style.is_object() {
                return Err(Error::InvalidInput(
                    "node_style must be a JSON object".to_string(),
                ));
            }
        }
        let now = Utc::now();
        Ok(Self {
            id: new_v7(),
            chat_id: chat.id,
            user_id: chat.user_id.clone(),
            role: req.role,
            content: req.content,
            parent_id: req.parent_id,
            position: req.position,
            node_style: req.node_style,
            highlighted_text: req.highlighted_text,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Request for appending a message to a chat.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SendMessageRequest {
    #[serde(default)]
    pub role: MessageRole,
    pub content: String,
    #[serde(default)]
    pub parent_id: Option<Uuid>,
    #[serde(default)]
    pub position: Option<Position>,
    #[serde(default)]
    pub node_style: Option<serde_json::Value>,
    #[serde(default)]
    pub highlighted_text: Option<String>,
}

// =============================================================================
// STREAM TYPES
// =============================================================================

/// Buffered chunks of an in-progress assistant response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamRecord {
    pub stream_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<Uuid>,
    #[serde(default)]
    pub chunks: Vec<String>,
    #[serde(default)]
    pub done: bool,
    pub updated_at: DateTime<Utc>,
}

impl StreamRecord {
    pub fn new(chat_id: Option<Uuid>) -> Self {
        Self {
            stream_id: new_v7(),
            chat_id,
            chunks: Vec::new(),
            done: false,
            updated_at: Utc::now(),
        }
    }

    /// Append a chunk, optionally finishing the stream.
    pub fn push(&mut self, chunk: String, done: bool) -> Result<()> {
        if self.done {
            return Err(Error::Conflict(format!(
                "stream {} is already finished",
                self.stream_id
            )));
        }
        if !chunk.is_empty() {
            self.chunks.push(chunk);
        }
        self.done = done;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Concatenated content received so far.
    pub fn text(&self) -> String {
        self.chunks.concat()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_new_defaults_title() {
        let chat = Chat::new("user-1", None, ViewMode::Chat).unwrap();
        assert_eq!(chat.title, DEFAULT_CHAT_TITLE);
        assert_eq!(chat.user_id, "user-1");
        assert_eq!(chat.created_at, chat.updated_at);
    }

    #[test]
    fn test_chat_new_blank_title_falls_back() {
        let chat = Chat::new("u", Some("   "), ViewMode::Chat).unwrap();
        assert_eq!(chat.title, DEFAULT_CHAT_TITLE);
    }

    #[test]
    fn test_chat_new_trims_title() {
        let chat = Chat::new("u", Some("  Trip plans "), ViewMode::Mindmap).unwrap();
        assert_eq!(chat.title, "Trip plans");
        assert_eq!(chat.view_mode, ViewMode::Mindmap);
    }

    #[test]
    fn test_normalize_title_rejects_empty_and_long() {
        assert!(normalize_title("  ").is_err());
        let long = "x".repeat(MAX_TITLE_LEN + 1);
        assert!(normalize_title(&long).is_err());
        let max = "y".repeat(MAX_TITLE_LEN);
        assert_eq!(normalize_title(&max).unwrap(), max);
    }

    #[test]
    fn test_view_mode_serde() {
        assert_eq!(
            serde_json::to_string(&ViewMode::Mindmap).unwrap(),
            "\"mindmap\""
        );
        assert_eq!("chat".parse::<ViewMode>().unwrap(), ViewMode::Chat);
        assert!("graph".parse::<ViewMode>().is_err());
    }

    #[test]
    fn test_role_parse() {
        assert_eq!("assistant".parse::<MessageRole>().unwrap(), MessageRole::Assistant);
        assert!("system".parse::<MessageRole>().is_err());
    }

    #[test]
    fn test_viewport_validation() {
        assert!(Viewport { x: 0.0, y: 0.0, zoom: 1.0 }.validate().is_ok());
        assert!(Viewport { x: 0.0, y: 0.0, zoom: 0.0 }.validate().is_err());
        assert!(Viewport { x: f64::NAN, y: 0.0, zoom: 1.0 }.validate().is_err());
    }

    #[test]
    fn test_message_from_request_rejects_non_object_style() {
        let chat = Chat::new("u", None, ViewMode::Chat).unwrap();
        let req = SendMessageRequest {
            content: "hi".to_string(),
            node_style: Some(serde_json::json!("red")),
            ..Default::default()
        };
        assert!(Message::from_request(&chat, req).is_err());
    }

    #[test]
    fn test_message_inherits_chat_owner() {
        let chat = Chat::new("owner", None, ViewMode::Chat).unwrap();
        let req = SendMessageRequest {
            role: MessageRole::Assistant,
            content: "hello".to_string(),
            ..Default::default()
        };
        let msg = Message::from_request(&chat, req).unwrap();
        assert_eq!(msg.user_id, "owner");
        assert_eq!(msg.chat_id, chat.id);
        assert_eq!(msg.role, MessageRole::Assistant);
    }

    #[test]
    fn test_send_message_request_defaults_role() {
        let req: SendMessageRequest = serde_json::from_str(r#"{"content":"hi"}"#).unwrap();
        assert_eq!(req.role, MessageRole::User);
        assert!(req.parent_id.is_none());
    }

    #[test]
    fn test_stream_record_push_and_finish() {
        let mut rec = StreamRecord::new(None);
        rec.push("Hel".to_string(), false).unwrap();
        rec.push("lo".to_string(), true).unwrap();
        assert_eq!(rec.text(), "Hello");
        assert!(rec.done);
        let err = rec.push("!".to_string(), false).unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }
}
