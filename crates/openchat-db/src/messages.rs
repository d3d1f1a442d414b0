//! Message repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use openchat_core::{Error, Message, MessageRepository, Position, Result};

const MESSAGE_COLUMNS: &str = "id, chat_id, user_id, role, content, parent_id, position_x, \
                               position_y, node_style, highlighted_text, created_at, updated_at";

/// PostgreSQL implementation of MessageRepository.
#[derive(Clone)]
pub struct PgMessageRepository {
    pool: Pool<Postgres>,
}

impl PgMessageRepository {
    /// Create a new PgMessageRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn message_from_row(r: &PgRow) -> Result<Message> {
    let role: String = r.get("role");
    let position = match (
        r.get::<Option<f64>, _>("position_x"),
        r.get::<Option<f64>, _>("position_y"),
    ) {
        (Some(x), Some(y)) => Some(Position { x, y }),
        _ => None,
    };
    Ok(Message {
        id: r.get("id"),
        chat_id: r.get("chat_id"),
        user_id: r.get("user_id"),
        role: role.parse()?,
        content: r.get("content"),
        parent_id: r.get("parent_id"),
        position,
        node_style: r.get("node_style"),
        highlighted_text: r.get("highlighted_text"),
        created_at: r.get("created_at"),
        updated_at: r.get("updated_at"),
    })
}

#[async_trait]
impl MessageRepository for PgMessageRepository {
    async fn insert(&self, message: &Message) -> Result<()> {
        sqlx::query(
            "INSERT INTO message (id, chat_id, user_id, role, content, parent_id,
                                  position_x, position_y, node_style, highlighted_text,
                                  created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(message.id)
        .bind(message.chat_id)
        .bind(&message.user_id)
        .bind(message.role.as_str())
        .bind(&message.content)
        .bind(message.parent_id)
        .bind(message.position.map(|p| p.x))
        .bind(message.position.map(|p| p.y))
        .bind(&message.node_style)
        .bind(&message.highlighted_text)
        .bind(message.created_at)
        .bind(message.updated_at)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Message>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM message WHERE id = $1",
            MESSAGE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        row.as_ref().map(message_from_row).transpose()
    }

    async fn list_by_chat(&self, chat_id: Uuid) -> Result<Vec<Message>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM message WHERE chat_id = $1 ORDER BY created_at, id",
            MESSAGE_COLUMNS
        ))
        .bind(chat_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        rows.iter().map(message_from_row).collect()
    }

    async fn update_position(&self, id: Uuid, position: Position, at: DateTime<Utc>) -> Result<()> {
        let result = sqlx::query(
            "UPDATE message SET position_x = $2, position_y = $3, updated_at = $4 WHERE id = $1",
        )
        .bind(id)
        .bind(position.x)
        .bind(position.y)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::MessageNotFound(id));
        }
        Ok(())
    }

    async fn update_content(&self, id: Uuid, content: &str, at: DateTime<Utc>) -> Result<()> {
        let result = sqlx::query("UPDATE message SET content = $2, updated_at = $3 WHERE id = $1")
            .bind(id)
            .bind(content)
            .bind(at)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::MessageNotFound(id));
        }
        Ok(())
    }
}
