//! Chat repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use openchat_core::{Chat, ChatRepository, Error, Result, Viewport};

const CHAT_COLUMNS: &str = "id, user_id, title, view_mode, viewport_x, viewport_y, viewport_zoom, \
                            created_at, updated_at";

/// PostgreSQL implementation of ChatRepository.
#[derive(Clone)]
pub struct PgChatRepository {
    pool: Pool<Postgres>,
}

impl PgChatRepository {
    /// Create a new PgChatRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn chat_from_row(r: &PgRow) -> Result<Chat> {
    let view_mode: String = r.get("view_mode");
    let viewport = match (
        r.get::<Option<f64>, _>("viewport_x"),
        r.get::<Option<f64>, _>("viewport_y"),
        r.get::<Option<f64>, _>("viewport_zoom"),
    ) {
        (Some(x), Some(y), Some(zoom)) => Some(Viewport { x, y, zoom }),
        _ => None,
    };
    Ok(Chat {
        id: r.get("id"),
        user_id: r.get("user_id"),
        title: r.get("title"),
        view_mode: view_mode.parse()?,
        viewport,
        created_at: r.get("created_at"),
        updated_at: r.get("updated_at"),
    })
}

#[async_trait]
impl ChatRepository for PgChatRepository {
    async fn insert(&self, chat: &Chat) -> Result<()> {
        sqlx::query(
            "INSERT INTO chat (id, user_id, title, view_mode, viewport_x, viewport_y, viewport_zoom,
                               created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(chat.id)
        .bind(&chat.user_id)
        .bind(&chat.title)
        .bind(chat.view_mode.as_str())
        .bind(chat.viewport.map(|v| v.x))
        .bind(chat.viewport.map(|v| v.y))
        .bind(chat.viewport.map(|v| v.zoom))
        .bind(chat.created_at)
        .bind(chat.updated_at)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Chat>> {
        let row = sqlx::query(&format!("SELECT {} FROM chat WHERE id = $1", CHAT_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        row.as_ref().map(chat_from_row).transpose()
    }

    async fn list_by_owner(&self, user_id: &str, limit: i64, offset: i64) -> Result<Vec<Chat>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM chat
             WHERE user_id = $1
             ORDER BY updated_at DESC, id DESC
             LIMIT $2 OFFSET $3",
            CHAT_COLUMNS
        ))
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        rows.iter().map(chat_from_row).collect()
    }

    async fn count_by_owner(&self, user_id: &str) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chat WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(count)
    }

    async fn update(&self, chat: &Chat) -> Result<()> {
        let result = sqlx::query(
            "UPDATE chat
             SET title = $2, view_mode = $3,
                 viewport_x = $4, viewport_y = $5, viewport_zoom = $6,
                 updated_at = $7
             WHERE id = $1",
        )
        .bind(chat.id)
        .bind(&chat.title)
        .bind(chat.view_mode.as_str())
        .bind(chat.viewport.map(|v| v.x))
        .bind(chat.viewport.map(|v| v.y))
        .bind(chat.viewport.map(|v| v.zoom))
        .bind(chat.updated_at)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::ChatNotFound(chat.id));
        }
        Ok(())
    }

    async fn touch(&self, id: Uuid, at: DateTime<Utc>) -> Result<()> {
        sqlx::query("UPDATE chat SET updated_at = $2 WHERE id = $1")
            .bind(id)
            .bind(at)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let removed = sqlx::query("DELETE FROM message WHERE chat_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?
            .rows_affected();

        let deleted = sqlx::query("DELETE FROM chat WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?
            .rows_affected();

        tx.commit().await.map_err(Error::Database)?;

        tracing::debug!(
            subsystem = "db",
            component = "chats",
            op = "delete",
            chat_id = %id,
            messages_removed = removed,
            "Chat deleted"
        );
        Ok(deleted > 0)
    }
}
