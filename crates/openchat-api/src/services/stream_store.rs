//! TTL key-value store for resumable AI response streams.
//!
//! Backed by Redis when available, otherwise by an in-process map whose
//! entries carry their own expiry instant. Expired entries are dropped
//! lazily on read and swept on every write.
//!
//! ## Configuration
//!
//! Environment variables:
//! - `REDIS_ENABLED`: Set to "false" to keep streams in memory (default: true)
//! - `REDIS_URL`: Redis connection URL (default: redis://localhost:6379)
//! - `STREAM_TTL`: Entry lifetime in seconds (default: 3600)

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use openchat_core::defaults::STREAM_KEY_PREFIX;
use openchat_core::{Error, Result, StreamRecord};

use crate::config::StreamStoreConfig;

struct MemoryEntry {
    value: String,
    expires_at: Instant,
}

/// Stream store shared across handlers. Clones share the same backend.
#[derive(Clone)]
pub struct StreamStore {
    inner: Arc<StreamStoreInner>,
}

struct StreamStoreInner {
    /// Redis connection manager (None selects the in-memory map).
    connection: RwLock<Option<ConnectionManager>>,
    memory: RwLock<HashMap<String, MemoryEntry>>,
    ttl_seconds: u64,
    prefix: String,
}

fn redis_error(op: &str, e: redis::RedisError) -> Error {
    error!(subsystem = "streams", component = "redis", op, error = %e, "Redis command failed");
    Error::Internal(format!("stream store {} failed: {}", op, e))
}

impl StreamStore {
    /// Connect according to `config`, falling back to memory when Redis is
    /// disabled or unreachable.
    pub async fn connect(config: &StreamStoreConfig) -> Self {
        let connection = if config.redis_enabled {
            match redis::Client::open(config.redis_url.as_str()) {
                Ok(client) => match ConnectionManager::new(client).await {
                    Ok(conn) => {
                        info!(
                            subsystem = "streams",
                            ttl_secs = config.ttl_secs,
                            "Redis stream store enabled"
                        );
                        Some(conn)
                    }
                    Err(e) => {
                        warn!(subsystem = "streams", error = %e, "Failed to connect to Redis, using in-memory stream store");
                        None
                    }
                },
                Err(e) => {
                    warn!(subsystem = "streams", error = %e, "Invalid REDIS_URL, using in-memory stream store");
                    None
                }
            }
        } else {
            info!(subsystem = "streams", "Redis disabled via REDIS_ENABLED=false, using in-memory stream store");
            None
        };
        Self::with_connection(connection, config.ttl_secs)
    }

    /// In-memory store with the given TTL.
    pub fn in_memory(ttl_seconds: u64) -> Self {
        Self::with_connection(None, ttl_seconds)
    }

    fn with_connection(connection: Option<ConnectionManager>, ttl_seconds: u64) -> Self {
        Self {
            inner: Arc::new(StreamStoreInner {
                connection: RwLock::new(connection),
                memory: RwLock::new(HashMap::new()),
                ttl_seconds: ttl_seconds.max(1),
                prefix: STREAM_KEY_PREFIX.to_string(),
            }),
        }
    }

    /// `"redis"` or `"memory"`.
    pub async fn backend_name(&self) -> &'static str {
        if self.inner.connection.read().await.is_some() {
            "redis"
        } else {
            "memory"
        }
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.inner.ttl_seconds)
    }

    /// Namespaced key for a user's stream.
    pub fn key(&self, user_id: &str, stream_id: Uuid) -> String {
        format!("{}{}:{}", self.inner.prefix, user_id, stream_id)
    }

    // -------------------------------------------------------------------------
    // Generic TTL operations
    // -------------------------------------------------------------------------

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let raw = {
            let mut conn_guard = self.inner.connection.write().await;
            match conn_guard.as_mut() {
                Some(conn) => conn
                    .get::<_, Option<String>>(key)
                    .await
                    .map_err(|e| redis_error("GET", e))?,
                None => self.memory_get(key).await,
            }
        };
        match raw {
            Some(data) => Ok(Some(serde_json::from_str(&data)?)),
            None => {
                debug!(subsystem = "streams", key, "Stream store MISS");
                Ok(None)
            }
        }
    }

    /// Store `value` under `key`, resetting its TTL.
    pub async fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let serialized = serde_json::to_string(value)?;
        let mut conn_guard = self.inner.connection.write().await;
        match conn_guard.as_mut() {
            Some(conn) => conn
                .set_ex::<_, _, ()>(key, serialized, self.inner.ttl_seconds)
                .await
                .map_err(|e| redis_error("SET", e))?,
            None => self.memory_set(key, serialized).await,
        }
        debug!(subsystem = "streams", key, ttl_secs = self.inner.ttl_seconds, "Stream store SET");
        Ok(())
    }

    /// Remove `key`. Returns whether an entry was present.
    pub async fn delete(&self, key: &str) -> Result<bool> {
        let mut conn_guard = self.inner.connection.write().await;
        match conn_guard.as_mut() {
            Some(conn) => {
                let removed: u64 = conn.del(key).await.map_err(|e| redis_error("DEL", e))?;
                Ok(removed > 0)
            }
            None => {
                let mut memory = self.inner.memory.write().await;
                Ok(memory
                    .remove(key)
                    .is_some_and(|entry| entry.expires_at > Instant::now()))
            }
        }
    }

    async fn memory_get(&self, key: &str) -> Option<String> {
        let now = Instant::now();
        {
            let memory = self.inner.memory.read().await;
            match memory.get(key) {
                Some(entry) if entry.expires_at > now => return Some(entry.value.clone()),
                Some(_) => {}
                None => return None,
            }
        }
        // Expired: drop it
        self.inner.memory.write().await.remove(key);
        None
    }

    async fn memory_set(&self, key: &str, value: String) {
        let now = Instant::now();
        let mut memory = self.inner.memory.write().await;
        memory.retain(|_, entry| entry.expires_at > now);
        memory.insert(
            key.to_string(),
            MemoryEntry {
                value,
                expires_at: now + self.ttl(),
            },
        );
    }

    // -------------------------------------------------------------------------
    // Stream records
    // -------------------------------------------------------------------------

    /// Start a new stream for `user_id`.
    pub async fn open(&self, user_id: &str, chat_id: Option<Uuid>) -> Result<StreamRecord> {
        let record = StreamRecord::new(chat_id);
        self.set(&self.key(user_id, record.stream_id), &record)
            .await?;
        info!(
            subsystem = "streams",
            op = "open",
            user_id,
            stream_id = %record.stream_id,
            "Stream opened"
        );
        Ok(record)
    }

    pub async fn get_record(&self, user_id: &str, stream_id: Uuid) -> Result<Option<StreamRecord>> {
        self.get(&self.key(user_id, stream_id)).await
    }

    /// Append a chunk and refresh the TTL.
    ///
    /// Read-modify-write: concurrent producers on one stream may lose chunks.
    pub async fn append_chunk(
        &self,
        user_id: &str,
        stream_id: Uuid,
        chunk: String,
        done: bool,
    ) -> Result<StreamRecord> {
        let key = self.key(user_id, stream_id);
        let mut record: StreamRecord = self
            .get(&key)
            .await?
            .ok_or_else(|| Error::NotFound(format!("stream {}", stream_id)))?;
        record.push(chunk, done)?;
        self.set(&key, &record).await?;
        Ok(record)
    }

    pub async fn drop_stream(&self, user_id: &str, stream_id: Uuid) -> Result<bool> {
        self.delete(&self.key(user_id, stream_id)).await
    }
}
