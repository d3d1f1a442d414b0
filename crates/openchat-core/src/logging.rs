//! Structured logging field name constants for OpenChat.
//!
//! All crates use these constants for consistent structured logging fields,
//! so log aggregation can query by the same names across subsystems.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Lifecycle events (startup, shutdown), operation completions |
//! | DEBUG | Decision points, rejected tokens, config choices |
//! | TRACE | Per-item iteration (messages, stream chunks) |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Correlation ID propagated from the `X-Request-Id` header.
pub const REQUEST_ID: &str = "request_id";

/// Subsystem originating the log event.
/// Values: "api", "db", "auth", "cors", "streams"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "chat_service", "pool", "jwt", "stream_store"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "create_chat", "send_message", "verify"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Authenticated user id (JWT subject).
pub const USER_ID: &str = "user_id";

/// Chat UUID being operated on.
pub const CHAT_ID: &str = "chat_id";

/// Message UUID being operated on.
pub const MESSAGE_ID: &str = "message_id";

/// Stream identifier in the stream store.
pub const STREAM_ID: &str = "stream_id";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of rows returned by a query.
pub const RESULT_COUNT: &str = "result_count";

// ─── Database fields ───────────────────────────────────────────────────────

/// Number of active connections in the pool.
pub const POOL_SIZE: &str = "pool_size";

/// Number of idle connections in the pool.
pub const POOL_IDLE: &str = "pool_idle";

/// Database table or entity affected.
pub const DB_TABLE: &str = "db_table";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
