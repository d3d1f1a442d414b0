//! Centralized default constants for OpenChat.
//!
//! Grouped by domain. Crates reference these instead of repeating literals.

// =============================================================================
// CHATS
// =============================================================================

/// Title given to chats created without one.
pub const DEFAULT_CHAT_TITLE: &str = "New Chat";

/// Maximum chat title length in characters.
pub const MAX_TITLE_LEN: usize = 200;

/// Default page size for chat listing.
pub const DEFAULT_LIST_LIMIT: i64 = 50;

/// Upper bound for a requested page size.
pub const MAX_LIST_LIMIT: i64 = 200;

// =============================================================================
// MESSAGES
// =============================================================================

/// Maximum number of ancestors walked when building a message thread.
pub const MAX_THREAD_DEPTH: usize = 1000;

// =============================================================================
// STREAMS
// =============================================================================

/// Default stream record TTL in seconds.
pub const DEFAULT_STREAM_TTL_SECS: u64 = 3600;

/// Key prefix for stream records in the stream store.
pub const STREAM_KEY_PREFIX: &str = "oc:stream:";

// =============================================================================
// SERVER
// =============================================================================

/// Default bind host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default bind port.
pub const DEFAULT_PORT: u16 = 3000;

/// Maximum accepted request body in bytes.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Default requests allowed per rate limit period.
pub const DEFAULT_RATE_LIMIT_REQUESTS: u64 = 100;

/// Default rate limit period in seconds.
pub const DEFAULT_RATE_LIMIT_PERIOD_SECS: u64 = 60;

/// Clamp a requested page size into `1..=MAX_LIST_LIMIT`.
pub fn clamp_limit(limit: Option<i64>) -> i64 {
    limit
        .unwrap_or(DEFAULT_LIST_LIMIT)
        .clamp(1, MAX_LIST_LIMIT)
}
