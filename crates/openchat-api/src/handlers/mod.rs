//! HTTP handlers for openchat-api.

pub mod chats;
pub mod health;
pub mod messages;
pub mod session;
pub mod streams;

use serde::{Deserialize, Serialize};

/// Standardized pagination metadata for list responses.
#[derive(Serialize, Deserialize, Debug)]
pub struct PaginationMeta {
    /// Total number of items matching the query (across all pages)
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
    /// True if more items are available after this page
    pub has_more: bool,
}

/// List response wrapper with pagination metadata.
///
/// ```json
/// { "data": [...], "pagination": { "total": 100, "limit": 50, "offset": 0, "has_more": true } }
/// ```
#[derive(Serialize, Deserialize, Debug)]
pub struct ListResponse<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

impl<T: Serialize> ListResponse<T> {
    /// `has_more` is derived from offset, page length and total.
    pub fn new(data: Vec<T>, total: usize, limit: usize, offset: usize) -> Self {
        let has_more = offset + data.len() < total;
        Self {
            data,
            pagination: PaginationMeta {
                total,
                limit,
                offset,
                has_more,
            },
        }
    }
}
