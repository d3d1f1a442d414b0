//! UUID v7 utilities for time-ordered identifiers.
//!
//! Chat and message ids are UUIDv7, so sorting by id matches creation order
//! for rows created in different milliseconds. Message listing uses
//! `(created_at, id)` which relies on this.

use uuid::Uuid;

/// Generate a new UUIDv7 identifier.
///
/// # Example
///
/// ```
/// use openchat_core::uuid_utils::new_v7;
///
/// let id = new_v7();
/// assert_eq!(id.get_version_num(), 7);
/// ```
#[inline]
pub fn new_v7() -> Uuid {
    Uuid::now_v7()
}
