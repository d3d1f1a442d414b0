//! Parent-pointer walks over the message forest of a chat.

use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::Message;

/// Ancestor path from the root down to `leaf` (inclusive).
///
/// A parent that is not present in `messages` ends the walk there, so the
/// first element is the oldest reachable ancestor. Cycles and paths deeper
/// than `max_depth` are reported as errors.
pub fn ancestor_path(messages: &[Message], leaf: Uuid, max_depth: usize) -> Result<Vec<Message>> {
    let by_id: HashMap<Uuid, &Message> = messages.iter().map(|m| (m.id, m)).collect();

    let mut current = by_id
        .get(&leaf)
        .copied()
        .ok_or(Error::MessageNotFound(leaf))?;

    let mut seen = HashSet::new();
    let mut path = Vec::new();
    loop {
        if !seen.insert(current.id) {
            return Err(Error::Internal(format!(
                "cycle in message parents at {}",
                current.id
            )));
        }
        if path.len() >= max_depth {
            return Err(Error::Internal(format!(
                "message thread deeper than {}",
                max_depth
            )));
        }
        path.push(current.clone());
        match current.parent_id.and_then(|p| by_id.get(&p).copied()) {
            Some(parent) => current = parent,
            None => break,
        }
    }

    path.reverse();
    Ok(path)
}
