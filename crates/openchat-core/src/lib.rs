//! # openchat-core
//!
//! Core types, traits, and abstractions for the OpenChat backend.
//!
//! This crate provides the domain models (chats, messages, stream records)
//! and the repository traits that the storage and API crates depend on.

pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod thread;
pub mod traits;
pub mod uuid_utils;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use models::*;
pub use thread::ancestor_path;
pub use traits::*;
pub use uuid_utils::new_v7;
