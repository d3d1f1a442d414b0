//! Service layer for business logic.

pub mod chat_service;
pub mod stream_store;

pub use chat_service::ChatService;
pub use stream_store::StreamStore;
