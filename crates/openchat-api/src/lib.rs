//! # openchat-api
//!
//! HTTP API server for OpenChat: chat and message CRUD with mind-map
//! branching, JWT session validation, environment-driven CORS, and a TTL
//! store for resumable response streams.

pub mod auth;
pub mod config;
pub mod cors;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod routes;
pub mod services;
pub mod state;

pub use auth::{Auth, RequireAuth, Session};
pub use config::{AppConfig, Environment};
pub use cors::{CorsConfig, CorsPolicy, OriginValidator};
pub use error::ApiError;
pub use extract::{ApiJson, ApiPath, ApiQuery};
pub use routes::build_router;
pub use services::{ChatService, StreamStore};
pub use state::{AppState, GlobalRateLimiter, Storage};
