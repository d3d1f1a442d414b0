//! Shared application state.

use std::sync::Arc;

use governor::{clock::DefaultClock, state::InMemoryState, state::NotKeyed, RateLimiter};
use openchat_auth::{AuthProvider, JwtVerifier};
use openchat_core::{ChatRepository, MessageRepository};
use openchat_db::{Database, InMemoryStore};

use crate::config::Environment;
use crate::cors::CorsPolicy;
use crate::services::{ChatService, StreamStore};

/// Global rate limiter type (direct quota, no per-client buckets).
pub type GlobalRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Chat and message repositories behind trait objects.
#[derive(Clone)]
pub struct Storage {
    pub chats: Arc<dyn ChatRepository>,
    pub messages: Arc<dyn MessageRepository>,
    /// `"postgres"` or `"memory"`.
    pub backend: &'static str,
}

impl Storage {
    pub fn postgres(db: Database) -> Self {
        Self {
            chats: Arc::new(db.chats),
            messages: Arc::new(db.messages),
            backend: "postgres",
        }
    }

    pub fn in_memory(store: InMemoryStore) -> Self {
        Self {
            chats: Arc::new(store.clone()),
            messages: Arc::new(store),
            backend: "memory",
        }
    }
}

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub chats: ChatService,
    pub streams: StreamStore,
    pub verifier: Arc<JwtVerifier>,
    /// Public provider list served by `/api/v1/auth/config`.
    pub auth_providers: Arc<Vec<AuthProvider>>,
    pub cors: Arc<CorsPolicy>,
    /// None when rate limiting is disabled.
    pub rate_limiter: Option<Arc<GlobalRateLimiter>>,
    pub environment: Environment,
    pub storage_backend: &'static str,
}

impl AppState {
    pub fn new(
        storage: Storage,
        streams: StreamStore,
        verifier: JwtVerifier,
        auth_providers: Vec<AuthProvider>,
        cors: CorsPolicy,
        environment: Environment,
    ) -> Self {
        Self {
            storage_backend: storage.backend,
            chats: ChatService::new(storage.chats, storage.messages),
            streams,
            verifier: Arc::new(verifier),
            auth_providers: Arc::new(auth_providers),
            cors: Arc::new(cors),
            rate_limiter: None,
            environment,
        }
    }

    pub fn with_rate_limiter(mut self, limiter: GlobalRateLimiter) -> Self {
        self.rate_limiter = Some(Arc::new(limiter));
        self
    }
}
