//! openchat-api - HTTP API server for OpenChat

use std::net::SocketAddr;

use anyhow::Context;
use governor::RateLimiter;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use openchat_api::{
    build_router, AppConfig, AppState, CorsConfig, CorsPolicy, Storage, StreamStore,
};
use openchat_auth::AuthConfig;
use openchat_db::{Database, InMemoryStore, PoolConfig};

/// Initialize tracing with configurable output.
///
/// Environment variables:
///   LOG_FORMAT  - "json" or "text" (default: "text")
///   LOG_FILE    - path to log file (optional, enables daily-rotated file logging)
///   LOG_ANSI    - "true"/"false" override ANSI colors (auto-detected by default)
///   RUST_LOG    - standard env filter (default: "openchat_api=debug,tower_http=debug")
fn init_tracing() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "openchat_api=debug,openchat_auth=info,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(env_filter);

    let guard = if let Some(ref path) = log_file {
        let file_dir = std::path::Path::new(path)
            .parent()
            .unwrap_or(std::path::Path::new("."));
        let file_name = std::path::Path::new(path)
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("openchat-api.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .init();
        } else {
            // no ANSI in files unless asked
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(log_ansi.unwrap_or(false));
            registry.with(layer).init();
        }
        Some(guard)
    } else {
        if log_format == "json" {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer();
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            }
            registry.with(layer).init();
        }
        None
    };

    info!(
        log_format = %log_format,
        log_file = log_file.as_deref().unwrap_or("(stdout)"),
        "Logging initialized"
    );
    guard
}

async fn open_storage(config: &AppConfig) -> anyhow::Result<Storage> {
    match &config.database_url {
        Some(url) => {
            info!("Connecting to database...");
            let pool_config = PoolConfig::from_lookup(|key| std::env::var(key).ok());
            let db = Database::connect_with_config(url, pool_config)
                .await
                .context("failed to connect to PostgreSQL")?;
            info!("Running database migrations...");
            db.migrate().await.context("failed to run migrations")?;
            info!("Database ready");
            Ok(Storage::postgres(db))
        }
        None => {
            warn!(
                environment = %config.environment,
                "DATABASE_URL not set, using in-memory storage (data is lost on restart)"
            );
            Ok(Storage::in_memory(InMemoryStore::new()))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let _log_guard = init_tracing();

    let config = AppConfig::from_env().context("invalid server configuration")?;
    info!(
        environment = %config.environment,
        strict = config.strict,
        "Configuration loaded"
    );

    let auth = AuthConfig::from_env(config.strict).context("invalid auth configuration")?;
    if auth.dev_keys {
        warn!("Accepting tokens signed by the development key; mint one with openchat-dev-token");
    }

    let storage = open_storage(&config).await?;
    let streams = StreamStore::connect(&config.streams).await;
    let cors = CorsPolicy::new(CorsConfig::from_env(config.environment));

    let mut state = AppState::new(
        storage,
        streams,
        auth.verifier(),
        auth.providers.clone(),
        cors,
        config.environment,
    );

    info!(
        "Rate limiting: {} ({} requests per {} seconds)",
        if config.rate_limit.enabled { "enabled" } else { "disabled" },
        config.rate_limit.requests,
        config.rate_limit.period_secs
    );
    if config.rate_limit.enabled {
        let quota = config
            .rate_limit
            .quota()
            .context("invalid rate limit configuration")?;
        state = state.with_rate_limiter(RateLimiter::direct(quota));
    }

    let app = build_router(state);

    let addr: SocketAddr = config.bind_address().parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
