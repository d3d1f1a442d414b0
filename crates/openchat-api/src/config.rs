//! Server configuration from environment variables.
//!
//! Every variable is parsed once at startup into [`AppConfig`]. Tests build
//! the same struct through [`AppConfig::from_lookup`] without touching the
//! process environment.

use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;
use std::time::Duration;

use governor::Quota;

use openchat_core::defaults::{
    DEFAULT_HOST, DEFAULT_PORT, DEFAULT_RATE_LIMIT_PERIOD_SECS, DEFAULT_RATE_LIMIT_REQUESTS,
    DEFAULT_STREAM_TTL_SECS,
};
use openchat_core::{Error, Result};
use tracing::warn;

/// Deployment environment, selected by `APP_ENV` (falling back to `NODE_ENV`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Test,
    Staging,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Test => "test",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }

    /// Production refuses to start with incomplete auth or storage config.
    pub fn is_strict(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" | "local" => Ok(Environment::Development),
            "test" | "testing" => Ok(Environment::Test),
            "staging" | "preview" => Ok(Environment::Staging),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(Error::Config(format!("unknown environment '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub requests: u64,
    pub period_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            requests: DEFAULT_RATE_LIMIT_REQUESTS,
            period_secs: DEFAULT_RATE_LIMIT_PERIOD_SECS,
        }
    }
}

impl RateLimitConfig {
    /// Governor quota: a burst of `requests`, refilled evenly over `period_secs`.
    pub fn quota(&self) -> Result<Quota> {
        let burst = u32::try_from(self.requests)
            .ok()
            .and_then(NonZeroU32::new)
            .ok_or_else(|| {
                Error::Config(format!(
                    "RATE_LIMIT_REQUESTS must be between 1 and {}, got {}",
                    u32::MAX,
                    self.requests
                ))
            })?;
        let period = Duration::from_secs(self.period_secs) / burst.get();
        Quota::with_period(period)
            .map(|quota| quota.allow_burst(burst))
            .ok_or_else(|| {
                Error::Config(format!(
                    "RATE_LIMIT_PERIOD_SECS={} is too short for {} requests",
                    self.period_secs, self.requests
                ))
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamStoreConfig {
    /// `REDIS_ENABLED`; false keeps streams in process memory.
    pub redis_enabled: bool,
    pub redis_url: String,
    pub ttl_secs: u64,
}

impl Default for StreamStoreConfig {
    fn default() -> Self {
        Self {
            redis_enabled: true,
            redis_url: "redis://localhost:6379".to_string(),
            ttl_secs: DEFAULT_STREAM_TTL_SECS,
        }
    }
}

/// Typed view of the server's environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    /// Production, or `AUTH_STRICT=true`.
    pub strict: bool,
    pub host: String,
    pub port: u16,
    /// PostgreSQL URL; `None` selects the in-memory store.
    pub database_url: Option<String>,
    pub rate_limit: RateLimitConfig,
    pub streams: StreamStoreConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Development,
            strict: false,
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            database_url: None,
            rate_limit: RateLimitConfig::default(),
            streams: StreamStoreConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Parse configuration through `lookup`.
    ///
    /// Unparseable numbers fall back to their defaults with a warning.
    /// A missing `DATABASE_URL` is an error only in strict mode.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let environment = match get("APP_ENV").or_else(|| get("NODE_ENV")) {
            Some(raw) => raw.parse().unwrap_or_else(|e| {
                warn!(subsystem = "config", error = %e, "Falling back to development");
                Environment::Development
            }),
            None => Environment::Development,
        };
        let strict = environment.is_strict() || get("AUTH_STRICT").is_some_and(|v| is_truthy(&v));

        let database_url = get("DATABASE_URL");
        if strict && database_url.is_none() {
            return Err(Error::Config(
                "DATABASE_URL is required in strict mode".to_string(),
            ));
        }

        let defaults = Self::default();
        let rate_limit = RateLimitConfig {
            enabled: get("RATE_LIMIT_ENABLED")
                .map(|v| is_truthy(&v))
                .unwrap_or(defaults.rate_limit.enabled),
            requests: parse_or(&get, "RATE_LIMIT_REQUESTS", defaults.rate_limit.requests),
            period_secs: parse_or(
                &get,
                "RATE_LIMIT_PERIOD_SECS",
                defaults.rate_limit.period_secs,
            ),
        };
        let streams = StreamStoreConfig {
            redis_enabled: get("REDIS_ENABLED")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(defaults.streams.redis_enabled),
            redis_url: get("REDIS_URL").unwrap_or(defaults.streams.redis_url),
            ttl_secs: parse_or(&get, "STREAM_TTL", defaults.streams.ttl_secs),
        };

        Ok(Self {
            environment,
            strict,
            host: get("HOST").unwrap_or(defaults.host),
            port: parse_or(&get, "PORT", defaults.port),
            database_url,
            rate_limit,
            streams,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

pub(crate) fn is_truthy(value: &str) -> bool {
    value.eq_ignore_ascii_case("true") || value == "1"
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> T
where
    T: FromStr + Copy,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            warn!(subsystem = "config", variable = key, value = %raw, "Invalid number, using default");
            default
        }),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn test_defaults() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.environment, Environment::Development);
        assert!(!cfg.strict);
        assert_eq!(cfg.port, DEFAULT_PORT);
        assert!(cfg.database_url.is_none());
        assert_eq!(cfg.streams.ttl_secs, DEFAULT_STREAM_TTL_SECS);
        assert!(cfg.rate_limit.enabled);
    }

    #[test]
    fn test_app_env_takes_precedence_over_node_env() {
        let cfg = config(&[("APP_ENV", "staging"), ("NODE_ENV", "production")]).unwrap();
        assert_eq!(cfg.environment, Environment::Staging);
        let cfg = config(&[("NODE_ENV", "test")]).unwrap();
        assert_eq!(cfg.environment, Environment::Test);
    }

    #[test]
    fn test_production_requires_database_url() {
        assert!(matches!(
            config(&[("APP_ENV", "production")]),
            Err(Error::Config(_))
        ));
        let cfg = config(&[
            ("APP_ENV", "production"),
            ("DATABASE_URL", "postgres://db/openchat"),
        ])
        .unwrap();
        assert!(cfg.strict);
    }

    #[test]
    fn test_auth_strict_enables_strict_mode() {
        assert!(config(&[("AUTH_STRICT", "true")]).is_err());
    }

    #[test]
    fn test_invalid_numbers_fall_back() {
        let cfg = config(&[("PORT", "http"), ("STREAM_TTL", "-5")]).unwrap();
        assert_eq!(cfg.port, DEFAULT_PORT);
        assert_eq!(cfg.streams.ttl_secs, DEFAULT_STREAM_TTL_SECS);
    }

    #[test]
    fn test_unknown_environment_is_development() {
        let cfg = config(&[("APP_ENV", "qa-cluster")]).unwrap();
        assert_eq!(cfg.environment, Environment::Development);
    }

    #[test]
    fn test_redis_and_rate_limit_switches() {
        let cfg = config(&[
            ("REDIS_ENABLED", "false"),
            ("RATE_LIMIT_ENABLED", "0"),
            ("RATE_LIMIT_REQUESTS", "5"),
        ])
        .unwrap();
        assert!(!cfg.streams.redis_enabled);
        assert!(!cfg.rate_limit.enabled);
        assert_eq!(cfg.rate_limit.requests, 5);
    }

    #[test]
    fn test_rate_limit_quota() {
        let quota = RateLimitConfig {
            enabled: true,
            requests: 60,
            period_secs: 60,
        }
        .quota()
        .unwrap();
        assert_eq!(quota.burst_size().get(), 60);
        assert_eq!(quota.replenish_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_rate_limit_quota_rejects_out_of_range_values() {
        let base = RateLimitConfig::default();
        for bad in [
            RateLimitConfig {
                requests: u64::from(u32::MAX) + 1,
                ..base.clone()
            },
            RateLimitConfig {
                requests: 0,
                ..base.clone()
            },
            RateLimitConfig {
                period_secs: 0,
                ..base.clone()
            },
        ] {
            assert!(matches!(bad.quota(), Err(Error::Config(_))), "{:?}", bad);
        }
    }
}
