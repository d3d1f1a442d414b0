//! Environment-driven CORS policy and middleware.
//!
//! The allowed origins, methods and cache lifetime come from a per-environment
//! table, optionally overridden by `CORS_ORIGINS`, `CORS_METHODS`,
//! `CORS_CREDENTIALS` and `CORS_MAX_AGE`. Origins may contain `*` to match
//! one or more DNS labels (`https://*.vercel.app`).
//!
//! In strict environments a request carrying a disallowed `Origin` is
//! rejected with 403 before it reaches the router. Requests without an
//! `Origin` header (server-to-server, curl) always pass.

use std::collections::HashSet;
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use regex::Regex;
use tracing::{debug, warn};

use crate::config::{is_truthy, Environment};
use crate::error::ApiError;

/// Regex fragment substituted for `*` in origin patterns.
const LABELS_PATTERN: &str = r"[A-Za-z0-9-]+(?:\.[A-Za-z0-9-]+)*";

pub const DEFAULT_METHODS: &[&str] = &["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"];
pub const DEFAULT_ALLOWED_HEADERS: &[&str] =
    &["Content-Type", "Authorization", "X-Requested-With", "Accept"];
pub const DEFAULT_EXPOSED_HEADERS: &[&str] = &["X-Request-Id"];

/// Resolved CORS settings for one environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsConfig {
    pub origins: Vec<String>,
    pub methods: Vec<Method>,
    pub allowed_headers: Vec<HeaderName>,
    pub exposed_headers: Vec<HeaderName>,
    pub credentials: bool,
    pub max_age_secs: u64,
    /// Reject origins outside the list instead of reflecting any origin.
    pub strict: bool,
}

impl CorsConfig {
    /// Built-in table entry for `env`.
    pub fn for_environment(env: Environment) -> Self {
        let (origins, strict, max_age_secs): (&[&str], bool, u64) = match env {
            Environment::Development => (
                &[
                    "http://localhost:3000",
                    "http://localhost:3001",
                    "http://127.0.0.1:3000",
                ],
                false,
                86_400,
            ),
            Environment::Test => (
                &["http://localhost:3000", "http://localhost:3001"],
                true,
                0,
            ),
            Environment::Staging => (
                &["https://staging.openchat.app", "https://*.vercel.app"],
                true,
                3_600,
            ),
            Environment::Production => (
                &["https://openchat.app", "https://www.openchat.app"],
                true,
                86_400,
            ),
        };

        Self {
            origins: origins.iter().map(|o| o.to_string()).collect(),
            methods: DEFAULT_METHODS
                .iter()
                .filter_map(|m| Method::from_bytes(m.as_bytes()).ok())
                .collect(),
            allowed_headers: DEFAULT_ALLOWED_HEADERS
                .iter()
                .filter_map(|h| HeaderName::from_bytes(h.as_bytes()).ok())
                .collect(),
            exposed_headers: DEFAULT_EXPOSED_HEADERS
                .iter()
                .filter_map(|h| HeaderName::from_bytes(h.as_bytes()).ok())
                .collect(),
            credentials: true,
            max_age_secs,
            strict,
        }
    }

    /// Table entry for `env` with `CORS_*` overrides from `lookup` applied.
    pub fn from_lookup<F>(env: Environment, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::for_environment(env);
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(raw) = get("CORS_ORIGINS") {
            let origins = parse_origins(&raw);
            if origins.is_empty() {
                warn!(subsystem = "cors", value = %raw, "CORS_ORIGINS has no valid entries, keeping defaults");
            } else {
                config.origins = origins;
            }
        }
        if let Some(raw) = get("CORS_METHODS") {
            let methods = parse_methods(&raw);
            if !methods.is_empty() {
                config.methods = methods;
            }
        }
        if let Some(raw) = get("CORS_CREDENTIALS") {
            config.credentials = is_truthy(&raw);
        }
        if let Some(raw) = get("CORS_MAX_AGE") {
            match raw.parse() {
                Ok(secs) => config.max_age_secs = secs,
                Err(_) => warn!(subsystem = "cors", value = %raw, "Invalid CORS_MAX_AGE, keeping default"),
            }
        }
        config
    }

    pub fn from_env(env: Environment) -> Self {
        Self::from_lookup(env, |key| std::env::var(key).ok())
    }
}

/// Split a comma list of origins, dropping entries that are not
/// `scheme://host[:port]`.
pub fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .filter_map(|s| {
            let trimmed = s.trim().trim_end_matches('/');
            if trimmed.is_empty() {
                return None;
            }
            if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
                warn!(subsystem = "cors", origin = trimmed, "Skipping invalid CORS origin");
                return None;
            }
            if HeaderValue::from_str(trimmed).is_err() {
                warn!(subsystem = "cors", origin = trimmed, "Skipping invalid CORS origin");
                return None;
            }
            Some(trimmed.to_string())
        })
        .collect()
}

fn parse_methods(raw: &str) -> Vec<Method> {
    raw.split(',')
        .filter_map(|s| {
            let name = s.trim().to_ascii_uppercase();
            if name.is_empty() {
                return None;
            }
            match Method::from_bytes(name.as_bytes()) {
                Ok(m) => Some(m),
                Err(_) => {
                    warn!(subsystem = "cors", method = %name, "Skipping invalid CORS method");
                    None
                }
            }
        })
        .collect()
}

/// Exact and wildcard origin matching.
#[derive(Debug, Clone)]
pub struct OriginValidator {
    exact: HashSet<String>,
    patterns: Vec<Regex>,
    strict: bool,
}

impl OriginValidator {
    pub fn new(origins: &[String], strict: bool) -> Self {
        let mut exact = HashSet::new();
        let mut patterns = Vec::new();
        for origin in origins {
            if origin.contains('*') {
                match compile_wildcard(origin) {
                    Ok(re) => patterns.push(re),
                    Err(e) => warn!(subsystem = "cors", %origin, error = %e, "Skipping invalid origin pattern"),
                }
            } else {
                exact.insert(origin.clone());
            }
        }
        Self {
            exact,
            patterns,
            strict,
        }
    }

    /// Whether a request from `origin` may proceed.
    pub fn is_allowed(&self, origin: &str) -> bool {
        !self.strict || self.is_listed(origin)
    }

    /// Whether `origin` is in the configured list, ignoring strictness.
    pub fn is_listed(&self, origin: &str) -> bool {
        self.exact.contains(origin) || self.patterns.iter().any(|re| re.is_match(origin))
    }
}

fn compile_wildcard(origin: &str) -> Result<Regex, regex::Error> {
    let escaped = regex::escape(origin).replace(r"\*", LABELS_PATTERN);
    Regex::new(&format!("^{}$", escaped))
}

/// Compiled policy used by [`cors_middleware`].
#[derive(Debug, Clone)]
pub struct CorsPolicy {
    config: CorsConfig,
    validator: OriginValidator,
}

impl CorsPolicy {
    pub fn new(config: CorsConfig) -> Self {
        let validator = OriginValidator::new(&config.origins, config.strict);
        Self { config, validator }
    }

    pub fn config(&self) -> &CorsConfig {
        &self.config
    }

    pub fn validator(&self) -> &OriginValidator {
        &self.validator
    }

    /// Response headers for an allowed `origin`.
    pub fn headers_for(&self, origin: &HeaderValue, preflight: bool) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin.clone());
        headers.insert(header::VARY, HeaderValue::from_static("Origin"));
        if self.config.credentials {
            headers.insert(
                header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
                HeaderValue::from_static("true"),
            );
        }
        if let Some(value) = join_header(self.config.exposed_headers.iter().map(|h| h.as_str())) {
            headers.insert(header::ACCESS_CONTROL_EXPOSE_HEADERS, value);
        }
        if preflight {
            if let Some(value) = join_header(self.config.methods.iter().map(|m| m.as_str())) {
                headers.insert(header::ACCESS_CONTROL_ALLOW_METHODS, value);
            }
            if let Some(value) = join_header(self.config.allowed_headers.iter().map(|h| h.as_str()))
            {
                headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, value);
            }
            headers.insert(
                header::ACCESS_CONTROL_MAX_AGE,
                HeaderValue::from(self.config.max_age_secs),
            );
        }
        headers
    }
}

fn join_header<'a>(items: impl Iterator<Item = &'a str>) -> Option<HeaderValue> {
    let joined = items.collect::<Vec<_>>().join(", ");
    if joined.is_empty() {
        return None;
    }
    HeaderValue::from_str(&joined).ok()
}

fn is_preflight(request: &Request) -> bool {
    request.method() == Method::OPTIONS
        && request
            .headers()
            .contains_key(header::ACCESS_CONTROL_REQUEST_METHOD)
}

/// CORS middleware: answers preflights, rejects disallowed origins in strict
/// mode and decorates responses for allowed origins.
pub async fn cors_middleware(
    State(policy): State<Arc<CorsPolicy>>,
    request: Request,
    next: Next,
) -> Response {
    let origin = match request.headers().get(header::ORIGIN).cloned() {
        Some(origin) => origin,
        None => return next.run(request).await,
    };

    let allowed = origin
        .to_str()
        .map(|o| policy.validator.is_allowed(o))
        .unwrap_or(false);
    if !allowed {
        debug!(
            subsystem = "cors",
            origin = ?origin,
            method = %request.method(),
            "Origin rejected"
        );
        return ApiError::Forbidden("Origin not allowed".to_string()).into_response();
    }

    if is_preflight(&request) {
        let headers = policy.headers_for(&origin, true);
        return (StatusCode::NO_CONTENT, headers).into_response();
    }

    let mut response = next.run(request).await;
    let headers = policy.headers_for(&origin, false);
    for (name, value) in headers.iter() {
        if name == header::VARY {
            response.headers_mut().append(name, value.clone());
        } else {
            response.headers_mut().insert(name, value.clone());
        }
    }
    response
}
