//! Auth provider configuration.
//!
//! Providers are built once at startup from `AUTH_ISSUER` (or
//! `CONVEX_SITE_URL`), `JWKS` and the optional `AUTH_APPLICATION_ID`.
//! In strict mode both issuer and key set are mandatory. In development a
//! fixed local issuer pair and a deterministic key stand in for whatever is
//! missing.

use ed25519_dalek::SigningKey;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::error::{AuthError, Result};
use crate::jwks::{self, Jwk, JsonWebKeySet, KeySet};
use crate::jwt::JwtVerifier;

pub const ENV_AUTH_ISSUER: &str = "AUTH_ISSUER";
pub const ENV_CONVEX_SITE_URL: &str = "CONVEX_SITE_URL";
pub const ENV_JWKS: &str = "JWKS";
pub const ENV_APPLICATION_ID: &str = "AUTH_APPLICATION_ID";
pub const ENV_AUTH_STRICT: &str = "AUTH_STRICT";

/// Issuer used in development when none is configured.
pub const DEV_ISSUER: &str = "http://localhost:3000";

/// Alternate local port accepted in development.
pub const DEV_ALT_ISSUER: &str = "http://localhost:3001";

/// Key id of the deterministic development key.
pub const DEV_KEY_ID: &str = "openchat-dev";

/// Only supported signing algorithm.
pub const ALGORITHM: &str = "EdDSA";

const DEV_KEY_SEED: &[u8] = b"openchat development signing key";

/// A single `customJwt` verification provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthProvider {
    #[serde(rename = "type")]
    pub provider_type: &'static str,
    pub issuer: String,
    /// Key set as a base64 `data:` URI.
    pub jwks: String,
    pub algorithm: &'static str,
    #[serde(rename = "applicationID", skip_serializing_if = "Option::is_none")]
    pub application_id: Option<String>,
}

impl AuthProvider {
    fn custom_jwt(issuer: &str, jwks_json: &str, application_id: Option<String>) -> Self {
        Self {
            provider_type: "customJwt",
            issuer: normalize_issuer(issuer),
            jwks: jwks::to_data_uri(jwks_json),
            algorithm: ALGORITHM,
            application_id,
        }
    }
}

/// Validated provider list plus the parsed keys backing it.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub providers: Vec<AuthProvider>,
    /// True when the development key set is in use.
    pub dev_keys: bool,
    keys: KeySet,
}

impl AuthConfig {
    /// Load from the process environment.
    ///
    /// Strict mode is forced by the caller (production) or by `AUTH_STRICT=true`.
    pub fn from_env(strict: bool) -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok(), strict)
    }

    /// Load using an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F, strict: bool) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let strict = strict
            || get(ENV_AUTH_STRICT)
                .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
                .unwrap_or(false);
        let issuer = get(ENV_AUTH_ISSUER).or_else(|| get(ENV_CONVEX_SITE_URL));
        let jwks_json = get(ENV_JWKS);
        let application_id = get(ENV_APPLICATION_ID);

        if strict {
            let mut missing = Vec::new();
            if issuer.is_none() {
                missing.push(format!("{} (or {})", ENV_AUTH_ISSUER, ENV_CONVEX_SITE_URL));
            }
            if jwks_json.is_none() {
                missing.push(ENV_JWKS.to_string());
            }
            if !missing.is_empty() {
                return Err(AuthError::MissingConfig(missing.join(", ")));
            }
        }

        let (jwks_json, dev_keys) = match jwks_json {
            Some(json) => (json, false),
            None => {
                warn!(
                    subsystem = "auth",
                    component = "config",
                    kid = DEV_KEY_ID,
                    "JWKS not set, using the development signing key"
                );
                (dev_jwks_json()?, true)
            }
        };
        let keys = KeySet::parse(&jwks_json)?;

        let providers = match issuer {
            Some(issuer) => vec![AuthProvider::custom_jwt(
                &issuer,
                &jwks_json,
                application_id,
            )],
            None => {
                warn!(
                    subsystem = "auth",
                    component = "config",
                    issuer = DEV_ISSUER,
                    alt_issuer = DEV_ALT_ISSUER,
                    "Auth issuer not set, accepting local development issuers"
                );
                vec![
                    AuthProvider::custom_jwt(DEV_ISSUER, &jwks_json, application_id.clone()),
                    AuthProvider::custom_jwt(DEV_ALT_ISSUER, &jwks_json, application_id),
                ]
            }
        };

        info!(
            subsystem = "auth",
            component = "config",
            provider_count = providers.len(),
            key_count = keys.len(),
            strict,
            "Auth providers configured"
        );

        Ok(Self {
            providers,
            dev_keys,
            keys,
        })
    }

    pub fn issuers(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.issuer.as_str()).collect()
    }

    pub fn keys(&self) -> &KeySet {
        &self.keys
    }

    /// Build a token verifier over the configured providers.
    pub fn verifier(&self) -> JwtVerifier {
        JwtVerifier::new(self)
    }
}

/// Trim whitespace and trailing slashes so issuers compare stably.
pub fn normalize_issuer(issuer: &str) -> String {
    issuer.trim().trim_end_matches('/').to_string()
}

/// Deterministic development signing key.
///
/// Never use outside local development: the seed is public.
pub fn dev_signing_key() -> SigningKey {
    let seed: [u8; 32] = Sha256::digest(DEV_KEY_SEED).into();
    SigningKey::from_bytes(&seed)
}

/// JWKS JSON publishing the development key.
pub fn dev_jwks_json() -> Result<String> {
    let doc = JsonWebKeySet {
        keys: vec![Jwk::from_ed25519(
            &dev_signing_key().verifying_key(),
            DEV_KEY_ID,
        )],
    };
    serde_json::to_string(&doc).map_err(|e| AuthError::Encoding(e.to_string()))
}
