//! JSON Web Key Set parsing for Ed25519 (`OKP`/`Ed25519`) keys.
//!
//! Only octet key pairs on Ed25519 are usable for verification. Other key
//! types are skipped with a warning so a mixed JWKS still loads.

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use ed25519_dalek::VerifyingKey;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{AuthError, Result};

/// Size of Ed25519 public keys in bytes.
pub const ED25519_PUBLIC_KEY_SIZE: usize = 32;

/// Prefix of the data URI form used when publishing a JWKS inline.
pub const JWKS_DATA_URI_PREFIX: &str = "data:text/plain;charset=utf-8;base64,";

/// A single JSON Web Key as it appears in a JWKS document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwk {
    pub kty: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crv: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,
    #[serde(default, rename = "use", skip_serializing_if = "Option::is_none")]
    pub key_use: Option<String>,
}

impl Jwk {
    /// Public JWK for an Ed25519 verifying key.
    pub fn from_ed25519(key: &VerifyingKey, kid: &str) -> Self {
        Self {
            kty: "OKP".to_string(),
            crv: Some("Ed25519".to_string()),
            x: Some(URL_SAFE_NO_PAD.encode(key.as_bytes())),
            kid: Some(kid.to_string()),
            alg: Some("EdDSA".to_string()),
            key_use: Some("sig".to_string()),
        }
    }

    fn to_verifying_key(&self) -> std::result::Result<VerifyingKey, String> {
        if self.kty != "OKP" || self.crv.as_deref() != Some("Ed25519") {
            return Err(format!(
                "unsupported key type {}/{}",
                self.kty,
                self.crv.as_deref().unwrap_or("-")
            ));
        }
        if self.key_use.as_deref().is_some_and(|u| u != "sig") {
            return Err("key is not a signing key".to_string());
        }
        let x = self.x.as_deref().ok_or("missing 'x' coordinate")?;
        let bytes = URL_SAFE_NO_PAD
            .decode(x.trim_end_matches('='))
            .map_err(|e| format!("invalid base64url 'x': {}", e))?;
        let array: [u8; ED25519_PUBLIC_KEY_SIZE] = bytes.try_into().map_err(|v: Vec<u8>| {
            format!(
                "Ed25519 public key must be {} bytes, got {}",
                ED25519_PUBLIC_KEY_SIZE,
                v.len()
            )
        })?;
        VerifyingKey::from_bytes(&array).map_err(|e| e.to_string())
    }
}

/// Raw JWKS document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonWebKeySet {
    pub keys: Vec<Jwk>,
}

/// Verification keys extracted from a JWKS.
#[derive(Debug, Clone, Default)]
pub struct KeySet {
    keys: Vec<(Option<String>, VerifyingKey)>,
}

impl KeySet {
    /// Parse a JWKS JSON document, keeping usable Ed25519 keys.
    pub fn parse(json: &str) -> Result<Self> {
        let doc: JsonWebKeySet =
            serde_json::from_str(json).map_err(|e| AuthError::InvalidJwks(e.to_string()))?;
        Self::from_document(&doc)
    }

    /// Build from an already-parsed JWKS document.
    pub fn from_document(doc: &JsonWebKeySet) -> Result<Self> {
        let mut keys = Vec::with_capacity(doc.keys.len());
        for jwk in &doc.keys {
            match jwk.to_verifying_key() {
                Ok(key) => keys.push((jwk.kid.clone(), key)),
                Err(reason) => warn!(
                    subsystem = "auth",
                    component = "jwks",
                    kid = jwk.kid.as_deref().unwrap_or("-"),
                    %reason,
                    "Skipping JWKS key"
                ),
            }
        }
        if keys.is_empty() {
            return Err(AuthError::NoUsableKeys);
        }
        Ok(Self { keys })
    }

    /// Select the key for a token's `kid`.
    ///
    /// A token without `kid` only resolves when the set holds exactly one key.
    pub fn select(&self, kid: Option<&str>) -> Option<&VerifyingKey> {
        match kid {
            Some(kid) => self
                .keys
                .iter()
                .find(|(k, _)| k.as_deref() == Some(kid))
                .map(|(_, key)| key),
            None if self.keys.len() == 1 => Some(&self.keys[0].1),
            None => None,
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Encode a JWKS JSON string as a `data:` URI.
pub fn to_data_uri(jwks_json: &str) -> String {
    format!("{}{}", JWKS_DATA_URI_PREFIX, STANDARD.encode(jwks_json.as_bytes()))
}

/// Decode a `data:` URI produced by [`to_data_uri`] back to JSON text.
pub fn from_data_uri(uri: &str) -> Result<String> {
    let encoded = uri
        .strip_prefix(JWKS_DATA_URI_PREFIX)
        .ok_or_else(|| AuthError::InvalidJwks("not a base64 data URI".to_string()))?;
    let bytes = STANDARD
        .decode(encoded)
        .map_err(|e| AuthError::InvalidJwks(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| AuthError::InvalidJwks(e.to_string()))
}
