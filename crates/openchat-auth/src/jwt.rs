//! Compact JWS (EdDSA) token signing and verification.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use ed25519_dalek::{Signature, Signer, SigningKey};
use serde::{Deserialize, Serialize};

use crate::config::{normalize_issuer, AuthConfig, ALGORITHM};
use crate::error::{AuthError, Result};
use crate::jwks::KeySet;

/// Clock skew tolerated on `exp` and `nbf`, in seconds.
pub const DEFAULT_LEEWAY_SECS: i64 = 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub alg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
}

/// `aud` may be a single string or an array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    One(String),
    Many(Vec<String>),
}

impl Audience {
    pub fn contains(&self, value: &str) -> bool {
        match self {
            Audience::One(a) => a == value,
            Audience::Many(list) => list.iter().any(|a| a == value),
        }
    }
}

/// Registered claims plus the profile fields the session endpoint reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default)]
    pub sub: String,
    #[serde(default)]
    pub iss: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<Audience>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Claims {
    /// Claims for `sub` issued now and valid for `ttl_secs`.
    pub fn new(sub: &str, issuer: &str, ttl_secs: i64) -> Self {
        let now = Utc::now().timestamp();
        Self {
            sub: sub.to_string(),
            iss: normalize_issuer(issuer),
            aud: None,
            exp: Some(now + ttl_secs),
            iat: Some(now),
            nbf: None,
            email: None,
            name: None,
        }
    }
}

#[derive(Debug, Clone)]
struct TrustedIssuer {
    issuer: String,
    application_id: Option<String>,
}

/// Validates bearer tokens against the configured providers.
#[derive(Debug, Clone)]
pub struct JwtVerifier {
    issuers: Vec<TrustedIssuer>,
    keys: KeySet,
    leeway_secs: i64,
}

impl JwtVerifier {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            issuers: config
                .providers
                .iter()
                .map(|p| TrustedIssuer {
                    issuer: p.issuer.clone(),
                    application_id: p.application_id.clone(),
                })
                .collect(),
            keys: config.keys().clone(),
            leeway_secs: DEFAULT_LEEWAY_SECS,
        }
    }

    pub fn with_leeway(mut self, leeway_secs: i64) -> Self {
        self.leeway_secs = leeway_secs;
        self
    }

    /// Verify a token against the current time.
    pub fn verify(&self, token: &str) -> Result<Claims> {
        self.verify_at(token, Utc::now().timestamp())
    }

    /// Verify a token as of `now` (seconds since the epoch).
    pub fn verify_at(&self, token: &str, now: i64) -> Result<Claims> {
        let mut parts = token.split('.');
        let (header_b64, payload_b64, sig_b64) =
            match (parts.next(), parts.next(), parts.next(), parts.next()) {
                (Some(h), Some(p), Some(s), None) => (h, p, s),
                _ => {
                    return Err(AuthError::MalformedToken(
                        "expected three dot-separated segments".to_string(),
                    ))
                }
            };

        let header: Header = decode_segment(header_b64, "header")?;
        if header.alg != ALGORITHM {
            return Err(AuthError::UnsupportedAlgorithm(header.alg));
        }
        let claims: Claims = decode_segment(payload_b64, "payload")?;

        let issuer = normalize_issuer(&claims.iss);
        let trusted = self
            .issuers
            .iter()
            .find(|t| t.issuer == issuer)
            .ok_or_else(|| AuthError::UnknownIssuer(claims.iss.clone()))?;

        let key = self
            .keys
            .select(header.kid.as_deref())
            .ok_or_else(|| AuthError::UnknownKey(header.kid.clone().unwrap_or_default()))?;

        let sig_bytes = URL_SAFE_NO_PAD
            .decode(sig_b64)
            .map_err(|e| AuthError::MalformedToken(format!("signature: {}", e)))?;
        let signature = Signature::from_slice(&sig_bytes)
            .map_err(|e| AuthError::MalformedToken(format!("signature: {}", e)))?;
        let signing_input = &token[..header_b64.len() + 1 + payload_b64.len()];
        key.verify_strict(signing_input.as_bytes(), &signature)
            .map_err(|_| AuthError::InvalidSignature)?;

        match claims.exp {
            Some(exp) if exp + self.leeway_secs < now => return Err(AuthError::Expired),
            Some(_) => {}
            None => return Err(AuthError::MalformedToken("missing exp".to_string())),
        }
        if let Some(nbf) = claims.nbf {
            if nbf - self.leeway_secs > now {
                return Err(AuthError::NotYetValid);
            }
        }

        if let Some(app_id) = &trusted.application_id {
            if !claims.aud.as_ref().is_some_and(|aud| aud.contains(app_id)) {
                return Err(AuthError::InvalidAudience);
            }
        }

        if claims.sub.trim().is_empty() {
            return Err(AuthError::MissingSubject);
        }

        Ok(claims)
    }
}

fn decode_segment<T: serde::de::DeserializeOwned>(segment: &str, what: &str) -> Result<T> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|e| AuthError::MalformedToken(format!("{}: {}", what, e)))?;
    serde_json::from_slice(&bytes).map_err(|e| AuthError::MalformedToken(format!("{}: {}", what, e)))
}

fn encode_segment<T: Serialize>(value: &T) -> Result<String> {
    let json = serde_json::to_vec(value).map_err(|e| AuthError::Encoding(e.to_string()))?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

/// Sign `claims` as a compact EdDSA JWS.
pub fn sign_eddsa(claims: &Claims, key: &SigningKey, kid: Option<&str>) -> Result<String> {
    let header = Header {
        alg: ALGORITHM.to_string(),
        typ: Some("JWT".to_string()),
        kid: kid.map(str::to_string),
    };
    let signing_input = format!("{}.{}", encode_segment(&header)?, encode_segment(claims)?);
    let signature = key.sign(signing_input.as_bytes());
    Ok(format!(
        "{}.{}",
        signing_input,
        URL_SAFE_NO_PAD.encode(signature.to_bytes())
    ))
}
