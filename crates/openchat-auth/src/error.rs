//! Error types for auth configuration and token validation.

use thiserror::Error;

/// Result type alias for auth operations.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Auth configuration and token validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Required configuration variables are absent (strict mode).
    #[error("Missing required auth configuration: {0}")]
    MissingConfig(String),

    /// The JWKS document could not be parsed.
    #[error("Invalid JWKS: {0}")]
    InvalidJwks(String),

    /// The JWKS parsed but contains no Ed25519 verification key.
    #[error("JWKS contains no usable Ed25519 keys")]
    NoUsableKeys,

    /// Token is not a well-formed compact JWS.
    #[error("Malformed token: {0}")]
    MalformedToken(String),

    /// Token header names an algorithm other than EdDSA.
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// Token issuer does not match any configured provider.
    #[error("Unknown issuer: {0}")]
    UnknownIssuer(String),

    /// No key in the provider's JWKS matches the token's key id.
    #[error("Unknown signing key: {0}")]
    UnknownKey(String),

    /// Signature verification failed.
    #[error("Invalid signature")]
    InvalidSignature,

    /// Token `exp` is in the past.
    #[error("Token expired")]
    Expired,

    /// Token `nbf` is in the future.
    #[error("Token not yet valid")]
    NotYetValid,

    /// Token audience does not include the configured application id.
    #[error("Invalid audience")]
    InvalidAudience,

    /// Token has an empty or missing subject.
    #[error("Token has no subject")]
    MissingSubject,

    /// Token could not be produced.
    #[error("Token encoding failed: {0}")]
    Encoding(String),
}
