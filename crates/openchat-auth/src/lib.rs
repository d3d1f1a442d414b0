//! # openchat-auth
//!
//! Authentication context for OpenChat.
//!
//! - **Provider configuration**: [`AuthConfig`] turns `AUTH_ISSUER` /
//!   `CONVEX_SITE_URL`, `JWKS` and `AUTH_APPLICATION_ID` into a list of
//!   `customJwt` providers, with development fallbacks and a strict mode.
//! - **Session validation**: [`JwtVerifier`] checks EdDSA-signed compact JWS
//!   tokens against those providers and yields the caller's [`Claims`].
//! - **Development tokens**: [`sign_eddsa`] with [`dev_signing_key`] mints
//!   tokens accepted by a development server (see the `openchat-dev-token`
//!   binary).
//!
//! ## Example
//!
//! ```rust
//! use openchat_auth::{dev_signing_key, sign_eddsa, AuthConfig, Claims, DEV_ISSUER, DEV_KEY_ID};
//!
//! let config = AuthConfig::from_lookup(|_| None, false).unwrap();
//! let token = sign_eddsa(
//!     &Claims::new("user-1", DEV_ISSUER, 3600),
//!     &dev_signing_key(),
//!     Some(DEV_KEY_ID),
//! )
//! .unwrap();
//! let claims = config.verifier().verify(&token).unwrap();
//! assert_eq!(claims.sub, "user-1");
//! ```

pub mod config;
pub mod error;
pub mod jwks;
pub mod jwt;

pub use config::{
    dev_jwks_json, dev_signing_key, normalize_issuer, AuthConfig, AuthProvider, ALGORITHM,
    DEV_ALT_ISSUER, DEV_ISSUER, DEV_KEY_ID,
};
pub use error::{AuthError, Result};
pub use jwks::{Jwk, JsonWebKeySet, KeySet};
pub use jwt::{sign_eddsa, Audience, Claims, Header, JwtVerifier, DEFAULT_LEEWAY_SECS};
