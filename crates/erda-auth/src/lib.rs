//! HMAC access-key/secret-key request signing and verification for Erda.
//!
//! Machine clients (collector agents, service-to-service callers) sign every
//! request with a shared secret. The signature covers a canonical rendering of
//! the request: method, optional timestamp, path, the ordinary query
//! parameters and the `X-Erda-*` headers. The auth material travels either as
//! the `Authorization` header or as `X-Erda-*` query parameters:
//!
//! ```text
//! X-Erda-Ak=<ak>&X-Erda-Signature=<hex>&X-Erda-Sign-Algorithm=hmac-sha1[&X-Erda-Sign-Timestamp=<secs>]
//! ```
//!
//! # Usage
//!
//! ```rust
//! use erda_auth::{AkSkPair, Signer, SignerConfig, Validator, ValidatorConfig};
//!
//! let pair = AkSkPair::new("IQ9E2Buhd8z2h7njPaxeGxq8", "0O2Hn0TrTrRwrds1q0un0p9AvX4JB8V6");
//!
//! let (mut parts, ()) = http::Request::builder()
//!     .method("GET")
//!     .uri("http://collector.erda.cloud/users?page=1")
//!     .body(())
//!     .unwrap()
//!     .into_parts();
//!
//! let signer = Signer::new(pair.clone(), SignerConfig::default());
//! signer.sign_request(&mut parts).unwrap();
//!
//! let validator = Validator::new(pair, ValidatorConfig::default());
//! assert!(validator.verify(&parts).ok);
//! ```
//!
//! # Modules
//!
//! - [`canonical`] - Canonical request string construction
//! - [`signer`] - Signature computation and auth material placement
//! - [`validator`] - Signature and freshness verification
//! - [`extract`] - Access key id extraction ahead of secret lookup
//! - [`credentials`] - Credential provider trait and in-memory implementation
//! - [`authenticate`] - Server-side pipeline tying the pieces together
//! - [`config`] - Environment-driven configuration
//! - [`error`] - Error types

pub mod authenticate;
pub mod canonical;
pub mod config;
pub mod credentials;
pub mod error;
pub mod extract;
pub mod pair;
pub mod signer;
pub mod validator;

pub use authenticate::{AuthResult, authenticate};
pub use config::AuthConfig;
pub use credentials::{CredentialProvider, StaticCredentialProvider};
pub use error::AuthError;
pub use extract::access_key_id;
pub use pair::AkSkPair;
pub use signer::{SignAlgorithm, Signer, SignerConfig};
pub use validator::{Validator, ValidatorConfig, VerifyResult};

/// Prefix shared by every signing field and every signed custom header.
pub const RESERVED_PREFIX: &str = "X-Erda-";

/// Field carrying the access key id.
pub const ACCESS_KEY_FIELD: &str = "X-Erda-Ak";

/// Field carrying the hex-encoded signature.
pub const SIGNATURE_FIELD: &str = "X-Erda-Signature";

/// Field carrying the signing algorithm name.
pub const ALGORITHM_FIELD: &str = "X-Erda-Sign-Algorithm";

/// Field carrying the Unix-seconds signing timestamp.
pub const TIMESTAMP_FIELD: &str = "X-Erda-Sign-Timestamp";
