//! Process-level signing configuration.
//!
//! Provides [`AuthConfig`], loaded from environment variables, from which the
//! key pair, [`SignerConfig`] and [`ValidatorConfig`] are derived.

use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::pair::AkSkPair;
use crate::signer::{SignAlgorithm, SignerConfig};
use crate::validator::ValidatorConfig;

/// Signing and verification settings.
///
/// # Examples
///
/// ```
/// use erda_auth::AuthConfig;
///
/// let config = AuthConfig::default();
/// assert!(config.sign_timestamp);
/// assert_eq!(config.max_expire_secs, 600);
/// ```
#[derive(Clone, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct AuthConfig {
    /// Access key id used for signing.
    #[builder(default)]
    pub access_key_id: String,

    /// Secret key used for signing. Never serialized.
    #[builder(default)]
    #[serde(skip_serializing, default)]
    pub secret_key: String,

    /// Whether requests are timestamped.
    #[builder(default = true)]
    pub sign_timestamp: bool,

    /// Whether auth fields go in the query string instead of the `Authorization` header.
    #[builder(default = false)]
    pub auth_in_query: bool,

    /// Keyed hash used for signatures.
    #[builder(default)]
    pub algorithm: SignAlgorithm,

    /// Maximum accepted age of a signed timestamp, in seconds.
    #[builder(default = 600)]
    pub max_expire_secs: u64,

    /// Log level filter string (e.g. `"info"`, `"debug"`).
    #[builder(default = String::from("info"))]
    pub log_level: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            access_key_id: String::new(),
            secret_key: String::new(),
            sign_timestamp: true,
            auth_in_query: false,
            algorithm: SignAlgorithm::HmacSha1,
            max_expire_secs: 600,
            log_level: String::from("info"),
        }
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("access_key_id", &self.access_key_id)
            .field("secret_key", &"<redacted>")
            .field("sign_timestamp", &self.sign_timestamp)
            .field("auth_in_query", &self.auth_in_query)
            .field("algorithm", &self.algorithm)
            .field("max_expire_secs", &self.max_expire_secs)
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl AuthConfig {
    /// Load configuration from environment variables.
    ///
    /// Reads the following environment variables (falling back to defaults):
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `ERDA_ACCESS_KEY_ID` | *(empty)* |
    /// | `ERDA_SECRET_KEY` | *(empty)* |
    /// | `ERDA_SIGN_TIMESTAMP` | `true` |
    /// | `ERDA_AUTH_IN_QUERY` | `false` |
    /// | `ERDA_SIGN_ALGORITHM` | `hmac-sha1` |
    /// | `ERDA_SIGN_MAX_EXPIRE_SECS` | `600` |
    /// | `LOG_LEVEL` | `info` |
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("ERDA_ACCESS_KEY_ID") {
            config.access_key_id = v;
        }
        if let Ok(v) = std::env::var("ERDA_SECRET_KEY") {
            config.secret_key = v;
        }
        if let Ok(v) = std::env::var("ERDA_SIGN_TIMESTAMP") {
            config.sign_timestamp = parse_bool(&v);
        }
        if let Ok(v) = std::env::var("ERDA_AUTH_IN_QUERY") {
            config.auth_in_query = parse_bool(&v);
        }
        if let Ok(v) = std::env::var("ERDA_SIGN_ALGORITHM") {
            if let Ok(algorithm) = v.parse() {
                config.algorithm = algorithm;
            }
        }
        if let Ok(v) = std::env::var("ERDA_SIGN_MAX_EXPIRE_SECS") {
            if let Ok(n) = v.parse::<u64>() {
                config.max_expire_secs = n;
            }
        }
        if let Ok(v) = std::env::var("LOG_LEVEL") {
            config.log_level = v;
        }

        config
    }

    /// The configured key pair.
    #[must_use]
    pub fn pair(&self) -> AkSkPair {
        AkSkPair::new(self.access_key_id.clone(), self.secret_key.clone())
    }

    /// Signer options, stamping with the current time when timestamping is on.
    #[must_use]
    pub fn signer_config(&self) -> SignerConfig {
        SignerConfig {
            timestamp: self.sign_timestamp.then(Utc::now),
            auth_in_query: self.auth_in_query,
            algorithm: self.algorithm,
        }
    }

    /// Verification policy.
    #[must_use]
    pub fn validator_config(&self) -> ValidatorConfig {
        ValidatorConfig {
            max_expire: Duration::from_secs(self.max_expire_secs),
            algorithm: self.algorithm,
        }
    }
}

/// Parse a string as a boolean, accepting `"1"` and `"true"` (case-insensitive).
fn parse_bool(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}
