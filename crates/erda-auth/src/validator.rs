//! Signature verification.
//!
//! Each [`Validator::verify`] call runs the same steps and keeps no state
//! between calls:
//!
//! 1. Parse the `X-Erda-*` fields from the `Authorization` header, or from the
//!    query string when the header carries no access key.
//! 2. Pin a signer to the request timestamp when one parses as an integer;
//!    otherwise sign without a timestamp.
//! 3. Reject requests older than the configured window before looking at the
//!    signature.
//! 4. Rebuild the canonical request, recompute the HMAC and compare it in
//!    constant time with `X-Erda-Signature`.
//!
//! Outcomes are values ([`VerifyResult`]), never errors. The failure message
//! may contain the locally computed signature and must only be logged.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use subtle::ConstantTimeEq;
use tracing::debug;
use typed_builder::TypedBuilder;

use crate::extract::decoded_query_pairs;
use crate::pair::AkSkPair;
use crate::signer::{SignAlgorithm, Signer};
use crate::{
    ACCESS_KEY_FIELD, ALGORITHM_FIELD, RESERVED_PREFIX, SIGNATURE_FIELD, TIMESTAMP_FIELD,
};

/// Default maximum age of a signed timestamp.
pub const DEFAULT_MAX_EXPIRE: Duration = Duration::from_secs(10 * 60);

/// Outcome of a verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyResult {
    /// Whether the request passed every check.
    pub ok: bool,
    /// Diagnostic detail. Server-side use only.
    pub message: String,
}

impl VerifyResult {
    fn success() -> Self {
        Self {
            ok: true,
            message: String::new(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
        }
    }
}

/// Verification policy.
#[derive(Debug, Clone, TypedBuilder)]
pub struct ValidatorConfig {
    /// Maximum accepted age of `X-Erda-Sign-Timestamp`.
    #[builder(default = DEFAULT_MAX_EXPIRE)]
    pub max_expire: Duration,

    /// The only algorithm this validator accepts.
    #[builder(default)]
    pub algorithm: SignAlgorithm,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            max_expire: DEFAULT_MAX_EXPIRE,
            algorithm: SignAlgorithm::default(),
        }
    }
}

/// Verifies signed requests against one key pair.
#[derive(Debug, Clone)]
pub struct Validator {
    pair: AkSkPair,
    max_expire: Duration,
    algorithm: SignAlgorithm,
}

impl Validator {
    /// Create a validator.
    #[must_use]
    pub fn new(pair: AkSkPair, config: ValidatorConfig) -> Self {
        Self {
            pair,
            max_expire: config.max_expire,
            algorithm: config.algorithm,
        }
    }

    /// Replace the expiry window.
    #[must_use]
    pub fn with_max_expire_interval(mut self, max_expire: Duration) -> Self {
        self.max_expire = max_expire;
        self
    }

    /// The configured expiry window.
    #[must_use]
    pub fn max_expire(&self) -> Duration {
        self.max_expire
    }

    /// Verify a request against the current time.
    #[must_use]
    pub fn verify(&self, parts: &http::request::Parts) -> VerifyResult {
        self.verify_at(parts, Utc::now())
    }

    /// Verify a request as of `now`.
    #[must_use]
    pub fn verify_at(&self, parts: &http::request::Parts, now: DateTime<Utc>) -> VerifyResult {
        let fields = parse_signed_fields(parts);

        if let Some(algorithm) = fields.get(ALGORITHM_FIELD) {
            if algorithm != self.algorithm.as_str() {
                return VerifyResult::failure(format!(
                    "unsupported sign algorithm {algorithm}, expected {}",
                    self.algorithm
                ));
            }
        }

        let request_timestamp = fields.get(TIMESTAMP_FIELD).and_then(|raw| {
            let parsed = raw.parse::<i64>().ok();
            if parsed.is_none() {
                debug!(timestamp = %raw, "Ignoring malformed sign timestamp");
            }
            parsed
        });

        if let Some(secs) = request_timestamp {
            if let Some(reason) = self.check_expiry(secs, now) {
                debug!(access_key_id = %self.pair.access_key_id, reason, "Request expired");
                return VerifyResult::failure(reason);
            }
        }

        let signer = Signer::pinned(self.pair.clone(), request_timestamp, self.algorithm);
        let sign_string = signer.sign_string(parts);
        debug!(sign_string, "Rebuilt sign string");

        let provided = fields.get(SIGNATURE_FIELD).map_or("", String::as_str);
        self.verify_sign_string(&sign_string, provided)
    }

    /// Compare the signature of `sign_string` with `expected` in constant time.
    #[must_use]
    pub fn verify_sign_string(&self, sign_string: &str, expected: &str) -> VerifyResult {
        let computed = self
            .algorithm
            .sign(self.pair.secret_key.as_bytes(), sign_string.as_bytes());

        if computed.as_bytes().ct_eq(expected.as_bytes()).into() {
            debug!(access_key_id = %self.pair.access_key_id, "Signature verification succeeded");
            VerifyResult::success()
        } else {
            debug!(
                access_key_id = %self.pair.access_key_id,
                computed = %computed,
                provided = %expected,
                "Signature mismatch"
            );
            VerifyResult::failure(format!("signature mismatch, computed signature {computed}"))
        }
    }

    /// Return a failure reason when `secs` lies further than the window behind `now`.
    fn check_expiry(&self, secs: i64, now: DateTime<Utc>) -> Option<String> {
        let Some(signed_at) = DateTime::from_timestamp(secs, 0) else {
            return Some(format!("request timestamp {secs} out of range"));
        };

        let window = TimeDelta::from_std(self.max_expire).unwrap_or(TimeDelta::MAX);
        let age = now.signed_duration_since(signed_at);
        (age > window).then(|| {
            format!(
                "request expired: signed at {signed_at}, now {now}, max expire {}s",
                self.max_expire.as_secs()
            )
        })
    }
}

/// Collect the `X-Erda-*` fields carried by a request.
///
/// The `Authorization` header is used when it mentions `X-Erda-Ak`; pairs
/// without `=` are skipped and a repeated key keeps its last value. Otherwise
/// the query string is used, values are percent-decoded and a repeated key
/// keeps its first value.
#[must_use]
pub fn parse_signed_fields(parts: &http::request::Parts) -> HashMap<String, String> {
    let auth = parts
        .headers
        .get(http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let mut fields = HashMap::new();

    if auth.contains(ACCESS_KEY_FIELD) {
        for (key, value) in auth.split('&').filter_map(|kv| kv.split_once('=')) {
            if key.starts_with(RESERVED_PREFIX) {
                fields.insert(key.to_owned(), value.to_owned());
            }
        }
    } else {
        for (key, value) in decoded_query_pairs(parts.uri.query().unwrap_or("")) {
            if key.starts_with(RESERVED_PREFIX) {
                fields
                    .entry(key.to_owned())
                    .or_insert_with(|| value.into_owned());
            }
        }
    }

    fields
}
