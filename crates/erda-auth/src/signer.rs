//! Request signing.
//!
//! A [`Signer`] renders the canonical request, computes
//! `hex(HMAC(SecretKey, CanonicalRequest))` and attaches the auth string
//!
//! ```text
//! X-Erda-Ak=<ak>&X-Erda-Signature=<hex>&X-Erda-Sign-Algorithm=<alg>[&X-Erda-Sign-Timestamp=<secs>]
//! ```
//!
//! either verbatim as the `Authorization` header or as individual query
//! parameters. The timestamp is frozen when the signer is built, so one signer
//! stamps every request it signs with the same moment.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use hmac::{Hmac, KeyInit, Mac};
use http::HeaderValue;
use http::uri::{PathAndQuery, Uri};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::Sha256;
use tracing::debug;
use typed_builder::TypedBuilder;

use crate::canonical::canonical_request_for;
use crate::error::AuthError;
use crate::pair::AkSkPair;
use crate::{ACCESS_KEY_FIELD, ALGORITHM_FIELD, SIGNATURE_FIELD, TIMESTAMP_FIELD};

type HmacSha1 = Hmac<Sha1>;
type HmacSha256 = Hmac<Sha256>;

/// Characters percent-encoded in auth values placed in the query string.
const QUERY_VALUE_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Keyed hash used to sign the canonical request.
///
/// `hmac-sha1` is the deployed wire protocol and stays the default.
/// `hmac-sha256` must be enabled on both ends; it is never negotiated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SignAlgorithm {
    /// HMAC-SHA1, wire name `hmac-sha1`.
    #[default]
    #[serde(rename = "hmac-sha1")]
    HmacSha1,
    /// HMAC-SHA256, wire name `hmac-sha256`.
    #[serde(rename = "hmac-sha256")]
    HmacSha256,
}

impl SignAlgorithm {
    /// The name carried in the `X-Erda-Sign-Algorithm` field.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::HmacSha1 => "hmac-sha1",
            Self::HmacSha256 => "hmac-sha256",
        }
    }

    /// Compute the lowercase hex HMAC of `data` keyed by `key`.
    ///
    /// # Examples
    ///
    /// ```
    /// use erda_auth::SignAlgorithm;
    ///
    /// assert_eq!(
    ///     SignAlgorithm::HmacSha1.sign(b"0O2Hn0TrTrRwrds1q0un0p9AvX4JB8V6", b"abc"),
    ///     "f91708d826817ce3b6b28add8a5914a3f1c7419f"
    /// );
    /// ```
    #[must_use]
    pub fn sign(self, key: &[u8], data: &[u8]) -> String {
        match self {
            Self::HmacSha1 => {
                let mut mac =
                    HmacSha1::new_from_slice(key).expect("HMAC can accept any key length");
                mac.update(data);
                hex::encode(mac.finalize().into_bytes())
            }
            Self::HmacSha256 => {
                let mut mac =
                    HmacSha256::new_from_slice(key).expect("HMAC can accept any key length");
                mac.update(data);
                hex::encode(mac.finalize().into_bytes())
            }
        }
    }
}

impl fmt::Display for SignAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignAlgorithm {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hmac-sha1" => Ok(Self::HmacSha1),
            "hmac-sha256" => Ok(Self::HmacSha256),
            other => Err(AuthError::UnsupportedAlgorithm(other.to_owned())),
        }
    }
}

/// Signing options.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use erda_auth::SignerConfig;
///
/// let config = SignerConfig::builder()
///     .timestamp(Utc.with_ymd_and_hms(2021, 5, 16, 0, 0, 0).unwrap())
///     .auth_in_query(true)
///     .build();
/// assert!(config.auth_in_query);
/// ```
#[derive(Debug, Clone, Default, TypedBuilder)]
pub struct SignerConfig {
    /// Moment to stamp requests with. `None` disables timestamping.
    #[builder(default, setter(strip_option))]
    pub timestamp: Option<DateTime<Utc>>,

    /// Place auth fields in the query string instead of the `Authorization` header.
    #[builder(default)]
    pub auth_in_query: bool,

    /// Keyed hash used for the signature.
    #[builder(default)]
    pub algorithm: SignAlgorithm,
}

impl SignerConfig {
    /// Configuration stamping requests with the current time.
    #[must_use]
    pub fn now() -> Self {
        Self::builder().timestamp(Utc::now()).build()
    }
}

/// Signs requests with one key pair. Immutable once built.
#[derive(Debug, Clone)]
pub struct Signer {
    pair: AkSkPair,
    timestamp: Option<String>,
    auth_in_query: bool,
    algorithm: SignAlgorithm,
}

impl Signer {
    /// Create a signer.
    ///
    /// The timestamp, if any, is truncated to whole Unix seconds here and
    /// reused for every request.
    #[must_use]
    pub fn new(pair: AkSkPair, config: SignerConfig) -> Self {
        Self {
            pair,
            timestamp: config.timestamp.map(|t| t.timestamp().to_string()),
            auth_in_query: config.auth_in_query,
            algorithm: config.algorithm,
        }
    }

    /// Signer pinned to a timestamp already expressed in Unix seconds.
    pub(crate) fn pinned(
        pair: AkSkPair,
        unix_seconds: Option<i64>,
        algorithm: SignAlgorithm,
    ) -> Self {
        Self {
            pair,
            timestamp: unix_seconds.map(|secs| secs.to_string()),
            auth_in_query: false,
            algorithm,
        }
    }

    /// The frozen Unix-seconds timestamp, if timestamping is enabled.
    #[must_use]
    pub fn timestamp(&self) -> Option<&str> {
        self.timestamp.as_deref()
    }

    /// The keyed hash in use.
    #[must_use]
    pub fn algorithm(&self) -> SignAlgorithm {
        self.algorithm
    }

    /// Compute the hex signature of an already-built sign string.
    #[must_use]
    pub fn signature(&self, sign_string: &str) -> String {
        self.algorithm
            .sign(self.pair.secret_key.as_bytes(), sign_string.as_bytes())
    }

    /// Build the canonical request string for `parts` under this signer's timestamp.
    #[must_use]
    pub fn sign_string(&self, parts: &http::request::Parts) -> String {
        canonical_request_for(parts, self.timestamp())
    }

    /// Ordered auth fields for the given signature.
    fn auth_fields(&self, signature: String) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            (ACCESS_KEY_FIELD, self.pair.access_key_id.clone()),
            (SIGNATURE_FIELD, signature),
            (ALGORITHM_FIELD, self.algorithm.as_str().to_owned()),
        ];
        if let Some(ts) = &self.timestamp {
            fields.push((TIMESTAMP_FIELD, ts.clone()));
        }
        fields
    }

    /// Build the `&`-joined auth string for `parts`.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::{TimeZone, Utc};
    /// use erda_auth::{AkSkPair, Signer, SignerConfig};
    ///
    /// let signer = Signer::new(
    ///     AkSkPair::new("IQ9E2Buhd8z2h7njPaxeGxq8", "0O2Hn0TrTrRwrds1q0un0p9AvX4JB8V6"),
    ///     SignerConfig::builder()
    ///         .timestamp(Utc.with_ymd_and_hms(2021, 5, 16, 0, 0, 0).unwrap())
    ///         .build(),
    /// );
    /// let (parts, ()) = http::Request::builder()
    ///     .uri("/users?page=1&pageNum=10")
    ///     .header("x-erda-sdk", "true")
    ///     .header("x-erda-version", "0.1.0")
    ///     .body(())
    ///     .unwrap()
    ///     .into_parts();
    ///
    /// assert_eq!(
    ///     signer.auth_string(&parts),
    ///     "X-Erda-Ak=IQ9E2Buhd8z2h7njPaxeGxq8\
    ///      &X-Erda-Signature=8b6e479c84d975023d6a554e1f252e7cb1efe1b2\
    ///      &X-Erda-Sign-Algorithm=hmac-sha1\
    ///      &X-Erda-Sign-Timestamp=1621123200"
    /// );
    /// ```
    #[must_use]
    pub fn auth_string(&self, parts: &http::request::Parts) -> String {
        let signature = self.signature(&self.sign_string(parts));
        join_fields(&self.auth_fields(signature))
    }

    /// Sign the request in place.
    ///
    /// With header placement the auth string becomes the `Authorization`
    /// header. With query placement each field is merged into the query
    /// string, replacing any parameter with the same key.
    pub fn sign_request(&self, parts: &mut http::request::Parts) -> Result<(), AuthError> {
        let sign_string = self.sign_string(parts);
        debug!(
            access_key_id = %self.pair.access_key_id,
            algorithm = %self.algorithm,
            sign_string,
            "Built sign string"
        );

        let fields = self.auth_fields(self.signature(&sign_string));

        if self.auth_in_query {
            parts.uri = merge_query(&parts.uri, &fields)?;
        } else {
            let value = HeaderValue::from_str(&join_fields(&fields))
                .map_err(|e| AuthError::InvalidHeaderValue(e.to_string()))?;
            parts.headers.insert(http::header::AUTHORIZATION, value);
        }

        Ok(())
    }
}

fn join_fields(fields: &[(&str, String)]) -> String {
    fields
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Merge auth fields into the query string of `uri`, overwriting colliding keys.
fn merge_query(uri: &Uri, fields: &[(&str, String)]) -> Result<Uri, AuthError> {
    let mut params: Vec<String> = uri
        .query()
        .unwrap_or("")
        .split('&')
        .filter(|param| !param.is_empty())
        .filter(|param| {
            let key = param.split_once('=').map_or(*param, |(k, _)| k);
            !fields.iter().any(|(field, _)| *field == key)
        })
        .map(ToOwned::to_owned)
        .collect();

    params.extend(
        fields
            .iter()
            .map(|(k, v)| format!("{k}={}", utf8_percent_encode(v, QUERY_VALUE_ENCODE_SET))),
    );

    let path_and_query = PathAndQuery::try_from(format!("{}?{}", uri.path(), params.join("&")))
        .map_err(|e| AuthError::InvalidUri(e.to_string()))?;

    let mut uri_parts = uri.clone().into_parts();
    uri_parts.path_and_query = Some(path_and_query);
    Uri::from_parts(uri_parts).map_err(|e| AuthError::InvalidUri(e.to_string()))
}
