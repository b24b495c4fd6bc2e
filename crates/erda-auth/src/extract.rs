//! Access key id extraction.
//!
//! Runs before any secret lookup: it only finds the *claimed* access key id so
//! the caller can resolve the matching secret. Nothing is verified here.

use std::borrow::Cow;

use crate::ACCESS_KEY_FIELD;

/// Extract the claimed access key id from a request.
///
/// The `Authorization` header is scanned first for an `&`-delimited
/// `X-Erda-Ak=<id>` segment; failing that, the `X-Erda-Ak` query parameter
/// is used. Returns `None` if neither carries the field.
///
/// # Examples
///
/// ```
/// use erda_auth::extract::access_key_id;
///
/// let (parts, ()) = http::Request::builder()
///     .uri("/metrics")
///     .header("authorization", "X-Erda-Ak=AKID&X-Erda-Signature=abc")
///     .body(())
///     .unwrap()
///     .into_parts();
/// assert_eq!(access_key_id(&parts).as_deref(), Some("AKID"));
/// ```
#[must_use]
pub fn access_key_id(parts: &http::request::Parts) -> Option<String> {
    let from_header = parts
        .headers
        .get(http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|auth| {
            auth.split('&').find_map(|segment| {
                segment
                    .strip_prefix(ACCESS_KEY_FIELD)
                    .and_then(|rest| rest.strip_prefix('='))
            })
        });

    if let Some(ak) = from_header {
        return Some(ak.to_owned());
    }

    decoded_query_pairs(parts.uri.query().unwrap_or(""))
        .find(|(key, _)| *key == ACCESS_KEY_FIELD)
        .map(|(_, value)| value.into_owned())
}

/// Split a raw query into `(key, percent-decoded value)` pairs.
///
/// Segments without `=` yield an empty value.
pub(crate) fn decoded_query_pairs(query: &str) -> impl Iterator<Item = (&str, Cow<'_, str>)> {
    query
        .split('&')
        .filter(|s| !s.is_empty())
        .map(|param| {
            let (key, value) = param.split_once('=').unwrap_or((param, ""));
            (key, percent_encoding::percent_decode_str(value).decode_utf8_lossy())
        })
}
