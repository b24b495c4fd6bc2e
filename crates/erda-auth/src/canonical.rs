//! Canonical request construction.
//!
//! Signer and validator must render semantically equal requests to the same
//! bytes. The canonical request is five newline-separated segments:
//!
//! ```text
//! HTTPRequestMethod\n
//! Timestamp\n
//! Path\n
//! CanonicalQueryString\n
//! CanonicalHeaders
//! ```
//!
//! The timestamp line is always present and empty when timestamping is off.
//! The query segment holds every parameter *outside* the `X-Erda-` namespace,
//! since those carry the signature itself. The header segment holds *only*
//! `X-Erda-` headers, so proxies rewriting ordinary headers do not break
//! signatures. Both segments are sorted as whole `key=value` strings.
//! Nothing is percent-decoded or re-encoded.

use http::HeaderMap;

use crate::RESERVED_PREFIX;

/// Build the canonical request string from its components.
///
/// # Examples
///
/// ```
/// use erda_auth::canonical::build_canonical_request;
///
/// let mut headers = http::HeaderMap::new();
/// headers.insert("x-erda-version", "0.1.0".parse().unwrap());
/// headers.insert("x-erda-sdk", "true".parse().unwrap());
///
/// let canonical = build_canonical_request("GET", None, "/users", "pageNum=10&page=1", &headers);
/// assert_eq!(
///     canonical,
///     "GET\n\n/users\npage=1&pageNum=10\nX-Erda-Sdk=true&X-Erda-Version=0.1.0"
/// );
/// ```
#[must_use]
pub fn build_canonical_request(
    method: &str,
    timestamp: Option<&str>,
    path: &str,
    query: &str,
    headers: &HeaderMap,
) -> String {
    let method = method.to_ascii_uppercase();
    let timestamp = timestamp.unwrap_or_default();
    let canonical_query = build_canonical_query_string(query);
    let canonical_headers = build_canonical_headers(headers);

    format!("{method}\n{timestamp}\n{path}\n{canonical_query}\n{canonical_headers}")
}

/// Build the canonical request string for a request.
#[must_use]
pub fn canonical_request_for(parts: &http::request::Parts, timestamp: Option<&str>) -> String {
    build_canonical_request(
        parts.method.as_str(),
        timestamp,
        parts.uri.path(),
        parts.uri.query().unwrap_or(""),
        &parts.headers,
    )
}

/// Build the canonical query string from a raw query.
///
/// Parameters in the `X-Erda-` namespace are dropped. A parameter without `=`
/// contributes `key=`. The remaining pairs are sorted as whole strings, so
/// duplicate keys end up ordered by value.
///
/// # Examples
///
/// ```
/// use erda_auth::canonical::build_canonical_query_string;
///
/// assert_eq!(build_canonical_query_string(""), "");
/// assert_eq!(
///     build_canonical_query_string("b=2&X-Erda-Ak=key&a=1"),
///     "a=1&b=2"
/// );
/// ```
#[must_use]
pub fn build_canonical_query_string(query: &str) -> String {
    if query.is_empty() {
        return String::new();
    }

    let mut pairs: Vec<String> = query
        .split('&')
        .filter(|s| !s.is_empty())
        .map(|param| param.split_once('=').unwrap_or((param, "")))
        .filter(|(key, _)| !key.starts_with(RESERVED_PREFIX))
        .map(|(key, value)| format!("{key}={value}"))
        .collect();

    pairs.sort_unstable();
    pairs.join("&")
}

/// Build the canonical header string.
///
/// Header names are rendered in MIME canonical form (`x-erda-sdk` becomes
/// `X-Erda-Sdk`) and only `X-Erda-` headers are kept. Every value of a
/// repeated header yields its own pair.
#[must_use]
pub fn build_canonical_headers(headers: &HeaderMap) -> String {
    let mut pairs: Vec<String> = headers
        .iter()
        .filter_map(|(name, value)| {
            let name = canonical_header_name(name.as_str());
            name.starts_with(RESERVED_PREFIX).then(|| {
                let value = String::from_utf8_lossy(value.as_bytes());
                format!("{name}={value}")
            })
        })
        .collect();

    pairs.sort_unstable();
    pairs.join("&")
}

/// Render a header name in MIME canonical form.
///
/// The first letter and every letter following a hyphen are upper-cased, all
/// other letters are lower-cased.
///
/// # Examples
///
/// ```
/// use erda_auth::canonical::canonical_header_name;
///
/// assert_eq!(canonical_header_name("x-erda-sign-timestamp"), "X-Erda-Sign-Timestamp");
/// assert_eq!(canonical_header_name("CONTENT-TYPE"), "Content-Type");
/// ```
#[must_use]
pub fn canonical_header_name(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    let mut upper = true;
    for ch in name.chars() {
        if upper {
            result.push(ch.to_ascii_uppercase());
        } else {
            result.push(ch.to_ascii_lowercase());
        }
        upper = ch == '-';
    }
    result
}
