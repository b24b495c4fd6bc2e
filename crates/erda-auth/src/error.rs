//! Error types for AK/SK request authentication.
//!
//! Signature verification itself reports its outcome as a
//! [`VerifyResult`](crate::VerifyResult) value. [`AuthError`] covers attaching
//! auth material to a request, credential lookup, and the server-side
//! [`authenticate`](crate::authenticate()) pipeline.

/// Errors that can occur while signing or authenticating a request.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The auth string cannot be carried in the `Authorization` header.
    #[error("Invalid Authorization header value: {0}")]
    InvalidHeaderValue(String),

    /// The request URI could not be rebuilt with the auth query parameters.
    #[error("Invalid request URI: {0}")]
    InvalidUri(String),

    /// The signing algorithm is not recognized.
    #[error("Unsupported sign algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// Neither the `Authorization` header nor the query string carries an access key id.
    #[error("Missing access key id")]
    MissingAccessKey,

    /// The access key id was not found in the credential store.
    #[error("Access key not found: {0}")]
    AccessKeyNotFound(String),

    /// The credential store returned an empty secret for the access key.
    #[error("Empty secret key for access key: {0}")]
    EmptySecretKey(String),

    /// The signature is stale, malformed or does not match.
    ///
    /// Deliberately carries no detail; the diagnostic message is only logged.
    #[error("Signature verification failed")]
    VerificationFailed,
}
