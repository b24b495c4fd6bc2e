//! Server-side authentication pipeline.
//!
//! Ties the pieces together the way an ingestion endpoint's interceptor uses
//! them: extract the claimed access key id, resolve its secret through the
//! injected [`CredentialProvider`], then verify. Diagnostic detail is logged
//! here and never returned, so the resulting [`AuthError`] is safe to map
//! straight onto a `401` response.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::credentials::CredentialProvider;
use crate::error::AuthError;
use crate::extract::access_key_id;
use crate::validator::{Validator, ValidatorConfig, parse_signed_fields};
use crate::TIMESTAMP_FIELD;

/// The result of a successful authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthResult {
    /// The access key id that signed the request.
    pub access_key_id: String,
    /// The signing time, when the request was timestamped.
    pub timestamp: Option<DateTime<Utc>>,
}

/// Authenticate a signed request.
///
/// # Errors
///
/// Returns [`AuthError::MissingAccessKey`] when the request carries no access
/// key id, [`AuthError::AccessKeyNotFound`] or [`AuthError::EmptySecretKey`]
/// when the credential store cannot supply a usable secret, and
/// [`AuthError::VerificationFailed`] when the signature is stale or wrong.
pub fn authenticate(
    parts: &http::request::Parts,
    credential_provider: &dyn CredentialProvider,
    config: &ValidatorConfig,
) -> Result<AuthResult, AuthError> {
    authenticate_at(parts, credential_provider, config, Utc::now())
}

/// [`authenticate`] as of `now`.
pub fn authenticate_at(
    parts: &http::request::Parts,
    credential_provider: &dyn CredentialProvider,
    config: &ValidatorConfig,
    now: DateTime<Utc>,
) -> Result<AuthResult, AuthError> {
    let access_key_id = access_key_id(parts).ok_or(AuthError::MissingAccessKey)?;

    debug!(access_key_id = %access_key_id, "Authenticating signed request");

    let pair = credential_provider.get_pair(&access_key_id)?;
    if !pair.is_complete() {
        warn!(access_key_id = %access_key_id, "Refusing to verify against an empty secret key");
        return Err(AuthError::EmptySecretKey(access_key_id));
    }

    let result = Validator::new(pair, config.clone()).verify_at(parts, now);
    if !result.ok {
        warn!(
            access_key_id = %access_key_id,
            method = %parts.method,
            path = parts.uri.path(),
            reason = %result.message,
            "Signature verification failed"
        );
        return Err(AuthError::VerificationFailed);
    }

    let timestamp = parse_signed_fields(parts)
        .get(TIMESTAMP_FIELD)
        .and_then(|raw| raw.parse::<i64>().ok())
        .and_then(|secs| DateTime::from_timestamp(secs, 0));

    debug!(access_key_id = %access_key_id, "Request authenticated");

    Ok(AuthResult {
        access_key_id,
        timestamp,
    })
}
