//! Credential provider trait and implementations.
//!
//! The validator never looks secrets up itself: a [`CredentialProvider`] is
//! injected by the caller and resolves the access key id extracted from the
//! request to its secret key.

use std::collections::HashMap;

use crate::error::AuthError;
use crate::pair::AkSkPair;

/// Trait for looking up secret keys by access key id.
///
/// Implementations may back this with a database, a configuration file,
/// or a remote credential service.
pub trait CredentialProvider: Send + Sync {
    /// Retrieve the secret key for the given access key id.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::AccessKeyNotFound`] if the access key id is not recognized.
    fn get_secret_key(&self, access_key_id: &str) -> Result<String, AuthError>;

    /// Resolve the full key pair for the given access key id.
    fn get_pair(&self, access_key_id: &str) -> Result<AkSkPair, AuthError> {
        let secret_key = self.get_secret_key(access_key_id)?;
        Ok(AkSkPair::new(access_key_id, secret_key))
    }
}

/// A simple in-memory credential provider backed by a `HashMap`.
///
/// # Examples
///
/// ```
/// use erda_auth::credentials::{CredentialProvider, StaticCredentialProvider};
///
/// let provider = StaticCredentialProvider::new(vec![
///     ("IQ9E2Buhd8z2h7njPaxeGxq8".to_owned(), "0O2Hn0TrTrRwrds1q0un0p9AvX4JB8V6".to_owned()),
/// ]);
///
/// let secret = provider.get_secret_key("IQ9E2Buhd8z2h7njPaxeGxq8").unwrap();
/// assert_eq!(secret, "0O2Hn0TrTrRwrds1q0un0p9AvX4JB8V6");
/// ```
#[derive(Clone, Default)]
pub struct StaticCredentialProvider {
    credentials: HashMap<String, String>,
}

impl StaticCredentialProvider {
    /// Create a new `StaticCredentialProvider` from (access_key_id, secret_key) pairs.
    pub fn new(credentials: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            credentials: credentials.into_iter().collect(),
        }
    }
}

impl From<AkSkPair> for StaticCredentialProvider {
    fn from(pair: AkSkPair) -> Self {
        Self::new([(pair.access_key_id, pair.secret_key)])
    }
}

impl std::fmt::Debug for StaticCredentialProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticCredentialProvider")
            .field("access_key_ids", &self.credentials.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl CredentialProvider for StaticCredentialProvider {
    fn get_secret_key(&self, access_key_id: &str) -> Result<String, AuthError> {
        self.credentials
            .get(access_key_id)
            .cloned()
            .ok_or_else(|| AuthError::AccessKeyNotFound(access_key_id.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_return_secret_key_for_known_access_key() {
        let provider =
            StaticCredentialProvider::new(vec![("AKID".to_owned(), "secret".to_owned())]);

        let result = provider.get_secret_key("AKID");
        assert_eq!(result.unwrap(), "secret");
    }

    #[test]
    fn test_should_return_error_for_unknown_access_key() {
        let provider = StaticCredentialProvider::new(vec![]);

        let result = provider.get_secret_key("UNKNOWN");
        assert!(matches!(result, Err(AuthError::AccessKeyNotFound(_))));
    }

    #[test]
    fn test_should_resolve_pair_from_single_key_provider() {
        let provider = StaticCredentialProvider::from(AkSkPair::new("AKID", "secret"));

        let pair = provider.get_pair("AKID").unwrap();
        assert_eq!(pair, AkSkPair::new("AKID", "secret"));
    }

    #[test]
    fn test_should_not_leak_secrets_in_debug_output() {
        let provider = StaticCredentialProvider::from(AkSkPair::new("AKID", "hunter2"));
        let rendered = format!("{provider:?}");
        assert!(rendered.contains("AKID"));
        assert!(!rendered.contains("hunter2"));
    }
}
