//! Access key / secret key pair.

use std::fmt;

/// An access key id and its paired secret key.
///
/// The access key id is transmitted in clear; the secret key is only ever used
/// as an HMAC key. Both must be non-empty for signing or verification to mean
/// anything, which is the credential store's responsibility.
///
/// The `Debug` output redacts the secret key so the pair can be traced safely.
#[derive(Clone, PartialEq, Eq)]
pub struct AkSkPair {
    /// Public identifier of the key.
    pub access_key_id: String,
    /// Shared secret used as the HMAC key.
    pub secret_key: String,
}

impl AkSkPair {
    /// Create a new pair.
    pub fn new(access_key_id: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_key: secret_key.into(),
        }
    }

    /// Whether both halves of the pair are non-empty.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.access_key_id.is_empty() && !self.secret_key.is_empty()
    }
}

impl fmt::Debug for AkSkPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AkSkPair")
            .field("access_key_id", &self.access_key_id)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}
