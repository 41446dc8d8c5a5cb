//! Secret key lookup by access key ID.

use std::collections::HashMap;

use crate::error::AuthError;

/// Resolves the secret access key that belongs to an access key ID.
pub trait CredentialProvider: Send + Sync {
    /// Look up the secret key.
    ///
    /// Fails with [`AuthError::SecretNotFound`] for unknown access keys.
    fn get_secret_key(&self, access_key_id: &str) -> Result<String, AuthError>;
}

/// A fixed set of credentials held in memory.
///
/// # Examples
///
/// ```
/// use s3gate_auth::credentials::{CredentialProvider, StaticCredentialProvider};
///
/// let provider = StaticCredentialProvider::single("test", "secret");
/// assert_eq!(provider.get_secret_key("test").unwrap(), "secret");
/// assert!(provider.get_secret_key("other").is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticCredentialProvider {
    credentials: HashMap<String, String>,
}

impl StaticCredentialProvider {
    /// Build from `(access_key_id, secret_key)` pairs.
    pub fn new(credentials: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            credentials: credentials.into_iter().collect(),
        }
    }

    /// A provider that knows exactly one key pair.
    #[must_use]
    pub fn single(access_key_id: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self::new([(access_key_id.into(), secret_key.into())])
    }

    /// Number of known access keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    /// True when no credentials are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }
}

impl CredentialProvider for StaticCredentialProvider {
    fn get_secret_key(&self, access_key_id: &str) -> Result<String, AuthError> {
        self.credentials
            .get(access_key_id)
            .cloned()
            .ok_or_else(|| AuthError::SecretNotFound(access_key_id.to_owned()))
    }
}
