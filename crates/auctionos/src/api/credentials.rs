use std::fmt;

/// Source of the bearer token attached to backend requests.
///
/// Request-issuing components receive a provider explicitly instead of reaching for a
/// process-wide token store, so tests can hand in a fake credential.
pub trait CredentialProvider: Send + Sync + fmt::Debug {
    fn bearer_token(&self) -> Result<Option<String>, CredentialError>;
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum CredentialError {
    #[error("no credential available: {0}")]
    Unavailable(String),
    #[error("credential contains characters that cannot be sent in a header")]
    InvalidHeader,
}

/// Anonymous access; no `Authorization` header is sent.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCredentials;

impl CredentialProvider for NoCredentials {
    fn bearer_token(&self) -> Result<Option<String>, CredentialError> {
        Ok(None)
    }
}

/// A fixed token, typically read once from configuration at startup.
#[derive(Clone)]
pub struct StaticCredentials {
    token: String,
}

impl StaticCredentials {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl fmt::Debug for StaticCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticCredentials")
            .field("token", &"<redacted>")
            .finish()
    }
}

impl CredentialProvider for StaticCredentials {
    fn bearer_token(&self) -> Result<Option<String>, CredentialError> {
        let token = self.token.trim();
        if token.is_empty() {
            return Err(CredentialError::Unavailable(
                "configured token is blank".to_string(),
            ));
        }
        Ok(Some(token.to_string()))
    }
}
