use super::CredentialError;

/// Network or HTTP-level failure talking to the backend. Always safe to retry.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("request to {url} failed: {message}")]
    Network { url: String, message: String },
    #[error("{url} responded with HTTP {status}: {}", .detail.as_deref().unwrap_or("no detail provided"))]
    Status {
        url: String,
        status: u16,
        detail: Option<String>,
    },
    #[error("unexpected response from {url}: {message}")]
    Decode { url: String, message: String },
    #[error(transparent)]
    Credentials(#[from] CredentialError),
}

impl TransportError {
    /// Backend-supplied explanation, when the failure carried one.
    pub fn detail(&self) -> Option<&str> {
        match self {
            TransportError::Status { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
