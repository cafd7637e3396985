use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::{Method, RequestBuilder, Response};
use serde::Deserialize;

use super::{CredentialError, CredentialProvider, TransportError};

/// Base URL, HTTP client, and credential source shared by every backend caller.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
    credentials: Arc<dyn CredentialProvider>,
}

impl ApiClient {
    pub fn new(
        base_url: impl Into<String>,
        credentials: Arc<dyn CredentialProvider>,
        request_timeout: Duration,
    ) -> Result<Self, TransportError> {
        let base_url = base_url.into();
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|err| TransportError::Network {
                url: base_url.clone(),
                message: format!("unable to build HTTP client: {err}"),
            })?;
        Ok(Self::with_client(base_url, http, credentials))
    }

    pub fn with_client(
        base_url: impl Into<String>,
        http: reqwest::Client,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            http,
            credentials,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Start a request carrying the bearer token, if the provider has one.
    pub(crate) fn request(
        &self,
        method: Method,
        url: &str,
    ) -> Result<RequestBuilder, TransportError> {
        let builder = self.http.request(method, url);
        match self.credentials.bearer_token()? {
            Some(token) => {
                let value = HeaderValue::from_str(&format!("Bearer {token}"))
                    .map_err(|_| CredentialError::InvalidHeader)?;
                Ok(builder.header(AUTHORIZATION, value))
            }
            None => Ok(builder),
        }
    }

    pub(crate) async fn send(
        &self,
        url: &str,
        builder: RequestBuilder,
    ) -> Result<Response, TransportError> {
        let response = builder
            .send()
            .await
            .map_err(|err| TransportError::Network {
                url: url.to_string(),
                message: err.to_string(),
            })?;
        ensure_success(url, response).await
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<serde_json::Value>,
}

/// Turn a non-success response into [`TransportError::Status`], keeping any `detail`.
async fn ensure_success(url: &str, response: Response) -> Result<Response, TransportError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(TransportError::Status {
        url: url.to_string(),
        status: status.as_u16(),
        detail: extract_detail(&body),
    })
}

fn extract_detail(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    match serde_json::from_str::<ErrorBody>(trimmed) {
        Ok(ErrorBody {
            detail: Some(serde_json::Value::String(detail)),
        }) => Some(detail),
        Ok(ErrorBody {
            detail: Some(other),
        }) => Some(other.to_string()),
        Ok(ErrorBody { detail: None }) => None,
        Err(_) => Some(trimmed.to_string()),
    }
}
