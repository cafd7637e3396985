use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Method;
use serde::Deserialize;
use tracing::debug;

use super::domain::{ImportKind, JobId};
use super::upload::ImportFile;
use crate::api::{ApiClient, TransportError};

/// What the backend returned when it accepted an upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitReceipt {
    pub job_id: JobId,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub status: String,
}

/// Backend boundary of the import pipeline.
#[async_trait]
pub trait ImportGateway: Send + Sync {
    async fn upload(
        &self,
        kind: ImportKind,
        file: ImportFile,
    ) -> Result<SubmitReceipt, TransportError>;

    async fn status(&self, job_id: &JobId) -> Result<StatusReport, TransportError>;
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    #[serde(default)]
    job_id: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    status: String,
}

/// [`ImportGateway`] speaking the admin backend's multipart/JSON protocol.
#[derive(Debug, Clone)]
pub struct HttpImportGateway {
    api: ApiClient,
}

impl HttpImportGateway {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl ImportGateway for HttpImportGateway {
    async fn upload(
        &self,
        kind: ImportKind,
        file: ImportFile,
    ) -> Result<SubmitReceipt, TransportError> {
        let url = self.api.url(kind.upload_path());
        let (file_name, bytes) = file.into_parts();
        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(mime::TEXT_CSV.essence_str())
            .map_err(|err| TransportError::Network {
                url: url.clone(),
                message: format!("unable to build multipart body: {err}"),
            })?;
        let form = Form::new().part("file", part);

        let request = self.api.request(Method::POST, &url)?.multipart(form);
        let response = self.api.send(&url, request).await?;
        let body: SubmitResponse = response.json().await.map_err(|err| TransportError::Decode {
            url: url.clone(),
            message: err.to_string(),
        })?;

        let job_id = body
            .job_id
            .as_deref()
            .and_then(JobId::parse)
            .ok_or_else(|| TransportError::Decode {
                url: url.clone(),
                message: "response did not include a job_id".to_string(),
            })?;
        debug!(%job_id, %url, "upload accepted");

        Ok(SubmitReceipt {
            job_id,
            status: body.status.unwrap_or_default(),
        })
    }

    async fn status(&self, job_id: &JobId) -> Result<StatusReport, TransportError> {
        let url = self
            .api
            .url(&format!("admin/import-status/{}", job_id.as_str()));
        let request = self.api.request(Method::GET, &url)?;
        let response = self.api.send(&url, request).await?;
        let body: StatusResponse = response.json().await.map_err(|err| TransportError::Decode {
            url: url.clone(),
            message: err.to_string(),
        })?;

        Ok(StatusReport {
            status: body.status,
        })
    }
}
