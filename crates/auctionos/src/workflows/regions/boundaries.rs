use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use super::domain::BoundaryFeature;

const COUNTIES_OBJECT: &str = "counties";

#[derive(Debug, thiserror::Error)]
pub enum BoundaryError {
    #[error("boundary dataset is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported boundary dataset type '{0}' (expected Topology or FeatureCollection)")]
    UnsupportedFormat(String),
    #[error("topology has no '{0}' object")]
    MissingObject(String),
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("unable to read boundary file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("request for boundary dataset at {url} failed: {message}")]
    Http { url: String, message: String },
    #[error("boundary dataset at {url} returned status {status}")]
    Status { url: String, status: u16 },
    #[error(transparent)]
    Parse(#[from] BoundaryError),
}

#[derive(Debug, Deserialize)]
struct Document {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    objects: serde_json::Map<String, Value>,
    #[serde(default)]
    features: Vec<RawFeature>,
}

#[derive(Debug, Deserialize)]
struct GeometryCollection {
    #[serde(default)]
    geometries: Vec<RawFeature>,
}

#[derive(Debug, Deserialize)]
struct RawFeature {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    properties: Option<RawProperties>,
}

#[derive(Debug, Deserialize)]
struct RawProperties {
    #[serde(default)]
    name: Option<String>,
}

impl RawFeature {
    fn into_feature(self) -> Option<BoundaryFeature> {
        let boundary_id = match self.id? {
            Value::String(id) if !id.trim().is_empty() => id.trim().to_string(),
            Value::Number(id) => id.to_string(),
            _ => return None,
        };
        let display_name = self
            .properties?
            .name
            .filter(|name| !name.trim().is_empty())?;
        Some(BoundaryFeature::new(boundary_id, display_name))
    }
}

/// Parse a us-atlas style TopoJSON topology (`objects.counties`) or a GeoJSON
/// `FeatureCollection`. Only ids and names are read; geometry is left to the renderer.
pub fn parse_boundaries(bytes: &[u8]) -> Result<Vec<BoundaryFeature>, BoundaryError> {
    let mut document: Document = serde_json::from_slice(bytes)?;
    let raw = match document.kind.as_str() {
        "Topology" => {
            let counties = document
                .objects
                .remove(COUNTIES_OBJECT)
                .ok_or_else(|| BoundaryError::MissingObject(COUNTIES_OBJECT.to_string()))?;
            serde_json::from_value::<GeometryCollection>(counties)?.geometries
        }
        "FeatureCollection" => document.features,
        other => return Err(BoundaryError::UnsupportedFormat(other.to_string())),
    };

    let total = raw.len();
    let features: Vec<BoundaryFeature> = raw
        .into_iter()
        .filter_map(RawFeature::into_feature)
        .collect();
    if features.len() < total {
        debug!(
            skipped = total - features.len(),
            "boundary features without an id or name were skipped"
        );
    }
    Ok(features)
}

/// Where the boundary dataset comes from.
#[async_trait]
pub trait BoundarySource: Send + Sync + fmt::Debug {
    fn location(&self) -> String;

    async fn fetch(&self) -> Result<Vec<u8>, CatalogError>;
}

#[derive(Debug, Clone)]
pub struct FileBoundarySource {
    path: PathBuf,
}

impl FileBoundarySource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl BoundarySource for FileBoundarySource {
    fn location(&self) -> String {
        self.path.display().to_string()
    }

    async fn fetch(&self) -> Result<Vec<u8>, CatalogError> {
        tokio::fs::read(&self.path)
            .await
            .map_err(|source| CatalogError::Io {
                path: self.path.clone(),
                source,
            })
    }
}

/// Fetches a public dataset; no credentials are attached.
#[derive(Debug, Clone)]
pub struct HttpBoundarySource {
    url: String,
    http: reqwest::Client,
}

impl HttpBoundarySource {
    pub fn new(url: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            url: url.into(),
            http,
        }
    }
}

#[async_trait]
impl BoundarySource for HttpBoundarySource {
    fn location(&self) -> String {
        self.url.clone()
    }

    async fn fetch(&self) -> Result<Vec<u8>, CatalogError> {
        let http_error = |err: reqwest::Error| CatalogError::Http {
            url: self.url.clone(),
            message: err.to_string(),
        };
        let response = self.http.get(&self.url).send().await.map_err(http_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Status {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }
        let body = response.bytes().await.map_err(http_error)?;
        Ok(body.to_vec())
    }
}

/// Picks the HTTP source for `http://`/`https://` locations, the file source otherwise.
pub fn source_for(location: &str, http: reqwest::Client) -> Arc<dyn BoundarySource> {
    let trimmed = location.trim();
    let lowered = trimmed.to_ascii_lowercase();
    if lowered.starts_with("http://") || lowered.starts_with("https://") {
        Arc::new(HttpBoundarySource::new(trimmed, http))
    } else {
        Arc::new(FileBoundarySource::new(trimmed))
    }
}

/// Session cache of the boundary dataset. The first successful load is kept; concurrent
/// first callers share one fetch, and a failed load is retried by the next caller.
#[derive(Debug)]
pub struct BoundaryCatalog {
    source: Arc<dyn BoundarySource>,
    features: OnceCell<Arc<[BoundaryFeature]>>,
}

impl BoundaryCatalog {
    pub fn new(source: Arc<dyn BoundarySource>) -> Self {
        Self {
            source,
            features: OnceCell::new(),
        }
    }

    /// Catalog over [`source_for`] with its own HTTP client.
    pub fn from_location(location: &str, request_timeout: Duration) -> Result<Self, CatalogError> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|err| CatalogError::Http {
                url: location.to_string(),
                message: format!("unable to build HTTP client: {err}"),
            })?;
        Ok(Self::new(source_for(location, http)))
    }

    /// A catalog that never fetches.
    pub fn preloaded(source: Arc<dyn BoundarySource>, features: Vec<BoundaryFeature>) -> Self {
        Self {
            source,
            features: OnceCell::new_with(Some(features.into())),
        }
    }

    pub fn location(&self) -> String {
        self.source.location()
    }

    pub fn is_loaded(&self) -> bool {
        self.features.initialized()
    }

    pub async fn features(&self) -> Result<Arc<[BoundaryFeature]>, CatalogError> {
        let features = self
            .features
            .get_or_try_init(|| async {
                let location = self.source.location();
                debug!(%location, "loading boundary dataset");
                let bytes = self.source.fetch().await?;
                let features = parse_boundaries(&bytes)?;
                info!(%location, features = features.len(), "boundary dataset loaded");
                Ok::<_, CatalogError>(Arc::from(features))
            })
            .await?;
        Ok(Arc::clone(features))
    }
}
