//! Read side of the property catalog: the admin listing endpoint the import flow refreshes
//! after a job finishes, and the source of the map's per-county counts.

use reqwest::Method;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::api::{ApiClient, TransportError};

const LISTING_PATH: &str = "admin/properties";

/// Filters accepted by the listing endpoint. Unset fields are left off the query string.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PropertyQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub county: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auction_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_amount_due: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_amount_due: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occupancy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_type: Option<String>,
}

impl PropertyQuery {
    pub fn page(skip: u32, limit: u32) -> Self {
        Self {
            skip: Some(skip),
            limit: Some(limit),
            ..Self::default()
        }
    }
}

/// One row of the listing. Columns the client does not interpret are kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyRecord {
    pub parcel_id: String,
    #[serde(default)]
    pub state_code: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub county: Option<String>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub amount_due: Option<f64>,
    #[serde(default)]
    pub auction_name: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl PropertyRecord {
    /// Two-letter state, from `state_code` or else `state`.
    pub fn state_code(&self) -> Option<&str> {
        non_blank(self.state_code.as_deref()).or_else(|| non_blank(self.state.as_deref()))
    }

    pub fn county(&self) -> Option<&str> {
        non_blank(self.county.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

/// Accepts numbers, numeric strings (`"$1,520.44"`) and null.
fn lenient_amount<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(number)) => Ok(number.as_f64()),
        Some(Value::String(raw)) => {
            let cleaned: String = raw
                .chars()
                .filter(|ch| !matches!(ch, '$' | ',' | ' '))
                .collect();
            if cleaned.is_empty() {
                return Ok(None);
            }
            cleaned
                .parse::<f64>()
                .map(Some)
                .map_err(|_| serde::de::Error::custom(format!("invalid amount_due '{raw}'")))
        }
        Some(other) => Err(serde::de::Error::custom(format!(
            "invalid amount_due {other}"
        ))),
    }
}

/// Client for `GET {api}/admin/properties`.
#[derive(Debug, Clone)]
pub struct PropertyCatalogClient {
    api: ApiClient,
}

impl PropertyCatalogClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn list(&self, query: &PropertyQuery) -> Result<Vec<PropertyRecord>, TransportError> {
        let url = self.api.url(LISTING_PATH);
        let request = self.api.request(Method::GET, &url)?.query(query);
        let response = self.api.send(&url, request).await?;
        let records: Vec<PropertyRecord> =
            response.json().await.map_err(|err| TransportError::Decode {
                url: url.clone(),
                message: err.to_string(),
            })?;
        debug!(%url, records = records.len(), "fetched property page");
        Ok(records)
    }

    /// Walk every page matching `filter` until the backend returns a short page.
    pub async fn list_all(
        &self,
        filter: &PropertyQuery,
        page_size: u32,
    ) -> Result<Vec<PropertyRecord>, TransportError> {
        let page_size = page_size.max(1);
        let mut skip = filter.skip.unwrap_or(0);
        let mut records = Vec::new();

        loop {
            let query = PropertyQuery {
                skip: Some(skip),
                limit: Some(page_size),
                ..filter.clone()
            };
            let page = self.list(&query).await?;
            let fetched = page.len();
            records.extend(page);
            if fetched < page_size as usize {
                return Ok(records);
            }
            skip = skip.saturating_add(page_size);
        }
    }
}
