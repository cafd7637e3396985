use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use crate::api::{ApiClient, CredentialProvider, NoCredentials, StaticCredentials, TransportError};
use crate::workflows::import::{UploadPolicy, WaitOptions};

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000/api/v1";
pub const DEFAULT_BOUNDARY_SOURCE: &str =
    "https://cdn.jsdelivr.net/npm/us-atlas@3/counties-10m.json";

/// Distinguishes runtime behavior for different stages of the tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the CLI and admin service.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub api: ApiConfig,
    pub import: ImportConfig,
    pub map: MapConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(&string_var("APP_ENV", "development"));

        let host = string_var("APP_HOST", "127.0.0.1");
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = string_var("APP_LOG_LEVEL", "info");

        let base_url = string_var("APP_API_URL", DEFAULT_API_URL);
        if base_url.trim().is_empty() {
            return Err(ConfigError::MissingApiUrl);
        }
        let token = env::var("APP_API_TOKEN")
            .ok()
            .filter(|token| !token.trim().is_empty());
        let request_timeout = Duration::from_secs(number_var("APP_HTTP_TIMEOUT_SECS", 30)?);

        let poll_interval_ms = number_var("APP_IMPORT_POLL_INTERVAL_MS", 2_000)?;
        let timeout_ms = number_var("APP_IMPORT_TIMEOUT_MS", 600_000)?;
        let accepted_extensions = string_var("APP_IMPORT_EXTENSIONS", "csv")
            .split(',')
            .map(str::to_string)
            .collect();

        let boundary_source = string_var("APP_BOUNDARY_SOURCE", DEFAULT_BOUNDARY_SOURCE);

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            api: ApiConfig {
                base_url,
                token,
                request_timeout,
            },
            import: ImportConfig {
                poll_interval_ms,
                timeout_ms,
                accepted_extensions,
            },
            map: MapConfig { boundary_source },
        })
    }
}

fn string_var(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn number_var(key: &'static str, default: u64) -> Result<u64, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidNumber { key, value: raw }),
        Err(_) => Ok(default),
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Where the admin backend lives and how to authenticate against it.
#[derive(Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub token: Option<String>,
    pub request_timeout: Duration,
}

impl ApiConfig {
    pub fn credentials(&self) -> Arc<dyn CredentialProvider> {
        match &self.token {
            Some(token) => Arc::new(StaticCredentials::new(token.clone())),
            None => Arc::new(NoCredentials),
        }
    }

    pub fn client(&self) -> Result<ApiClient, TransportError> {
        ApiClient::new(
            self.base_url.clone(),
            self.credentials(),
            self.request_timeout,
        )
    }
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct ImportConfig {
    pub poll_interval_ms: u64,
    pub timeout_ms: u64,
    pub accepted_extensions: Vec<String>,
}

impl ImportConfig {
    pub fn wait_options(&self) -> WaitOptions {
        WaitOptions::from_millis(self.poll_interval_ms, self.timeout_ms)
    }

    pub fn upload_policy(&self) -> UploadPolicy {
        UploadPolicy::new(&self.accepted_extensions)
    }
}

#[derive(Debug, Clone)]
pub struct MapConfig {
    /// URL (`http://`/`https://`) or file path of the county boundary dataset.
    pub boundary_source: String,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { key: &'static str, value: String },
    MissingApiUrl,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { key, value } => {
                write!(f, "{key} must be a non-negative integer (got '{value}')")
            }
            ConfigError::MissingApiUrl => write!(f, "APP_API_URL must not be empty"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidNumber { .. }
            | ConfigError::MissingApiUrl => None,
        }
    }
}
