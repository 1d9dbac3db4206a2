/// Configuration management for the group name mapper
use crate::error::{GroupMapperError, MapperResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;

/// Default whole-mapping TTL (one hour)
pub const DEFAULT_CACHE_TTL_SECS: u64 = 3600;
/// Default per-request HTTP timeout
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Main mapper configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapperConfig {
    pub directory: DirectoryConfig,
    pub cache: CacheConfig,
    pub logging: LoggingConfig,
}

/// National cloud the tenant lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectoryCloud {
    #[default]
    Global,
    UsGovernment,
    China,
}

impl DirectoryCloud {
    /// Parse the `GUAC_ENTRA_CLOUD` value
    pub fn parse(value: &str) -> MapperResult<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "global" | "commercial" => Ok(DirectoryCloud::Global),
            "usgov" | "us_government" | "usgovernment" => Ok(DirectoryCloud::UsGovernment),
            "china" => Ok(DirectoryCloud::China),
            other => Err(GroupMapperError::Configuration(format!(
                "Unknown directory cloud: {}",
                other
            ))),
        }
    }

    pub fn login_endpoint(&self) -> &'static str {
        match self {
            DirectoryCloud::Global => "https://login.microsoftonline.com",
            DirectoryCloud::UsGovernment => "https://login.microsoftonline.us",
            DirectoryCloud::China => "https://login.chinacloudapi.cn",
        }
    }

    pub fn graph_endpoint(&self) -> &'static str {
        match self {
            DirectoryCloud::Global => "https://graph.microsoft.com",
            DirectoryCloud::UsGovernment => "https://graph.microsoft.us",
            DirectoryCloud::China => "https://microsoftgraph.chinacloudapi.cn",
        }
    }
}

/// Directory service credentials and endpoints
#[derive(Clone, Serialize, Deserialize)]
pub struct DirectoryConfig {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
    /// Token endpoint base, e.g. `https://login.microsoftonline.com`
    pub login_endpoint: String,
    /// Graph base, e.g. `https://graph.microsoft.com`
    pub graph_endpoint: String,
    pub request_timeout_secs: u64,
    pub user_agent: String,
}

impl fmt::Debug for DirectoryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectoryConfig")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("login_endpoint", &self.login_endpoint)
            .field("graph_endpoint", &self.graph_endpoint)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl DirectoryConfig {
    /// Credentials against the public cloud with default timeouts
    pub fn new(
        tenant_id: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        let cloud = DirectoryCloud::Global;
        Self {
            tenant_id: tenant_id.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            login_endpoint: cloud.login_endpoint().to_string(),
            graph_endpoint: cloud.graph_endpoint().to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            user_agent: default_user_agent(),
        }
    }

    /// Point both endpoints somewhere else (proxies, mock servers)
    pub fn with_endpoints(
        mut self,
        login_endpoint: impl Into<String>,
        graph_endpoint: impl Into<String>,
    ) -> Self {
        self.login_endpoint = login_endpoint.into();
        self.graph_endpoint = graph_endpoint.into();
        self
    }

    pub fn with_request_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = secs;
        self
    }

    /// `{login}/{tenant}/oauth2/v2.0/token`
    pub fn token_url(&self) -> String {
        format!(
            "{}/{}/oauth2/v2.0/token",
            self.login_endpoint.trim_end_matches('/'),
            self.tenant_id
        )
    }

    /// `{graph}/v1.0/groups`
    pub fn groups_url(&self) -> String {
        format!("{}/v1.0/groups", self.graph_endpoint.trim_end_matches('/'))
    }

    /// `{graph}/.default`
    pub fn scope(&self) -> String {
        format!("{}/.default", self.graph_endpoint.trim_end_matches('/'))
    }

    /// Validate credentials and endpoints
    pub fn validate(&self) -> MapperResult<()> {
        for (name, value) in [
            ("tenant id", &self.tenant_id),
            ("client id", &self.client_id),
            ("client secret", &self.client_secret),
        ] {
            if value.trim().is_empty() {
                return Err(GroupMapperError::Configuration(format!(
                    "Directory {} cannot be empty",
                    name
                )));
            }
        }

        for (name, value) in [
            ("login endpoint", &self.login_endpoint),
            ("graph endpoint", &self.graph_endpoint),
        ] {
            let url = reqwest::Url::parse(value).map_err(|e| {
                GroupMapperError::Configuration(format!("Invalid {} {}: {}", name, value, e))
            })?;
            if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
                return Err(GroupMapperError::Configuration(format!(
                    "{} must be an absolute http(s) URL: {}",
                    name, value
                )));
            }
        }

        if self.request_timeout_secs == 0 {
            return Err(GroupMapperError::Configuration(
                "Request timeout must be at least one second".to_string(),
            ));
        }

        Ok(())
    }
}

/// Resolution cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Lifetime of one complete mapping, counted from rebuild completion
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: DEFAULT_CACHE_TTL_SECS,
        }
    }
}

impl CacheConfig {
    /// TTL as a chrono duration, clamped to ten years
    pub fn ttl(&self) -> chrono::Duration {
        const MAX_TTL_SECS: i64 = 10 * 365 * 24 * 3600;
        let secs = i64::try_from(self.ttl_secs).unwrap_or(MAX_TTL_SECS);
        chrono::Duration::seconds(secs.min(MAX_TTL_SECS))
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl MapperConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> MapperResult<Self> {
        dotenv::dotenv().ok();

        let tenant_id = required_var("GUAC_ENTRA_TENANT_ID")?;
        let client_id = required_var("GUAC_ENTRA_CLIENT_ID")?;
        let client_secret = required_var("GUAC_ENTRA_CLIENT_SECRET")?;

        let cloud = DirectoryCloud::parse(&env::var("GUAC_ENTRA_CLOUD").unwrap_or_default())?;
        let login_endpoint = env::var("GUAC_ENTRA_LOGIN_ENDPOINT")
            .unwrap_or_else(|_| cloud.login_endpoint().to_string());
        let graph_endpoint = env::var("GUAC_ENTRA_GRAPH_ENDPOINT")
            .unwrap_or_else(|_| cloud.graph_endpoint().to_string());

        let request_timeout_secs = env::var("GUAC_ENTRA_REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| DEFAULT_REQUEST_TIMEOUT_SECS.to_string())
            .parse()
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);
        let ttl_secs = env::var("GUAC_ENTRA_CACHE_TTL_SECS")
            .unwrap_or_else(|_| DEFAULT_CACHE_TTL_SECS.to_string())
            .parse()
            .unwrap_or(DEFAULT_CACHE_TTL_SECS);
        let log_level = env::var("GUAC_ENTRA_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let config = MapperConfig {
            directory: DirectoryConfig {
                tenant_id,
                client_id,
                client_secret,
                login_endpoint,
                graph_endpoint,
                request_timeout_secs,
                user_agent: default_user_agent(),
            },
            cache: CacheConfig { ttl_secs },
            logging: LoggingConfig { level: log_level },
        };
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> MapperResult<()> {
        self.directory.validate()
    }
}

fn required_var(name: &str) -> MapperResult<String> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(GroupMapperError::Configuration(format!(
            "Environment variable {} not set",
            name
        ))),
    }
}

fn default_user_agent() -> String {
    format!("entra-group-names/{}", env!("CARGO_PKG_VERSION"))
}
