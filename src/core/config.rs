//! Configuration management for the gateway.
//!
//! All settings come from environment variables (a `.env` file is loaded
//! first when present). Only `OPENPROJECT_URL` is mandatory.

use super::error::{Error, Result};
use super::security::RateLimit;
use super::transport::TransportConfig;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Main configuration structure for the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server identification and metadata.
    pub server: ServerConfig,

    /// OpenProject connection settings.
    pub backend: BackendConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Transport configuration.
    pub transport: TransportConfig,

    /// Credential check and rate limiting.
    pub security: SecurityConfig,
}

/// Server identification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The name of the service as reported to clients.
    pub name: String,

    /// The version of the service.
    pub version: String,
}

/// OpenProject connection settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the OpenProject instance.
    pub url: String,

    /// API key, sent as Basic `apikey:<key>`.
    pub api_key: Option<String>,

    /// Optional proxy for backend traffic.
    pub proxy: Option<String>,

    /// Page size used internally during full retrieval.
    pub page_size: u32,
}

/// Custom Debug implementation to redact secrets from logs.
impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConfig")
            .field("url", &self.url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("proxy", &self.proxy.as_ref().map(|_| "[REDACTED]"))
            .field("page_size", &self.page_size)
            .finish()
    }
}

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Standard,
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "trace").
    pub level: String,

    /// Human readable or JSON lines.
    pub format: LogFormat,
}

/// HTTP Basic credential check settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub enabled: bool,
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("enabled", &self.enabled)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Cross-cutting gate configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub auth: AuthConfig,

    /// Per-caller-address request budget.
    pub rate_limit: RateLimit,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            username: "admin".to_string(),
            password: "changeme".to_string(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8080".to_string(),
            api_key: None,
            proxy: None,
            page_size: 100,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                name: "openproject-gateway".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            backend: BackendConfig::default(),
            logging: LoggingConfig {
                level: "info".to_string(),
                format: LogFormat::Standard,
            },
            transport: TransportConfig::default(),
            security: SecurityConfig {
                auth: AuthConfig::default(),
                rate_limit: RateLimit::default(),
            },
        }
    }
}

/// Parse a boolean flag the way the deployment scripts write them.
pub(crate) fn env_flag(name: &str, default: bool) -> bool {
    std::env::var(name)
        .map(|v| v.trim().eq_ignore_ascii_case("true") || v.trim() == "1")
        .unwrap_or(default)
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Ok(name) = std::env::var("MCP_SERVER_NAME") {
            config.server.name = name;
        }

        if let Ok(level) = std::env::var("LOG_LEVEL") {
            config.logging.level = level.to_lowercase();
        }

        if let Ok(format) = std::env::var("LOG_FORMAT") {
            config.logging.format = if format.eq_ignore_ascii_case("json") {
                LogFormat::Json
            } else {
                LogFormat::Standard
            };
        }

        config.backend.url = non_empty_var("OPENPROJECT_URL")
            .ok_or_else(|| Error::config("OPENPROJECT_URL must be set"))?;
        config.backend.api_key = non_empty_var("OPENPROJECT_API_KEY");
        config.backend.proxy = non_empty_var("OPENPROJECT_PROXY");

        if let Some(page_size) = non_empty_var("OPENPROJECT_PAGE_SIZE") {
            config.backend.page_size = page_size
                .parse()
                .ok()
                .filter(|size: &u32| *size > 0)
                .ok_or_else(|| {
                    Error::config(format!("OPENPROJECT_PAGE_SIZE is not a positive integer: {page_size}"))
                })?;
        }

        config.security.auth.enabled = env_flag("HTTP_AUTH_ENABLED", false);
        if let Ok(username) = std::env::var("HTTP_AUTH_USERNAME") {
            config.security.auth.username = username;
        }
        if let Ok(password) = std::env::var("HTTP_AUTH_PASSWORD") {
            config.security.auth.password = password;
        }

        if let Some(rate) = non_empty_var("RATE_LIMIT") {
            config.security.rate_limit = rate
                .parse()
                .map_err(|e| Error::config(format!("RATE_LIMIT: {e}")))?;
        }

        // Load transport configuration from environment
        config.transport = TransportConfig::from_env()?;

        Ok(config)
    }

    /// Log the effective settings. Called once logging is initialized.
    pub fn log_summary(&self) {
        info!("OpenProject URL: {}", self.backend.url);
        info!("Transport: {}", self.transport.description());
        info!(
            "Authentication: {}",
            if self.security.auth.enabled { "enabled" } else { "disabled" }
        );
        info!("Rate limit: {}", self.security.rate_limit);

        #[cfg(feature = "http")]
        if let TransportConfig::Http(http) = &self.transport {
            if http.cors.enabled {
                info!("CORS: enabled for {}", http.cors.origins.join(", "));
            } else {
                info!("CORS: disabled");
            }
            if http.compression.enabled {
                info!("Compression: gzip above {} bytes", http.compression.min_size);
            } else {
                info!("Compression: disabled");
            }
        }

        if self.backend.api_key.is_none() {
            warn!("OPENPROJECT_API_KEY not set - requests to OpenProject will be anonymous");
        }
        if self.security.auth.enabled && self.security.auth.password == "changeme" {
            warn!("HTTP authentication enabled with the default password - set HTTP_AUTH_PASSWORD");
        }
    }
}
