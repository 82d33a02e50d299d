//! Configuration for the answer desk service
//!
//! Loaded from a TOML file. Only `tasks.table_path` is required; every other
//! field has a default.
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 8000
//! index_html = "static/index.html"
//!
//! [tasks]
//! table_path = "tasks.xlsx"
//!
//! [uploads]
//! dir = "uploads"
//!
//! [resolver]
//! url = "http://localhost:9000/answer"
//! computed_tasks = ["GA1.3", "GA1.4"]
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Task ids answered by the resolver when no list is configured
pub const DEFAULT_COMPUTED_TASKS: &[&str] = &[
    "GA1.3", "GA1.4", "GA1.5", "GA1.7", "GA1.8", "GA1.9", "GA1.10", "GA1.12",
];

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeskConfig {
    #[serde(default)]
    pub server: ServerSection,
    pub tasks: TasksSection,
    #[serde(default)]
    pub uploads: UploadsSection,
    #[serde(default)]
    pub resolver: ResolverSection,
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Form page served at `/`
    #[serde(default = "default_index_html")]
    pub index_html: PathBuf,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            index_html: default_index_html(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_index_html() -> PathBuf {
    PathBuf::from("index.html")
}

/// Task table source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TasksSection {
    /// Spreadsheet (.xlsx, .xls, .ods) or .csv file
    pub table_path: PathBuf,
    /// Worksheet name; first sheet when omitted
    pub sheet: Option<String>,
}

/// Upload storage
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UploadsSection {
    #[serde(default = "default_upload_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_max_upload_bytes")]
    pub max_bytes: usize,
}

impl Default for UploadsSection {
    fn default() -> Self {
        Self {
            dir: default_upload_dir(),
            max_bytes: default_max_upload_bytes(),
        }
    }
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024 // 10MB
}

/// External answer resolver
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResolverSection {
    /// Resolver endpoint; computed tasks fail when unset
    pub url: Option<String>,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: usize,
    /// Task ids answered by the resolver instead of the answer table
    #[serde(default = "default_computed_tasks")]
    pub computed_tasks: BTreeSet<String>,
}

impl Default for ResolverSection {
    fn default() -> Self {
        Self {
            url: None,
            timeout_ms: default_timeout_ms(),
            retry_attempts: default_retry_attempts(),
            computed_tasks: default_computed_tasks(),
        }
    }
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_retry_attempts() -> usize {
    2
}

fn default_computed_tasks() -> BTreeSet<String> {
    DEFAULT_COMPUTED_TASKS.iter().map(|id| id.to_string()).collect()
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Invalid resolver URL '{url}': {reason}")]
    InvalidResolverUrl { url: String, reason: String },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl DeskConfig {
    /// Load and validate configuration from a TOML file.
    ///
    /// A relative `tasks.table_path`, `server.index_html` or `uploads.dir` is
    /// resolved against the config file's directory.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml_str(&content)?;

        if let Some(base) = path.parent() {
            config.tasks.table_path = resolve_relative(base, &config.tasks.table_path);
            config.server.index_html = resolve_relative(base, &config.server.index_html);
            config.uploads.dir = resolve_relative(base, &config.uploads.dir);
        }

        Ok(config)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: DeskConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check field consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidConfig(
                "server.port must be non-zero".to_string(),
            ));
        }

        self.server.host.parse::<IpAddr>().map_err(|_| {
            ConfigError::InvalidConfig(format!(
                "server.host '{}' is not an IP address",
                self.server.host
            ))
        })?;

        if self.tasks.table_path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidConfig(
                "tasks.table_path must not be empty".to_string(),
            ));
        }

        if self.uploads.max_bytes == 0 {
            return Err(ConfigError::InvalidConfig(
                "uploads.max_bytes must be non-zero".to_string(),
            ));
        }

        if let Some(url) = &self.resolver.url {
            validate_resolver_url(url)?;
        }

        if self.resolver.computed_tasks.iter().any(|id| id.trim().is_empty()) {
            return Err(ConfigError::InvalidConfig(
                "resolver.computed_tasks must not contain empty task ids".to_string(),
            ));
        }

        Ok(())
    }

    /// Socket address for the HTTP listener
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self.server.host.parse().map_err(|_| {
            ConfigError::InvalidConfig(format!("invalid server.host '{}'", self.server.host))
        })?;
        Ok(SocketAddr::new(ip, self.server.port))
    }

    /// Create a test configuration for unit testing
    #[cfg(test)]
    pub fn test_config() -> Self {
        let toml_content = r#"
[tasks]
table_path = "tasks.csv"

[resolver]
url = "http://localhost:9000/answer"
"#;
        Self::from_toml_str(toml_content).expect("Test config should parse")
    }
}

fn resolve_relative(base: &Path, path: &Path) -> PathBuf {
    if path.is_relative() && !base.as_os_str().is_empty() {
        base.join(path)
    } else {
        path.to_path_buf()
    }
}

fn validate_resolver_url(raw: &str) -> Result<(), ConfigError> {
    let parsed = url::Url::parse(raw).map_err(|e| ConfigError::InvalidResolverUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;

    match parsed.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(ConfigError::InvalidResolverUrl {
            url: raw.to_string(),
            reason: format!("unsupported scheme '{scheme}'"),
        }),
    }
}
