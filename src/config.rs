use crate::catalog::{FileRecordSource, SourceFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming an optional override file
pub const CONFIG_PATH_ENV: &str = "HFV_CONFIG_PATH";

const DEFAULT_CONFIG_PATH: &str = "config/hotfix-viewer.toml";

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Record source configuration
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Usage audit log configuration
    #[serde(default)]
    pub usage_log: UsageLogConfig,

    /// Query limits
    #[serde(default)]
    pub query: QueryConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load configuration from the embedded defaults, an optional file and the environment.
    ///
    /// `path` wins over `HFV_CONFIG_PATH`; a missing override file is not an error.
    pub fn load(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        let config_path = match path {
            Some(path) => path.to_path_buf(),
            None => std::env::var(CONFIG_PATH_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH)),
        };

        config::Config::builder()
            // Start with default values
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ))
            // Override with config file if it exists
            .add_source(config::File::from(config_path).required(false))
            // Override with environment variables (prefix: HFV__)
            .add_source(
                config::Environment::with_prefix("HFV")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server host
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port
    #[serde(default = "default_http_port")]
    pub http_port: u16,

    /// Value sent as Access-Control-Allow-Origin; `*` allows any origin
    #[serde(default = "default_cors_allow_origin")]
    pub cors_allow_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            http_port: default_http_port(),
            cors_allow_origin: default_cors_allow_origin(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Exported hotfix sheet to load records from
    #[serde(default = "default_source_path")]
    pub source_path: PathBuf,

    /// File format; inferred from the extension when absent
    #[serde(default)]
    pub format: Option<SourceFormat>,

    /// Load the catalog before the server starts accepting requests
    #[serde(default = "default_true")]
    pub load_on_startup: bool,
}

impl CatalogConfig {
    /// Record source described by this configuration
    pub fn record_source(&self) -> FileRecordSource {
        let source = FileRecordSource::new(&self.source_path);
        match self.format {
            Some(format) => source.with_format(format),
            None => source,
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            source_path: default_source_path(),
            format: None,
            load_on_startup: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageLogConfig {
    /// Record search usage at all
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Usage log backend type
    #[serde(default)]
    pub backend: UsageLogBackend,

    /// Path for the embedded database (sled)
    pub path: Option<PathBuf>,
}

impl Default for UsageLogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: UsageLogBackend::default(),
            path: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UsageLogBackend {
    #[default]
    Memory,
    Sled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Larger requested page sizes are clamped to this
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,
}

impl QueryConfig {
    /// Clamp a requested page size to the configured maximum
    pub fn clamp_page_size(&self, requested: i64) -> i64 {
        requested.min(i64::from(self.max_page_size))
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            max_page_size: default_max_page_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub json_logs: bool,

    /// Service name
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Enable Prometheus metrics
    #[serde(default = "default_true")]
    pub prometheus_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: false,
            service_name: default_service_name(),
            prometheus_enabled: true,
        }
    }
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_http_port() -> u16 {
    8080
}

fn default_cors_allow_origin() -> String {
    "*".to_string()
}

fn default_source_path() -> PathBuf {
    PathBuf::from("data/hotfixes.json")
}

fn default_max_page_size() -> u32 {
    500
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_service_name() -> String {
    "hotfix-viewer".to_string()
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_values() {
        let config = Config::default();
        assert_eq!(config.server.http_port, 8080);
        assert_eq!(config.query.max_page_size, 500);
        assert_eq!(config.usage_log.backend, UsageLogBackend::Memory);
        assert!(config.catalog.load_on_startup);
        assert!(config.observability.prometheus_enabled);
    }

    #[test]
    fn test_override_file_is_layered_over_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("override.toml");
        std::fs::write(
            &path,
            "[server]\nhttp_port = 9191\n\n[catalog]\nsource_path = \"/srv/hotfixes.yaml\"\nformat = \"yaml\"\n",
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.server.http_port, 9191);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.catalog.format, Some(SourceFormat::Yaml));
        assert_eq!(config.catalog.record_source().path(), Path::new("/srv/hotfixes.yaml"));
    }

    #[test]
    fn test_missing_override_file_uses_defaults() {
        let config = Config::load(Some(Path::new("/nonexistent/hotfix-viewer.toml"))).unwrap();
        assert_eq!(config.observability.service_name, "hotfix-viewer");
    }

    #[test]
    fn test_page_size_clamp() {
        let query = QueryConfig::default();
        assert_eq!(query.clamp_page_size(10), 10);
        assert_eq!(query.clamp_page_size(10_000), 500);
        assert_eq!(query.clamp_page_size(0), 0);
    }
}
