//! Configuration management for Scholar Harvest
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config/default, config/{APP_ENV}, config/local)
//! - Legacy libpq-style variables (PGHOST, PGUSERSCRAPER, ...) for the database
//! - Default values

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Database configuration; when absent records go to JSON files
    #[serde(default)]
    pub database: Option<DatabaseConfig>,

    /// JSON file output configuration
    #[serde(default)]
    pub output: OutputConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Pipeline behaviour
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Database URL (postgres://... or sqlite:...)
    pub url: String,

    /// Maximum number of connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum number of connections
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Idle timeout in seconds
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,

    /// Create missing tables from the entity definitions on connect
    #[serde(default)]
    pub create_schema: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    /// Directory the JSON files are written to
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,

    #[serde(default = "default_organization_file")]
    pub organization_file: String,

    #[serde(default = "default_links_file")]
    pub links_file: String,

    #[serde(default = "default_personal_data_file")]
    pub personal_data_file: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level (debug, info, warn, error); RUST_LOG wins when set
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default = "default_json_logging")]
    pub json_logging: bool,

    /// Service name attached to log output
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    /// Ingest organizations, then scientists, then links, then publications
    #[serde(default = "default_order_by_dependency")]
    pub order_by_dependency: bool,
}

// Default value functions
fn default_max_connections() -> u32 { 1 }
fn default_min_connections() -> u32 { 1 }
fn default_connect_timeout() -> u64 { 10 }
fn default_idle_timeout() -> u64 { 300 }
fn default_output_dir() -> PathBuf { PathBuf::from(".") }
fn default_organization_file() -> String { "organization.json".to_string() }
fn default_links_file() -> String { "links.json".to_string() }
fn default_personal_data_file() -> String { "personalData.json".to_string() }
fn default_log_level() -> String { "info".to_string() }
fn default_json_logging() -> bool { false }
fn default_service_name() -> String { "scholar-harvest".to_string() }
fn default_order_by_dependency() -> bool { true }

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            organization_file: default_organization_file(),
            links_file: default_links_file(),
            personal_data_file: default_personal_data_file(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logging: default_json_logging(),
            service_name: default_service_name(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            order_by_dependency: default_order_by_dependency(),
        }
    }
}

impl DatabaseConfig {
    /// Configuration for a single URL with default pool settings
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            idle_timeout_secs: default_idle_timeout(),
            create_schema: false,
        }
    }

    /// Build a Postgres URL from the scraper's libpq-style variables.
    ///
    /// Returns `None` unless `PGHOST` is set.
    pub fn from_pg_env() -> Option<Self> {
        Self::from_pg_vars(|key| std::env::var(key).ok())
    }

    fn from_pg_vars(var: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let host = var("PGHOST")?;
        let port = var("PGPORT").unwrap_or_else(|| "5432".to_string());
        let database = var("PGDATABASE").unwrap_or_else(|| "postgres".to_string());

        let credentials = match (var("PGUSERSCRAPER"), var("PGPASSWORDSCRAPER")) {
            (Some(user), Some(password)) => format!("{}:{}@", user, password),
            (Some(user), None) => format!("{}@", user),
            _ => String::new(),
        };

        Some(Self::with_url(format!(
            "postgres://{}{}:{}/{}",
            credentials, host, port, database
        )))
    }

    /// Get connect timeout as Duration
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Get idle timeout as Duration
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

impl OutputConfig {
    pub fn organization_path(&self) -> PathBuf {
        self.dir.join(&self.organization_file)
    }

    pub fn links_path(&self) -> PathBuf {
        self.dir.join(&self.links_file)
    }

    pub fn personal_data_path(&self) -> PathBuf {
        self.dir.join(&self.personal_data_file)
    }
}

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Load base config file
            .add_source(File::with_name("config/default").required(false))

            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))

            // Load local overrides
            .add_source(File::with_name("config/local").required(false))

            // Load from environment variables with APP__ prefix
            // e.g., APP__DATABASE__URL=postgres://...
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )

            .build()?;

        let config: Self = config.try_deserialize()?;
        Ok(config.with_pg_fallback())
    }

    /// Load from a specific config file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )
            .build()?;

        let config: Self = config.try_deserialize()?;
        Ok(config.with_pg_fallback())
    }

    fn with_pg_fallback(mut self) -> Self {
        if self.database.is_none() {
            self.database = DatabaseConfig::from_pg_env();
        }
        self
    }

    /// Whether records should be reconciled into a database
    pub fn has_database(&self) -> bool {
        self.database.is_some()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: None,
            output: OutputConfig::default(),
            observability: ObservabilityConfig::default(),
            pipeline: PipelineConfig::default(),
        }
    }
}
