//! Static configuration
//!
//! Layered, later layers win:
//! 1. Serde defaults
//! 2. `config/default.{toml,yaml,json}` (optional)
//! 3. File named by `ZENODEO_CONFIG` (optional)
//! 4. `ZENODEO__SECTION__KEY` environment variables (e.g. `ZENODEO__SERVER__PORT=8080`)

use config::{Environment, File};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub query: QueryConfig,
    pub cache: CacheConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Absolute base used for envelope links, e.g. `https://api.example.org`.
    /// Derived from request headers when unset.
    pub public_base_url: Option<String>,
    /// Mount point of the resource routes.
    pub api_prefix: String,
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3010,
            public_base_url: None,
            api_prefix: "/v2".to_string(),
            cors_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// sqlx SQLite URL, e.g. `sqlite://data/zenodeo.sqlite?mode=ro`.
    pub url: String,
    pub max_connections: u32,
    pub statement_timeout_ms: u64,
    pub run_migrations: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://data/zenodeo.sqlite?mode=rwc".to_string(),
            max_connections: 8,
            statement_timeout_ms: 10_000,
            run_migrations: true,
        }
    }
}

impl DatabaseConfig {
    pub fn statement_timeout(&self) -> Duration {
        Duration::from_millis(self.statement_timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    pub default_page_size: u32,
    pub max_page_size: u32,
    /// Descriptor file replacing the built-in catalog.
    pub descriptors_path: Option<PathBuf>,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_page_size: 30,
            max_page_size: 100,
            descriptors_path: None,
        }
    }
}

impl QueryConfig {
    pub fn paging(&self) -> zenodeo_query::Paging {
        zenodeo_query::Paging {
            default_size: self.default_page_size,
            max_size: self.max_page_size,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    /// Entries kept per resource segment.
    pub capacity: usize,
    pub ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: 1_000,
            ttl_seconds: 86_400,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
    pub file_enabled: bool,
    pub file_directory: String,
    pub file_prefix: String,
    /// daily, hourly, minutely or never
    pub file_rotation: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file_enabled: false,
            file_directory: "logs".to_string(),
            file_prefix: "zenodeo".to_string(),
            file_rotation: "daily".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from files and environment.
    pub fn load() -> anyhow::Result<Self> {
        let _ = dotenvy::dotenv();

        let mut builder = config::Config::builder()
            .add_source(File::with_name("config/default").required(false));

        if let Ok(path) = std::env::var("ZENODEO_CONFIG") {
            builder = builder.add_source(File::with_name(&path).required(true));
        }

        let settings = builder
            .add_source(
                Environment::with_prefix("ZENODEO")
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.cors_origins")
                    .try_parsing(true),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Reject inconsistent values before anything is started.
    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("server.port must be non-zero".to_string());
        }
        if !self.server.api_prefix.starts_with('/') || self.server.api_prefix.ends_with('/') {
            return Err(format!(
                "server.api_prefix must start and not end with '/': {}",
                self.server.api_prefix
            ));
        }
        if let Some(base) = &self.server.public_base_url {
            if url::Url::parse(base).is_err() {
                return Err(format!("server.public_base_url is not a URL: {base}"));
            }
        }
        if self.database.url.trim().is_empty() {
            return Err("database.url must be set".to_string());
        }
        if self.database.max_connections == 0 {
            return Err("database.max_connections must be at least 1".to_string());
        }
        if self.database.statement_timeout_ms == 0 {
            return Err("database.statement_timeout_ms must be at least 1".to_string());
        }
        if self.query.default_page_size == 0 {
            return Err("query.default_page_size must be at least 1".to_string());
        }
        if self.query.max_page_size < self.query.default_page_size {
            return Err(format!(
                "query.max_page_size ({}) is smaller than query.default_page_size ({})",
                self.query.max_page_size, self.query.default_page_size
            ));
        }
        if self.cache.enabled && self.cache.capacity == 0 {
            return Err("cache.capacity must be at least 1 when caching is enabled".to_string());
        }
        if !matches!(
            self.logging.file_rotation.as_str(),
            "daily" | "hourly" | "minutely" | "never"
        ) {
            return Err(format!(
                "logging.file_rotation must be daily, hourly, minutely or never: {}",
                self.logging.file_rotation
            ));
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        let ip: IpAddr = self
            .server
            .host
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid server.host '{}': {e}", self.server.host))?;
        Ok(SocketAddr::new(ip, self.server.port))
    }
}
