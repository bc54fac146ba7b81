//! # API Configuration
//!
//! ## Configuration Sources (Priority Order)
//! 1. Environment variables (`MERCATO_*`)
//! 2. Config file (`inventory.toml`)
//! 3. Defaults (this file)
//!
//! ```text
//!   ApiConfig::default()
//!        │
//!        ▼
//!   merge inventory.toml        (explicit path, or the platform config dir)
//!        │
//!        ▼
//!   apply MERCATO_* overrides
//!        │
//!        ▼
//!   validate()                  ── ConfigError
//! ```
//!
//! Read-only after startup.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use mercato_core::{StockThresholds, DEFAULT_LOW_STOCK_THRESHOLD, DEFAULT_OVERSTOCK_THRESHOLD};
use mercato_db::{DbConfig, RetryPolicy};

/// File name looked up in the platform config directory.
pub const CONFIG_FILE_NAME: &str = "inventory.toml";

/// HTTP server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Interface to bind.
    /// Default: "127.0.0.1"
    pub bind_addr: String,

    /// HTTP port.
    /// Default: 8080
    pub port: u16,

    /// SQLite database file.
    /// Default: `mercato.db` in the platform data directory
    pub database_path: PathBuf,

    /// Pool size.
    /// Default: 5
    pub max_connections: u32,

    /// Total attempts for a contended stock write.
    /// Default: 5
    pub retry_attempts: u32,

    /// First backoff delay in milliseconds, doubled per attempt.
    /// Default: 10
    pub retry_base_delay_ms: u64,

    /// Backoff cap in milliseconds.
    /// Default: 200
    pub retry_max_delay_ms: u64,

    /// Default low-stock threshold for dashboard metrics.
    pub low_stock_threshold: i64,

    /// Default overstock threshold for dashboard metrics.
    pub overstock_threshold: i64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            bind_addr: "127.0.0.1".to_string(),
            port: 8080,
            database_path: default_database_path(),
            max_connections: 5,
            retry_attempts: 5,
            retry_base_delay_ms: 10,
            retry_max_delay_ms: 200,
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
            overstock_threshold: DEFAULT_OVERSTOCK_THRESHOLD,
        }
    }
}

impl ApiConfig {
    /// Loads defaults, then `path` (or the platform config file if it
    /// exists), then environment overrides, then validates.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => ApiConfig::from_file(path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => ApiConfig::from_file(&path)?,
                _ => ApiConfig::default(),
            },
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parses a TOML file. Missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        ApiConfig::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        toml::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Applies `MERCATO_*` overrides read through `lookup`.
    ///
    /// ## Environment Variables
    /// - `MERCATO_BIND_ADDR`, `MERCATO_PORT`
    /// - `MERCATO_DB_PATH`, `MERCATO_MAX_CONNECTIONS`
    /// - `MERCATO_RETRY_ATTEMPTS`
    /// - `MERCATO_LOW_STOCK_THRESHOLD`, `MERCATO_OVERSTOCK_THRESHOLD`
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup("MERCATO_BIND_ADDR") {
            self.bind_addr = addr;
        }
        if let Some(port) = lookup("MERCATO_PORT") {
            self.port = parse_var("MERCATO_PORT", &port)?;
        }
        if let Some(path) = lookup("MERCATO_DB_PATH") {
            self.database_path = PathBuf::from(path);
        }
        if let Some(max) = lookup("MERCATO_MAX_CONNECTIONS") {
            self.max_connections = parse_var("MERCATO_MAX_CONNECTIONS", &max)?;
        }
        if let Some(attempts) = lookup("MERCATO_RETRY_ATTEMPTS") {
            self.retry_attempts = parse_var("MERCATO_RETRY_ATTEMPTS", &attempts)?;
        }
        if let Some(low) = lookup("MERCATO_LOW_STOCK_THRESHOLD") {
            self.low_stock_threshold = parse_var("MERCATO_LOW_STOCK_THRESHOLD", &low)?;
        }
        if let Some(over) = lookup("MERCATO_OVERSTOCK_THRESHOLD") {
            self.overstock_threshold = parse_var("MERCATO_OVERSTOCK_THRESHOLD", &over)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_connections == 0 {
            return Err(ConfigError::InvalidValue("max_connections must be at least 1".to_string()));
        }
        if self.retry_attempts == 0 {
            return Err(ConfigError::InvalidValue("retry_attempts must be at least 1".to_string()));
        }
        if self.retry_max_delay_ms < self.retry_base_delay_ms {
            return Err(ConfigError::InvalidValue(
                "retry_max_delay_ms must not be below retry_base_delay_ms".to_string(),
            ));
        }
        self.thresholds()
            .validate()
            .map_err(|e| ConfigError::InvalidValue(e.to_string()))?;
        self.socket_addr()?;
        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.bind_addr, self.port)
            .parse()
            .map_err(|_| ConfigError::InvalidValue(format!("bind address {}:{}", self.bind_addr, self.port)))
    }

    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database_path).max_connections(self.max_connections)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry_attempts,
            Duration::from_millis(self.retry_base_delay_ms),
            Duration::from_millis(self.retry_max_delay_ms),
        )
    }

    pub fn thresholds(&self) -> StockThresholds {
        StockThresholds {
            low: self.low_stock_threshold,
            overstock: self.overstock_threshold,
        }
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue(format!("{key}={value}")))
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "mercato", "inventory")
}

/// `inventory.toml` in the platform config directory.
pub fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

/// `mercato.db` in the platform data directory, or the working directory
/// when no home directory is available.
fn default_database_path() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.data_dir().join("mercato.db"))
        .unwrap_or_else(|| PathBuf::from("mercato.db"))
}

/// Configuration error types.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file: {0}")]
    Parse(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),
}
