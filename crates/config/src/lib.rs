#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration management for slowrepo
//!
//! This crate handles loading and merging configuration from:
//! - Default values (hard-coded)
//! - Configuration file (~/.config/slowrepo/config.toml or `--config`)
//! - Environment variables
//! - CLI flags (applied by the binary)

pub mod duration;

pub use duration::{format_duration, parse_duration};

use serde::{Deserialize, Serialize};
use slowrepo_errors::{ConfigError, Error};
use slowrepo_index::CatalogEntry;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tracing::debug;

/// Digest shared by the bundled demo charts
pub const DEMO_CHART_DIGEST: &str =
    "a60ac9484e3c20c298cbc83052ffdfb5c25d27843685e38cfec66221c43cb491";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,
}

/// Listener and request-path configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    #[serde(default = "default_max_index_concurrency")]
    pub max_index_concurrency: usize,
    #[serde(default, with = "duration::serde_str")]
    pub simulate_index_duration: Duration, // zero = disabled
    #[serde(default = "default_charts_dir")]
    pub charts_dir: PathBuf,
    #[serde(default = "default_shutdown_grace", with = "duration::serde_str")]
    pub shutdown_grace: Duration,
}

/// Charts published in the index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default)]
    pub base_url: String,
    #[serde(default = "default_charts")]
    pub charts: Vec<CatalogEntry>,
}

// Default implementations

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            max_index_concurrency: default_max_index_concurrency(),
            simulate_index_duration: Duration::ZERO,
            charts_dir: default_charts_dir(),
            shutdown_grace: default_shutdown_grace(),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            charts: default_charts(),
        }
    }
}

// Default value functions for serde
fn default_listen_addr() -> String {
    ":8080".to_string()
}

fn default_max_index_concurrency() -> usize {
    1
}

fn default_charts_dir() -> PathBuf {
    PathBuf::from("charts")
}

fn default_shutdown_grace() -> Duration {
    Duration::from_secs(2)
}

fn default_charts() -> Vec<CatalogEntry> {
    vec![
        CatalogEntry::new(
            "guestbook",
            "0.0.0",
            "charts/guestbook-0.0.0.tgz",
            DEMO_CHART_DIGEST,
        )
        .with_app_version("0.1.0"),
        CatalogEntry::new(
            "config-chart",
            "0.1.0",
            "charts/config-chart-0.1.0.tgz",
            DEMO_CHART_DIGEST,
        )
        .with_app_version("0.1.0"),
    ]
}

impl ServerConfig {
    /// Address handed to the listener
    ///
    /// A bare `:port` binds every interface.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        if self.listen_addr.starts_with(':') {
            format!("0.0.0.0{}", self.listen_addr)
        } else {
            self.listen_addr.clone()
        }
    }
}

impl Config {
    /// Get the default config file path
    ///
    /// # Errors
    ///
    /// Returns an error if the system config directory cannot be determined.
    pub fn default_path() -> Result<PathBuf, Error> {
        let config_dir = dirs::config_dir().ok_or_else(|| ConfigError::NotFound {
            path: "config directory".to_string(),
        })?;
        Ok(config_dir.join("slowrepo").join("config.toml"))
    }

    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the file contents
    /// contain invalid TOML syntax that cannot be parsed.
    pub async fn load_from_file(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)
            .await
            .map_err(|_| ConfigError::NotFound {
                path: path.display().to_string(),
            })?;

        debug!(path = %path.display(), "loaded config file");

        toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError {
                message: e.to_string(),
            })
            .map_err(Into::into)
    }

    /// Load configuration with fallback to defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read
    /// or contains invalid TOML syntax.
    pub async fn load() -> Result<Self, Error> {
        match Self::default_path() {
            Ok(config_path) if config_path.exists() => Self::load_from_file(&config_path).await,
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration from an optional path or use default
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self, Error> {
        match path {
            Some(config_path) => Self::load_from_file(config_path).await,
            None => Self::load().await,
        }
    }

    /// Merge with environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables contain invalid values
    /// that cannot be parsed into the expected types.
    pub fn merge_env(&mut self) -> Result<(), Error> {
        // SLOWREPO_LISTEN_ADDR
        if let Ok(addr) = std::env::var("SLOWREPO_LISTEN_ADDR") {
            self.server.listen_addr = addr;
        }

        // SLOWREPO_MAX_INDEX_CONCURRENCY
        if let Ok(limit) = std::env::var("SLOWREPO_MAX_INDEX_CONCURRENCY") {
            self.server.max_index_concurrency =
                limit.parse().map_err(|_| ConfigError::InvalidValue {
                    field: "SLOWREPO_MAX_INDEX_CONCURRENCY".to_string(),
                    value: limit,
                })?;
        }

        // SLOWREPO_SIMULATE_INDEX_DURATION
        if let Ok(value) = std::env::var("SLOWREPO_SIMULATE_INDEX_DURATION") {
            self.server.simulate_index_duration =
                parse_duration(&value).map_err(|_| ConfigError::InvalidValue {
                    field: "SLOWREPO_SIMULATE_INDEX_DURATION".to_string(),
                    value,
                })?;
        }

        // SLOWREPO_CHARTS_DIR
        if let Ok(dir) = std::env::var("SLOWREPO_CHARTS_DIR") {
            self.server.charts_dir = PathBuf::from(dir);
        }

        // SLOWREPO_SHUTDOWN_GRACE
        if let Ok(value) = std::env::var("SLOWREPO_SHUTDOWN_GRACE") {
            self.server.shutdown_grace =
                parse_duration(&value).map_err(|_| ConfigError::InvalidValue {
                    field: "SLOWREPO_SHUTDOWN_GRACE".to_string(),
                    value,
                })?;
        }

        Ok(())
    }

    /// Check values serde cannot express
    ///
    /// # Errors
    ///
    /// Returns `InvalidValue` for an empty listen address or a concurrency
    /// limit of zero.
    pub fn validate(&self) -> Result<(), Error> {
        if self.server.listen_addr.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "listen_addr".to_string(),
                value: self.server.listen_addr.clone(),
            }
            .into());
        }

        if self.server.max_index_concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_index_concurrency".to_string(),
                value: "0".to_string(),
            }
            .into());
        }

        Ok(())
    }
}
