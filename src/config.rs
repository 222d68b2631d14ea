//! Configuration module
//!
//! Application settings are read from a TOML file
//! (`~/.config/sea-paginate/config.toml` by default). A missing file is
//! created with defaults on first load.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use validator::Validate;

use crate::pagination::PaginateOptions;
use crate::shared::{ConfigError, InfraError};

/// Default config file location
pub fn default_config_path() -> PathBuf {
    dirs_next::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("sea-paginate")
        .join("config.toml")
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseSection,
    pub logging: LoggingConfig,
    pub pagination: PaginationConfig,
}

/// HTTP server settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Seconds to wait for in-flight requests on shutdown
    pub shutdown_timeout: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            shutdown_timeout: 30,
        }
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    /// SeaORM connection URL
    pub url: String,
    /// Fill an empty database with demo articles on startup
    pub seed_demo_data: bool,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            url: "sqlite://./paginate.db?mode=rwc".to_string(),
            seed_demo_data: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// tracing filter directive, e.g. `info` or `sea_paginate=debug`
    pub level: String,
    /// `text` or `json`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

/// Service-wide defaults for [`PaginateOptions`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    pub default_size: u64,
    pub max_size: Option<u64>,
    pub limit: Option<u64>,
    pub enable_unpaged: bool,
    pub enable_size: bool,
    pub enable_sort: bool,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        let options = PaginateOptions::default();
        Self {
            default_size: options.default_size,
            max_size: Some(100),
            limit: options.limit,
            enable_unpaged: options.enable_unpaged,
            enable_size: options.enable_size,
            enable_sort: options.enable_sort,
        }
    }
}

impl From<&PaginationConfig> for PaginateOptions {
    fn from(cfg: &PaginationConfig) -> Self {
        PaginateOptions {
            enable_unpaged: cfg.enable_unpaged,
            enable_size: cfg.enable_size,
            enable_sort: cfg.enable_sort,
            limit: cfg.limit,
            max_size: cfg.max_size,
            default_size: cfg.default_size,
        }
    }
}

impl AppConfig {
    /// Reads the config at `path`, writing defaults there if it does not exist.
    pub fn load(path: &Path) -> Result<Self, InfraError> {
        if !path.exists() {
            let config = Self::default();
            config.save(path)?;
            info!("Created default config at {}", path.display());
            return Ok(config);
        }

        let raw = std::fs::read_to_string(path)?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self, InfraError> {
        Ok(toml::from_str(raw)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), InfraError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = toml::to_string_pretty(self)?;
        std::fs::write(path, raw)?;
        Ok(())
    }

    pub fn paginate_options(&self) -> PaginateOptions {
        PaginateOptions::from(&self.pagination)
    }

    /// Checks the settings that would otherwise only fail at server startup.
    pub fn check(&self) -> Result<(), ConfigError> {
        self.paginate_options().validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let cfg = AppConfig::from_toml("").unwrap();
        assert_eq!(cfg, AppConfig::default());
        assert!(cfg.paginate_options().validate().is_ok());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = AppConfig::from_toml(
            r#"
            [server]
            port = 9090

            [pagination]
            max_size = 50
            enable_unpaged = true
            "#,
        )
        .unwrap();

        assert_eq!(cfg.server.port, 9090);
        assert_eq!(cfg.server.host, "0.0.0.0");
        let options = cfg.paginate_options();
        assert_eq!(options.max_size, Some(50));
        assert!(options.enable_unpaged);
        assert_eq!(options.default_size, 20);
    }

    #[test]
    fn zero_max_size_parses_but_fails_validation() {
        let cfg = AppConfig::from_toml("[pagination]\nmax_size = 0\n").unwrap();
        assert!(matches!(cfg.check(), Err(ConfigError::InvalidOptions(_))));
    }

    #[test]
    fn malformed_toml_is_an_error() {
        assert!(matches!(
            AppConfig::from_toml("[server\nport = 1"),
            Err(InfraError::ConfigFile(_))
        ));
    }

    #[test]
    fn load_writes_missing_file() {
        let dir = std::env::temp_dir().join(format!("sea-paginate-test-{}", std::process::id()));
        let path = dir.join("config.toml");
        let _ = std::fs::remove_file(&path);

        let cfg = AppConfig::load(&path).unwrap();
        assert!(path.exists());
        assert_eq!(AppConfig::load(&path).unwrap(), cfg);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
