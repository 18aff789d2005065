//! Runner configuration loading and types.

use dirsync_connector_ldap::DirectoryConfig;
use serde::Deserialize;
use std::path::Path;

use crate::error::{CliError, CliResult};

const CONFIG_ENV: &str = "DIRSYNC_CONFIG";
const PASSWORD_ENV: &str = "DIRSYNC_BIND_PASSWORD";
const DEFAULT_CONFIG_PATH: &str = "./config/dirsync.yaml";

/// Root configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub directory: DirectoryConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AppConfig {
    /// Load, apply environment overrides and validate.
    ///
    /// Uses `path` when given, otherwise [`AppConfig::config_path`].
    pub fn load(path: Option<&Path>) -> CliResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::from_file(Self::config_path())?,
        };
        config.apply_env_overrides();
        config
            .directory
            .validate()
            .map_err(|e| CliError::Config(e.to_string()))?;
        Ok(config)
    }

    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> CliResult<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            CliError::Config(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(content: &str) -> CliResult<Self> {
        serde_yaml::from_str(content)
            .map_err(|e| CliError::Config(format!("Failed to parse config: {e}")))
    }

    /// Get the configuration file path from environment or default.
    pub fn config_path() -> String {
        std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string())
    }

    /// Apply environment variable overrides.
    pub fn apply_env_overrides(&mut self) {
        self.override_password(std::env::var(PASSWORD_ENV).ok());
    }

    fn override_password(&mut self, password: Option<String>) {
        if let Some(password) = password.filter(|p| !p.is_empty()) {
            self.directory.bind_password = Some(password);
        }
    }
}
