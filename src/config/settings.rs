//! Configuration settings for askdb.

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub oracle: OracleConfig,
    pub render: RenderConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::ReadFile)?;
        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default locations or use defaults.
    pub fn load() -> Result<Self> {
        let config_paths = [
            // Current directory
            PathBuf::from("askdb.toml"),
            // User config directory
            dirs::config_dir()
                .map(|p| p.join("askdb/config.toml"))
                .unwrap_or_default(),
            // Home directory
            dirs::home_dir()
                .map(|p| p.join(".askdb/config.toml"))
                .unwrap_or_default(),
        ];

        for path in &config_paths {
            if path.exists() {
                tracing::info!("Loading config from: {}", path.display());
                return Self::from_file(path);
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Config::default())
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.database.url.is_empty() {
            return Err(ConfigError::MissingField("database.url".to_string()).into());
        }

        if self.oracle.enabled {
            if self.oracle.base_url.is_empty() {
                return Err(ConfigError::MissingField("oracle.base_url".to_string()).into());
            }
            if self.oracle.model.is_empty() {
                return Err(ConfigError::MissingField("oracle.model".to_string()).into());
            }
        }

        if self.render.max_table_rows == 0 {
            return Err(ConfigError::Invalid("render.max_table_rows must be > 0".to_string()).into());
        }

        Ok(())
    }
}

/// Database connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// MySQL connection URL.
    pub url: String,
    /// Connection timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Maximum pool connections. One in-flight query per turn, so this
    /// stays small.
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "mysql://root@localhost:3306/internships".to_string(),
            connect_timeout_secs: 10,
            max_connections: 2,
        }
    }
}

/// Text-to-SQL oracle configuration.
///
/// When disabled (or unreachable at startup) the synthesizer runs on
/// templates alone; when a per-call translation fails, the fallback is for
/// that turn only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    /// Whether to consult the external oracle at all.
    pub enabled: bool,
    /// Base URL for an OpenAI-compatible chat completion endpoint.
    pub base_url: String,
    /// Model name.
    pub model: String,
    /// API key (loaded from ASKDB_ORACLE_API_KEY if not set).
    pub api_key: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Retries after a timeout before falling back to templates.
    pub max_retries: u32,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: "http://localhost:8000/v1".to_string(),
            model: "sqlcoder-7b-2".to_string(),
            api_key: None,
            timeout_secs: 30,
            max_retries: 1,
        }
    }
}

/// Response rendering configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Maximum rows printed in a tabular response.
    pub max_table_rows: usize,
    /// Maximum width of a single table cell, in bytes.
    pub max_cell_width: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            max_table_rows: 10,
            max_cell_width: 40,
        }
    }
}
