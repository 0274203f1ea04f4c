use serde::Deserialize;
use std::path::Path;

use crate::hex::HexMode;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FilterConfig {
    /// Requests whose endpoint starts with this prefix are never suppressed.
    #[serde(default = "default_allowed_prefix")]
    pub allowed_prefix: String,
    #[serde(default)]
    pub hex_mode: HexMode,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Line written to the diagnostic stream before each shown frame.
    #[serde(default = "default_separator")]
    pub separator: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            allowed_prefix: default_allowed_prefix(),
            hex_mode: HexMode::default(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            separator: default_separator(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadFile(path.display().to_string(), e))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {0}: {1}")]
    ReadFile(String, std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(String),
}

fn default_allowed_prefix() -> String {
    "/api".into()
}
fn default_separator() -> String {
    "===================".into()
}
// Anything chattier than warn interleaves with the diagnostic records.
fn default_log_level() -> String {
    "warn".into()
}
