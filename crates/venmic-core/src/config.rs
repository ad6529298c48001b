//! Patchbay configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};

/// Patchbay configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Capture target settings
    #[serde(default)]
    pub target: TargetConfig,
    /// Server round-trip settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Candidate selection
    #[serde(default)]
    pub filter: FilterConfig,
    /// Logging
    #[serde(default)]
    pub log: LogConfig,
}

/// The node matched streams are linked into.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// `node.name` of the capture target
    #[serde(default = "default_target_name")]
    pub name: String,
    /// Human-readable description of the virtual microphone
    #[serde(default = "default_target_description")]
    pub description: String,
    /// Create the virtual microphone instead of using an existing node
    #[serde(default = "default_true")]
    pub create: bool,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            name: default_target_name(),
            description: default_target_description(),
            create: true,
        }
    }
}

fn default_target_name() -> String {
    "venmic-capture".to_string()
}

fn default_target_description() -> String {
    "venmic virtual microphone".to_string()
}

fn default_true() -> bool {
    true
}

/// Server round-trip settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Upper bound for any single round trip with PipeWire
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Delay before reconciling after a burst of graph events
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
}

impl ServerConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.max(1))
    }

    #[must_use]
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { timeout_ms: default_timeout_ms(), settle_ms: default_settle_ms() }
    }
}

fn default_timeout_ms() -> u64 {
    5000
}

fn default_settle_ms() -> u64 {
    100
}

/// Candidate selection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Only nodes with this `media.class` are listed and linked
    #[serde(default = "default_stream_class")]
    pub stream_class: String,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self { stream_class: default_stream_class() }
    }
}

fn default_stream_class() -> String {
    "Stream/Output/Audio".to_string()
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Default tracing directive, `RUST_LOG` takes precedence
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { level: default_log_level() }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Load configuration from the default location, or defaults if absent.
pub fn load_config() -> Result<Config> {
    match config_path() {
        Some(path) => load_config_from(&path),
        None => {
            info!("No config directory available, using defaults");
            Ok(Config::default())
        }
    }
}

/// Load configuration from `path`, or defaults if the file does not exist.
pub fn load_config_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        info!(?path, "Config file not found, using defaults");
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Failed to read {}: {e}", path.display())))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse {}: {e}", path.display())))
}

/// Get the configuration file path.
#[must_use]
pub fn config_path() -> Option<PathBuf> {
    ProjectDirs::from("dev", "venmic", "venmic").map(|dirs| dirs.config_dir().join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(&dir.path().join("absent.toml")).unwrap();

        assert_eq!(config.target.name, "venmic-capture");
        assert!(config.target.create);
        assert_eq!(config.server.timeout(), Duration::from_secs(5));
        assert_eq!(config.filter.stream_class, "Stream/Output/Audio");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[target]\nname = \"screen-share\"\ncreate = false\n\n[server]\ntimeout_ms = 250\n")
            .unwrap();

        let config = load_config_from(&path).unwrap();
        assert_eq!(config.target.name, "screen-share");
        assert!(!config.target.create);
        assert_eq!(config.target.description, "venmic virtual microphone");
        assert_eq!(config.server.timeout(), Duration::from_millis(250));
        assert_eq!(config.server.settle_ms, 100);
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server]\ntimeout_ms = \"soon\"\n").unwrap();

        assert_matches!(load_config_from(&path), Err(Error::Config(_)));
    }

    #[test]
    fn test_zero_timeout_is_clamped() {
        let server = ServerConfig { timeout_ms: 0, settle_ms: 0 };
        assert_eq!(server.timeout(), Duration::from_millis(1));
        assert_eq!(server.settle(), Duration::ZERO);
    }
}
