//! Configuration file loader.

use std::path::{Path, PathBuf};

use super::MonitorConfig;

/// Name of the per-project configuration file.
pub const CONFIG_FILE_NAME: &str = ".typecheck-monitor.toml";

/// Configuration loader that searches multiple locations.
#[derive(Debug)]
pub struct ConfigLoader {
    /// Search paths in order of priority.
    search_paths: Vec<PathBuf>,
}

impl ConfigLoader {
    /// Create a loader searching the project directory, then the user config directory.
    #[must_use]
    pub fn new(current_directory: &Path) -> Self {
        let mut search_paths = Vec::new();

        // 1. Project directory: .typecheck-monitor.toml
        search_paths.push(current_directory.join(CONFIG_FILE_NAME));

        // 2. User config directory: ~/.config/typecheck-monitor/config.toml
        if let Some(config_dir) = dirs::config_dir() {
            search_paths.push(config_dir.join("typecheck-monitor").join("config.toml"));
        }

        Self { search_paths }
    }

    /// Create a config loader with a specific config file path.
    #[must_use]
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            search_paths: vec![path],
        }
    }

    /// Load configuration from the first available file, or return defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be parsed.
    pub fn load(&self) -> Result<MonitorConfig, ConfigError> {
        let Some(path) = self.find_config_file() else {
            tracing::debug!(search_paths = ?self.search_paths, "No config file found, using defaults");
            return Ok(MonitorConfig::default());
        };

        tracing::debug!(path = %path.display(), "Loading config file");
        Self::load_from_path(&path)
    }

    fn load_from_path(path: &Path) -> Result<MonitorConfig, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Find the first config file that exists.
    #[must_use]
    pub fn find_config_file(&self) -> Option<PathBuf> {
        self.search_paths.iter().find(|p| p.exists()).cloned()
    }
}

/// Errors that can occur during configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
}
