//! Startup options shared by the CLI and the daemon.

use std::path::{Path, PathBuf};

use crate::config::MonitorConfig;

/// Options the daemon is started with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartupOptions {
    /// Directory the daemon was launched from.
    pub current_directory: PathBuf,
    /// Overrides the configured log directory.
    pub log_directory: Option<PathBuf>,
}

impl StartupOptions {
    #[must_use]
    pub fn new(current_directory: PathBuf) -> Self {
        Self {
            current_directory,
            log_directory: None,
        }
    }

    #[must_use]
    pub fn with_log_directory(mut self, log_directory: PathBuf) -> Self {
        self.log_directory = Some(log_directory);
        self
    }

    /// Log directory to use, relative paths resolved against the current directory.
    #[must_use]
    pub fn resolve_log_directory(&self, config: &MonitorConfig) -> PathBuf {
        let log_directory = self
            .log_directory
            .as_deref()
            .unwrap_or(config.log_directory.as_path());
        self.resolve(log_directory)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.current_directory.join(path)
        }
    }
}
