//! Configuration types.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Project configuration consumed by the monitor daemon.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MonitorConfig {
    /// Extensions to watch beyond `py` and `pyi`, without a leading dot.
    pub extensions: Vec<String>,
    /// Directory for daemon state such as pid files, relative to the current directory.
    pub log_directory: PathBuf,
    /// Debounce window of the local watch backend, in milliseconds.
    pub debounce_ms: u64,
}

fn default_log_directory() -> PathBuf {
    PathBuf::from(".pyre")
}

fn default_debounce_ms() -> u64 {
    100
}

impl MonitorConfig {
    #[must_use]
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            extensions: Vec::new(),
            log_directory: default_log_directory(),
            debounce_ms: default_debounce_ms(),
        }
    }
}
