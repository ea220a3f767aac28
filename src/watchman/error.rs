//! Subscriber error types.

use std::path::PathBuf;

/// Errors a subscriber can report when asked for its subscriptions.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SubscriberError {
    /// No ancestor of the starting directory holds the watch-service marker.
    #[error("Could not find a watchman directory from the current directory ({})", start.display())]
    RootNotFound {
        /// Directory the upward search started from.
        start: PathBuf,
        /// Marker file that was searched for.
        marker: &'static str,
    },
}
