//! Watch-service error types.

use std::path::PathBuf;

/// Errors raised by a watch-service backend.
#[derive(thiserror::Error, Debug)]
pub enum ServiceError {
    /// The subscription root cannot be watched.
    #[error("Cannot watch root {path}: {source}")]
    RootNotWatchable {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Notify watcher error.
    #[error("File watcher error: {0}")]
    Notify(#[from] notify::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The service connection or event channel closed.
    #[error("Watch service closed")]
    Closed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_not_watchable_display() {
        let err = ServiceError::RootNotWatchable {
            path: PathBuf::from("/missing"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        assert_eq!(err.to_string(), "Cannot watch root /missing: not found");
    }

    #[test]
    fn test_closed_display() {
        assert_eq!(ServiceError::Closed.to_string(), "Watch service closed");
    }

    #[test]
    fn test_from_notify_error() {
        let notify_err = notify::Error::generic("test error");
        let service_err: ServiceError = notify_err.into();
        assert!(matches!(service_err, ServiceError::Notify(_)));
        assert!(service_err.to_string().contains("File watcher error"));
    }
}
