//! Daemon error types.

use crate::service::ServiceError;
use crate::watchman::SubscriberError;

use super::PidFileError;

/// Errors that stop the daemon.
#[derive(thiserror::Error, Debug)]
pub enum DaemonError {
    /// The subscriber could not produce its subscriptions.
    #[error(transparent)]
    Subscriber(#[from] SubscriberError),

    /// The watch service rejected a subscription.
    #[error("Watch service error: {0}")]
    Service(#[from] ServiceError),

    /// Another daemon holds the pid file, or it cannot be written.
    #[error("Pid file error: {0}")]
    PidFile(#[from] PidFileError),
}

impl DaemonError {
    /// Whether the failure is a missing watch root.
    ///
    /// The monitor usually runs as a detached child, so the entry point exits
    /// with status 0 for this case instead of reporting a startup failure.
    #[must_use]
    pub fn is_root_not_found(&self) -> bool {
        matches!(self, Self::Subscriber(SubscriberError::RootNotFound { .. }))
    }
}
