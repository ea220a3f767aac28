//! The daemon event loop.

use std::path::PathBuf;

use tokio_util::sync::CancellationToken;

use super::{DaemonError, PidFile};
use crate::service::WatchService;
use crate::watchman::{Notification, Subscriber};

/// How the daemon loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaemonExit {
    /// Cancelled through the token.
    Cancelled,
    /// The watch service stopped delivering notifications.
    ServiceClosed,
}

/// Runs one subscriber against one watch service.
#[derive(Debug)]
pub struct Daemon {
    log_directory: PathBuf,
}

impl Daemon {
    /// Create a daemon keeping its pid file under `log_directory`.
    #[must_use]
    pub fn new(log_directory: PathBuf) -> Self {
        Self { log_directory }
    }

    /// Register the subscriber's subscriptions and dispatch notifications
    /// until `cancel` fires or the service closes.
    ///
    /// # Errors
    ///
    /// Returns an error if the pid file cannot be acquired, the subscriber
    /// cannot build its subscriptions, or the service rejects one of them.
    /// Errors while waiting for notifications are logged and skipped.
    pub async fn run(
        &self,
        subscriber: &mut dyn Subscriber,
        service: &mut dyn WatchService,
        cancel: CancellationToken,
    ) -> Result<DaemonExit, DaemonError> {
        let pid_file = PidFile::acquire(&self.log_directory, subscriber.name())?;

        let subscriptions = subscriber.subscriptions()?.to_vec();
        for subscription in &subscriptions {
            service.subscribe(subscription).await?;
        }

        tracing::info!(
            name = subscriber.name(),
            subscriptions = subscriptions.len(),
            pid_file = %pid_file.path().display(),
            "Daemon started"
        );

        let mut dispatched: usize = 0;
        let exit = loop {
            tokio::select! {
                biased;

                () = cancel.cancelled() => {
                    tracing::info!("Daemon cancelled");
                    break DaemonExit::Cancelled;
                }
                next = service.next_notification() => match next {
                    Some(Ok(notification)) => {
                        if dispatch(subscriber, &notification) {
                            dispatched = dispatched.saturating_add(1);
                        }
                    }
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "Watch service error");
                    }
                    None => {
                        tracing::info!("Watch service closed");
                        break DaemonExit::ServiceClosed;
                    }
                }
            }
        };

        tracing::info!(dispatched, exit = ?exit, "Daemon stopped");
        Ok(exit)
    }
}

/// Forward a notification unless it names another subscription.
fn dispatch(subscriber: &mut dyn Subscriber, notification: &Notification) -> bool {
    match notification.subscription() {
        Some(name) if name != subscriber.name() => {
            tracing::debug!(subscription = name, "Skipping notification for other subscription");
            false
        }
        _ => {
            subscriber.handle_notification(notification);
            true
        }
    }
}
