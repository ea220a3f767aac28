//! Watch-service backends.
//!
//! The daemon talks to the file-watching service through [`WatchService`].
//! [`NotifyWatchService`] is a local backend built on the `notify` crate that
//! evaluates subscription expressions itself and emits watchman-shaped
//! notifications.

mod error;
mod local;

use async_trait::async_trait;

use crate::watchman::{Notification, Subscription};

pub use error::ServiceError;
pub use local::NotifyWatchService;

/// A file-watching service that accepts subscriptions and pushes notifications.
#[async_trait]
pub trait WatchService: Send {
    /// Register a subscription. Notifications for it follow from
    /// [`WatchService::next_notification`].
    ///
    /// # Errors
    ///
    /// Returns an error if the service cannot watch the subscription root.
    async fn subscribe(&mut self, subscription: &Subscription) -> Result<(), ServiceError>;

    /// Wait for the next notification. `None` once the service has shut down.
    async fn next_notification(&mut self) -> Option<Result<Notification, ServiceError>>;
}
