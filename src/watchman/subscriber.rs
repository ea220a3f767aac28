//! The capability a daemon needs from anything that subscribes to file changes.

use super::{Notification, Subscription, SubscriberError};

/// A client of the watch service.
///
/// The daemon loop drives implementors through this trait only: it asks for
/// the subscriptions once, registers them, then forwards every notification
/// addressed to [`Subscriber::name`].
pub trait Subscriber: Send {
    /// Stable identifier correlating requests and notifications.
    fn name(&self) -> &str;

    /// Subscriptions to register with the watch service.
    ///
    /// # Errors
    ///
    /// Returns an error if the subscriptions cannot be built, e.g. when no
    /// watch root exists.
    fn subscriptions(&self) -> Result<&[Subscription], SubscriberError>;

    /// React to one notification batch. Must not panic on unexpected shapes.
    fn handle_notification(&mut self, notification: &Notification);
}
