//! Watch-service subscription model.
//!
//! Types here mirror the watchman query language: a subscriber hands out
//! named [`Subscription`]s whose [`Expression`] filters which file changes the
//! service pushes back as [`Notification`]s.

mod error;
mod expression;
mod notification;
mod subscriber;
mod subscription;

pub use error::SubscriberError;
pub use expression::{Expression, FileSnapshot, FileType};
pub use notification::Notification;
pub use subscriber::Subscriber;
pub use subscription::{Field, Subscription, SubscriptionQuery};

/// Marker file identifying a watchman project root.
pub const WATCHMAN_CONFIG_FILE: &str = ".watchmanconfig";
