//! Daemon event loop driving a [`Subscriber`](crate::watchman::Subscriber).
//!
//! The loop only knows the subscriber and watch-service traits: it asks the
//! subscriber for its subscriptions, registers them, and forwards every
//! notification addressed to the subscriber until cancelled.

mod error;
mod pid_file;
mod runner;

pub use error::DaemonError;
pub use pid_file::{PidFile, PidFileError};
pub use runner::{Daemon, DaemonExit};
