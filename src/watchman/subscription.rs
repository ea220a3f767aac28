//! Named subscriptions registered with the watch service.

use std::path::{Path, PathBuf};

use serde::Serialize;

use super::Expression;

/// Query body of a subscription: which files match and which fields to report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubscriptionQuery {
    pub expression: Expression,
    pub fields: Vec<String>,
}

/// A named, standing request bound to a watch root.
///
/// Immutable once built; the subscriber that created it owns it for the life
/// of the daemon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    root: PathBuf,
    name: String,
    query: SubscriptionQuery,
}

impl Subscription {
    #[must_use]
    pub fn new(root: PathBuf, name: impl Into<String>, query: SubscriptionQuery) -> Self {
        Self {
            root,
            name: name.into(),
            query,
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn query(&self) -> &SubscriptionQuery {
        &self.query
    }

    /// Render the watchman `subscribe` command for this subscription.
    ///
    /// # Errors
    ///
    /// Returns an error if the root path is not valid UTF-8.
    pub fn to_command(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(("subscribe", &self.root, &self.name, &self.query))
    }
}

/// Fields the watch service can report per changed file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Exists,
    Size,
    Type,
}

impl Field {
    /// Parse a field name, ignoring names this crate does not know.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "name" => Some(Self::Name),
            "exists" => Some(Self::Exists),
            "size" => Some(Self::Size),
            "type" => Some(Self::Type),
            _ => None,
        }
    }
}
