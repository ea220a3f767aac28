//! Notifications pushed by the watch service.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One push notification from the watch service.
///
/// The body is kept as an opaque JSON object. Accessors read the well-known
/// watchman keys without validating anything else.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Notification(Map<String, Value>);

impl Notification {
    #[must_use]
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    #[must_use]
    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Name of the subscription this notification belongs to.
    #[must_use]
    pub fn subscription(&self) -> Option<&str> {
        self.0.get("subscription").and_then(Value::as_str)
    }

    #[must_use]
    pub fn root(&self) -> Option<&Path> {
        self.0.get("root").and_then(Value::as_str).map(Path::new)
    }

    /// Changed file names, relative to the root.
    ///
    /// Accepts both the bare-string form used when only `name` was requested
    /// and the object form used for multiple fields.
    #[must_use]
    pub fn files(&self) -> Vec<PathBuf> {
        let Some(Value::Array(files)) = self.0.get("files") else {
            return Vec::new();
        };
        files
            .iter()
            .filter_map(|file| match file {
                Value::String(name) => Some(name.as_str()),
                Value::Object(fields) => fields.get("name").and_then(Value::as_str),
                _ => None,
            })
            .map(PathBuf::from)
            .collect()
    }

    #[must_use]
    pub fn is_fresh_instance(&self) -> bool {
        self.0
            .get("is_fresh_instance")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

impl From<Map<String, Value>> for Notification {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(&self.0) {
            Ok(body) => f.write_str(&body),
            Err(_) => write!(f, "{:?}", self.0),
        }
    }
}
