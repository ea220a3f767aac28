//! Local watch service backed by notify.
//!
//! Watches each subscription root recursively, debounces raw events into
//! batches and evaluates the subscription expressions against the current
//! state of every changed path.

use std::collections::{BTreeSet, VecDeque};
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use notify_debouncer_full::{
    new_debouncer,
    notify::{EventKind, RecommendedWatcher, RecursiveMode},
    DebounceEventResult, Debouncer, RecommendedCache,
};
use serde_json::{json, Map, Value};
use tokio::sync::mpsc;

use super::{ServiceError, WatchService};
use crate::watchman::{Field, FileSnapshot, FileType, Notification, Subscription};

/// Watch service running in-process on top of notify.
///
/// Notifications follow the watchman shape: `subscription`, `root`, `files`,
/// `is_fresh_instance` and `unilateral`. File names are relative to the root.
/// Deleted files are never reported because the subscription expressions are
/// evaluated against the file's current metadata.
pub struct NotifyWatchService {
    debouncer: Debouncer<RecommendedWatcher, RecommendedCache>,
    batches: mpsc::UnboundedReceiver<DebounceEventResult>,
    subscriptions: Vec<Subscription>,
    pending: VecDeque<Notification>,
}

impl NotifyWatchService {
    /// Create a new service that batches events over `debounce`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying file watcher cannot be created.
    pub fn new(debounce: Duration) -> Result<Self, ServiceError> {
        let (batch_tx, batches) = mpsc::unbounded_channel();

        let debouncer = new_debouncer(debounce, None, move |result: DebounceEventResult| {
            let _ = batch_tx.send(result);
        })?;

        Ok(Self {
            debouncer,
            batches,
            subscriptions: Vec::new(),
            pending: VecDeque::new(),
        })
    }

    /// Registered subscriptions, with canonicalized roots.
    #[must_use]
    pub fn subscriptions(&self) -> &[Subscription] {
        &self.subscriptions
    }

    /// Build one notification per subscription matching any of `paths`.
    fn notifications_for(&self, paths: &BTreeSet<PathBuf>) -> Vec<Notification> {
        self.subscriptions
            .iter()
            .filter_map(|subscription| {
                let fields: Vec<Field> = subscription
                    .query()
                    .fields
                    .iter()
                    .filter_map(|name| Field::parse(name))
                    .collect();

                let files: Vec<Value> = paths
                    .iter()
                    .filter_map(|path| {
                        let name = path.strip_prefix(subscription.root()).ok()?;
                        let (file_type, size, empty) = inspect(path);
                        let snapshot = FileSnapshot {
                            name,
                            file_type,
                            size,
                            empty,
                        };
                        subscription
                            .query()
                            .expression
                            .matches(&snapshot)
                            .then(|| file_entry(&fields, &snapshot))
                    })
                    .collect();

                if files.is_empty() {
                    return None;
                }

                tracing::debug!(
                    subscription = subscription.name(),
                    files = files.len(),
                    "Subscription matched changed files"
                );

                let mut body = Map::new();
                body.insert("subscription".into(), json!(subscription.name()));
                body.insert(
                    "root".into(),
                    json!(subscription.root().to_string_lossy()),
                );
                body.insert("files".into(), Value::Array(files));
                body.insert("is_fresh_instance".into(), Value::Bool(false));
                body.insert("unilateral".into(), Value::Bool(true));
                Some(Notification::new(body))
            })
            .collect()
    }
}

#[async_trait]
impl WatchService for NotifyWatchService {
    async fn subscribe(&mut self, subscription: &Subscription) -> Result<(), ServiceError> {
        let root = subscription
            .root()
            .canonicalize()
            .map_err(|source| ServiceError::RootNotWatchable {
                path: subscription.root().to_path_buf(),
                source,
            })?;

        self.debouncer.watch(&root, RecursiveMode::Recursive)?;

        tracing::info!(
            subscription = subscription.name(),
            root = %root.display(),
            "Subscribed to file changes"
        );

        self.subscriptions.push(Subscription::new(
            root,
            subscription.name(),
            subscription.query().clone(),
        ));
        Ok(())
    }

    async fn next_notification(&mut self) -> Option<Result<Notification, ServiceError>> {
        loop {
            if let Some(notification) = self.pending.pop_front() {
                return Some(Ok(notification));
            }

            match self.batches.recv().await? {
                Ok(events) => {
                    let paths: BTreeSet<PathBuf> = events
                        .iter()
                        .filter(|event| !matches!(event.kind, EventKind::Access(_)))
                        .flat_map(|event| event.paths.iter().cloned())
                        .collect();
                    let notifications = self.notifications_for(&paths);
                    self.pending.extend(notifications);
                }
                Err(errors) => {
                    let mut errors = errors.into_iter();
                    if let Some(first) = errors.next() {
                        for error in errors {
                            tracing::warn!(error = %error, "File watcher error");
                        }
                        return Some(Err(ServiceError::Notify(first)));
                    }
                }
            }
        }
    }
}

/// Current type, size and emptiness of `path`. Missing paths and special
/// files report no type.
fn inspect(path: &Path) -> (Option<FileType>, u64, bool) {
    let Ok(metadata) = std::fs::symlink_metadata(path) else {
        return (None, 0, false);
    };

    let kind = metadata.file_type();
    if kind.is_symlink() {
        (Some(FileType::Symlink), metadata.len(), false)
    } else if kind.is_dir() {
        let empty = std::fs::read_dir(path)
            .map(|mut entries| entries.next().is_none())
            .unwrap_or(false);
        (Some(FileType::Directory), metadata.len(), empty)
    } else if kind.is_file() {
        (Some(FileType::Regular), metadata.len(), metadata.len() == 0)
    } else {
        (None, metadata.len(), false)
    }
}

fn file_entry(fields: &[Field], file: &FileSnapshot<'_>) -> Value {
    let name = file.name.to_string_lossy().into_owned();
    if fields == [Field::Name] {
        return Value::String(name);
    }

    let mut entry = Map::new();
    for field in fields {
        match field {
            Field::Name => {
                entry.insert("name".into(), Value::String(name.clone()));
            }
            Field::Exists => {
                entry.insert("exists".into(), Value::Bool(file.exists()));
            }
            Field::Size => {
                entry.insert("size".into(), json!(file.size));
            }
            Field::Type => {
                let code = file
                    .file_type
                    .map_or(Value::Null, |file_type| json!(file_type.code()));
                entry.insert("type".into(), code);
            }
        }
    }
    Value::Object(entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::watchman::{Expression, SubscriptionQuery};
    use tempfile::TempDir;

    fn python_subscription(root: &Path, fields: &[&str]) -> Subscription {
        Subscription::new(
            root.to_path_buf(),
            "test_subscription",
            SubscriptionQuery {
                expression: Expression::all_of([
                    Expression::Type(FileType::Regular),
                    Expression::not(Expression::Empty),
                    Expression::any_of([Expression::suffix("py")]),
                ]),
                fields: fields.iter().map(|f| (*f).to_string()).collect(),
            },
        )
    }

    async fn subscribed_service(root: &Path, fields: &[&str]) -> Option<NotifyWatchService> {
        let mut service = match NotifyWatchService::new(Duration::from_millis(50)) {
            Ok(service) => service,
            Err(e) => {
                eprintln!("Skipping test due to system limit: {e}");
                return None;
            }
        };
        match service.subscribe(&python_subscription(root, fields)).await {
            Ok(()) => Some(service),
            Err(ServiceError::Notify(e)) => {
                eprintln!("Skipping test due to system limit: {e}");
                None
            }
            Err(e) => panic!("Unexpected error: {e}"),
        }
    }

    #[tokio::test]
    async fn test_subscribe_canonicalizes_root() {
        let temp_dir = TempDir::new().unwrap();
        let Some(service) = subscribed_service(temp_dir.path(), &["name"]).await else {
            return;
        };

        let canonical = temp_dir.path().canonicalize().unwrap();
        assert_eq!(service.subscriptions().len(), 1);
        assert_eq!(service.subscriptions()[0].root(), canonical);
    }

    #[tokio::test]
    async fn test_subscribe_missing_root() {
        let Ok(mut service) = NotifyWatchService::new(Duration::from_millis(50)) else {
            return;
        };
        let result = service
            .subscribe(&python_subscription(Path::new("/nonexistent/root"), &["name"]))
            .await;
        assert!(matches!(
            result,
            Err(ServiceError::RootNotWatchable { .. })
        ));
    }

    #[tokio::test]
    async fn test_notifications_filter_by_expression() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().canonicalize().unwrap();
        std::fs::create_dir(root.join("pkg")).unwrap();
        std::fs::write(root.join("pkg/module.py"), "x = 1\n").unwrap();
        std::fs::write(root.join("pkg/__init__.py"), "").unwrap();
        std::fs::write(root.join("notes.txt"), "hello").unwrap();

        let Some(service) = subscribed_service(&root, &["name"]).await else {
            return;
        };

        let paths: BTreeSet<PathBuf> = [
            root.join("pkg/module.py"),
            root.join("pkg/__init__.py"),
            root.join("notes.txt"),
            root.join("deleted.py"),
            PathBuf::from("/outside/root.py"),
        ]
        .into_iter()
        .collect();

        let notifications = service.notifications_for(&paths);
        assert_eq!(notifications.len(), 1);

        let notification = &notifications[0];
        assert_eq!(notification.subscription(), Some("test_subscription"));
        assert_eq!(notification.root(), Some(root.as_path()));
        assert_eq!(notification.files(), vec![PathBuf::from("pkg/module.py")]);
        assert_eq!(notification.get("unilateral"), Some(&Value::Bool(true)));
        assert!(!notification.is_fresh_instance());
    }

    #[tokio::test]
    async fn test_notifications_without_matches() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().canonicalize().unwrap();
        std::fs::write(root.join("notes.txt"), "hello").unwrap();

        let Some(service) = subscribed_service(&root, &["name"]).await else {
            return;
        };

        let paths: BTreeSet<PathBuf> = [root.join("notes.txt")].into_iter().collect();
        assert!(service.notifications_for(&paths).is_empty());
    }

    #[tokio::test]
    async fn test_notifications_with_multiple_fields() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().canonicalize().unwrap();
        std::fs::write(root.join("module.py"), "abc").unwrap();

        let Some(service) = subscribed_service(&root, &["name", "size", "type", "exists"]).await
        else {
            return;
        };

        let paths: BTreeSet<PathBuf> = [root.join("module.py")].into_iter().collect();
        let notifications = service.notifications_for(&paths);
        assert_eq!(notifications.len(), 1);
        assert_eq!(
            notifications[0].get("files"),
            Some(&json!([{"name": "module.py", "size": 3, "type": "f", "exists": true}]))
        );
        assert_eq!(notifications[0].files(), vec![PathBuf::from("module.py")]);
    }

    #[tokio::test]
    async fn test_detects_file_write() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().canonicalize().unwrap();

        let Some(mut service) = subscribed_service(&root, &["name"]).await else {
            return;
        };

        // Give watcher time to initialize
        tokio::time::sleep(Duration::from_millis(50)).await;
        std::fs::write(root.join("changed.py"), "x = 1\n").unwrap();

        let event =
            tokio::time::timeout(Duration::from_secs(2), service.next_notification()).await;

        // It's okay if we timeout on slow CI systems
        if let Ok(Some(Ok(notification))) = event {
            assert_eq!(notification.files(), vec![PathBuf::from("changed.py")]);
        }
    }

    #[test]
    fn test_inspect_kinds() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("a.py");
        std::fs::write(&file, "abc").unwrap();
        let empty_dir = temp_dir.path().join("empty");
        std::fs::create_dir(&empty_dir).unwrap();

        assert_eq!(inspect(&file), (Some(FileType::Regular), 3, false));
        assert_eq!(inspect(&empty_dir).0, Some(FileType::Directory));
        assert!(inspect(&empty_dir).2);
        assert_eq!(inspect(&temp_dir.path().join("missing")), (None, 0, false));
    }
}
