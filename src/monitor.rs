//! File-change subscription for the type-checking daemon.
//!
//! [`ProjectFilesMonitor`] turns the project configuration into a single
//! watchman subscription over source files and receives the resulting change
//! notifications.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::config::MonitorConfig;
use crate::filesystem::{find_root, AnalysisDirectory};
use crate::options::StartupOptions;
use crate::watchman::{
    Expression, FileType, Notification, Subscriber, SubscriberError, Subscription,
    SubscriptionQuery, WATCHMAN_CONFIG_FILE,
};

/// Name of the monitor's subscription; stable across daemon restarts.
pub const SUBSCRIPTION_NAME: &str = "pyre_file_change_subscription";

/// Extensions that are always watched.
pub const BASE_EXTENSIONS: [&str; 2] = ["py", "pyi"];

/// Subscribes to changes of the project's source files.
///
/// The watch root is resolved eagerly at construction but only reported when
/// the subscriptions are requested. The outcome, including a missing root, is
/// computed at most once.
#[derive(Debug)]
pub struct ProjectFilesMonitor {
    current_directory: PathBuf,
    analysis_directory: AnalysisDirectory,
    extensions: BTreeSet<String>,
    watchman_root: Option<PathBuf>,
    subscriptions: OnceLock<Result<Vec<Subscription>, SubscriberError>>,
}

impl ProjectFilesMonitor {
    #[must_use]
    pub fn new(
        options: &StartupOptions,
        config: &MonitorConfig,
        analysis_directory: AnalysisDirectory,
    ) -> Self {
        let extensions = BASE_EXTENSIONS
            .iter()
            .map(|extension| (*extension).to_string())
            .chain(config.extensions.iter().cloned())
            .collect();
        let watchman_root = find_root(&options.current_directory, WATCHMAN_CONFIG_FILE);

        tracing::debug!(
            current_directory = %options.current_directory.display(),
            watchman_root = ?watchman_root,
            "Project files monitor created"
        );

        Self {
            current_directory: options.current_directory.clone(),
            analysis_directory,
            extensions,
            watchman_root,
            subscriptions: OnceLock::new(),
        }
    }

    /// Watched extensions, deduplicated and sorted.
    #[must_use]
    pub fn extensions(&self) -> &BTreeSet<String> {
        &self.extensions
    }

    /// Nearest ancestor of the current directory holding `.watchmanconfig`.
    #[must_use]
    pub fn watchman_root(&self) -> Option<&Path> {
        self.watchman_root.as_deref()
    }

    #[must_use]
    pub fn analysis_directory(&self) -> &AnalysisDirectory {
        &self.analysis_directory
    }

    /// Whether the subscriptions have been built.
    #[must_use]
    pub fn is_subscribed(&self) -> bool {
        matches!(self.subscriptions.get(), Some(Ok(_)))
    }

    fn build_subscription(&self, root: &Path) -> Subscription {
        let suffixes = self
            .extensions
            .iter()
            .map(|extension| Expression::suffix(extension.as_str()));
        let query = SubscriptionQuery {
            expression: Expression::all_of([
                Expression::Type(FileType::Regular),
                Expression::not(Expression::Empty),
                Expression::any_of(suffixes),
            ]),
            fields: vec!["name".to_string()],
        };
        Subscription::new(root.to_path_buf(), SUBSCRIPTION_NAME, query)
    }
}

impl Subscriber for ProjectFilesMonitor {
    fn name(&self) -> &str {
        SUBSCRIPTION_NAME
    }

    fn subscriptions(&self) -> Result<&[Subscription], SubscriberError> {
        self.subscriptions
            .get_or_init(|| match self.watchman_root.as_deref() {
                Some(root) => Ok(vec![self.build_subscription(root)]),
                None => {
                    tracing::error!(
                        current_directory = %self.current_directory.display(),
                        "Could not find a watchman directory from the current directory ({})",
                        self.current_directory.display()
                    );
                    Err(SubscriberError::RootNotFound {
                        start: self.current_directory.clone(),
                        marker: WATCHMAN_CONFIG_FILE,
                    })
                }
            })
            .as_deref()
            .map_err(Clone::clone)
    }

    fn handle_notification(&mut self, notification: &Notification) {
        tracing::error!("Received response from watchman: {notification}");
    }
}
