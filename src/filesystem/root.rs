//! Upward search for a marker file.

use std::path::{Path, PathBuf};

/// Find the nearest ancestor of `start` (inclusive) that contains `marker`.
///
/// Walks toward the filesystem root one parent at a time and stops at the
/// first directory holding an entry named `marker`.
///
/// Returns `None` when no ancestor contains the marker. Unreadable
/// directories are treated as not containing it.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use typecheck_monitor::filesystem::find_root;
///
/// assert_eq!(find_root(Path::new("/nonexistent/a/b"), "no-such-marker-file"), None);
/// ```
#[must_use]
pub fn find_root(start: &Path, marker: &str) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|directory| directory.join(marker).exists())
        .map(Path::to_path_buf)
}
