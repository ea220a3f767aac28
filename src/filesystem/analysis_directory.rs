//! The project's source tree as seen by the type-checking daemon.

use std::path::{Path, PathBuf};

/// Logical source tree the daemon analyzes.
///
/// The monitor only carries this through to its collaborators; shadowing the
/// tree into a separate directory happens elsewhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisDirectory {
    root: PathBuf,
}

impl AnalysisDirectory {
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root() {
        let directory = AnalysisDirectory::new(PathBuf::from("/project"));
        assert_eq!(directory.root(), Path::new("/project"));
    }
}
