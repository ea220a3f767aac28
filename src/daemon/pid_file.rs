//! Pid file guarding against two daemons for the same subscription.

use std::fs::File;
use std::path::{Path, PathBuf};

/// Errors that can occur while acquiring the pid file.
#[derive(thiserror::Error, Debug)]
pub enum PidFileError {
    /// Another daemon holds the lock for this subscription.
    #[error("Daemon already running ({})", path.display())]
    AlreadyRunning {
        /// Pid recorded by the running daemon, if readable.
        pid: Option<u32>,
        path: PathBuf,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Pid file at `<directory>/<name>/<name>.pid`.
///
/// Holds an exclusive lock on `<name>.lock` next to it for as long as the
/// guard lives. The pid file is removed on drop if it still records our pid.
#[derive(Debug)]
pub struct PidFile {
    path: PathBuf,
    #[cfg(unix)]
    _lock: nix::fcntl::Flock<File>,
    #[cfg(not(unix))]
    _lock: File,
}

impl PidFile {
    /// Lock the subscription and write the current process id.
    ///
    /// A pid file left by a daemon that no longer holds the lock is replaced.
    ///
    /// # Errors
    ///
    /// Returns an error if another daemon holds the lock or the files cannot
    /// be written.
    pub fn acquire(directory: &Path, name: &str) -> Result<Self, PidFileError> {
        let directory = directory.join(name);
        std::fs::create_dir_all(&directory)?;
        let path = directory.join(format!("{name}.pid"));
        let lock_path = directory.join(format!("{name}.lock"));

        let lock_file = std::fs::OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)?;
        let lock = lock_exclusive(lock_file, &path)?;

        if let Some(pid) = read_pid(&path) {
            tracing::debug!(pid, path = %path.display(), "Replacing stale pid file");
        }

        std::fs::write(&path, format!("{}\n", std::process::id()))?;
        tracing::debug!(path = %path.display(), "Pid file written");
        Ok(Self { path, _lock: lock })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(unix)]
fn lock_exclusive(file: File, pid_path: &Path) -> Result<nix::fcntl::Flock<File>, PidFileError> {
    use nix::errno::Errno;
    use nix::fcntl::{Flock, FlockArg};

    match Flock::lock(file, FlockArg::LockExclusiveNonblock) {
        Ok(lock) => Ok(lock),
        Err((_, errno)) if errno == Errno::EWOULDBLOCK => Err(PidFileError::AlreadyRunning {
            pid: read_pid(pid_path),
            path: pid_path.to_path_buf(),
        }),
        Err((_, errno)) => Err(PidFileError::Io(errno.into())),
    }
}

#[cfg(not(unix))]
fn lock_exclusive(file: File, _pid_path: &Path) -> Result<File, PidFileError> {
    Ok(file)
}

impl Drop for PidFile {
    fn drop(&mut self) {
        if read_pid(&self.path) != Some(std::process::id()) {
            return;
        }
        if let Err(e) = std::fs::remove_file(&self.path) {
            tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "Failed to remove pid file"
            );
        }
    }
}

fn read_pid(path: &Path) -> Option<u32> {
    std::fs::read_to_string(path).ok()?.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_acquire_writes_current_pid() {
        let temp_dir = TempDir::new().unwrap();
        let pid_file = PidFile::acquire(temp_dir.path(), "monitor").unwrap();

        assert_eq!(
            pid_file.path(),
            temp_dir.path().join("monitor").join("monitor.pid")
        );
        assert_eq!(read_pid(pid_file.path()), Some(std::process::id()));
        assert!(temp_dir.path().join("monitor").join("monitor.lock").exists());
    }

    #[test]
    fn test_drop_removes_pid_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = {
            let pid_file = PidFile::acquire(temp_dir.path(), "monitor").unwrap();
            pid_file.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn test_stale_pid_file_is_replaced() {
        let temp_dir = TempDir::new().unwrap();
        let directory = temp_dir.path().join("monitor");
        std::fs::create_dir_all(&directory).unwrap();
        std::fs::write(directory.join("monitor.pid"), "2147483000\n").unwrap();

        let pid_file = PidFile::acquire(temp_dir.path(), "monitor").unwrap();
        assert_eq!(read_pid(pid_file.path()), Some(std::process::id()));
    }

    #[cfg(unix)]
    #[test]
    fn test_second_acquire_is_rejected_while_held() {
        let temp_dir = TempDir::new().unwrap();
        let first = PidFile::acquire(temp_dir.path(), "monitor").unwrap();

        match PidFile::acquire(temp_dir.path(), "monitor") {
            Err(PidFileError::AlreadyRunning { pid, path }) => {
                assert_eq!(pid, Some(std::process::id()));
                assert_eq!(path, first.path());
            }
            other => panic!("Expected AlreadyRunning, got {other:?}"),
        }

        // The rejected attempt must not disturb the holder's pid file.
        assert_eq!(read_pid(first.path()), Some(std::process::id()));
        drop(first);

        let second = PidFile::acquire(temp_dir.path(), "monitor").unwrap();
        assert!(second.path().exists());
    }

    #[test]
    fn test_drop_keeps_pid_file_owned_by_another_process() {
        let temp_dir = TempDir::new().unwrap();
        let pid_file = PidFile::acquire(temp_dir.path(), "monitor").unwrap();
        let path = pid_file.path().to_path_buf();
        std::fs::write(&path, "2147483000\n").unwrap();

        drop(pid_file);
        assert_eq!(read_pid(&path), Some(2_147_483_000));
    }
}
