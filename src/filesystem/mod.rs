//! Filesystem helpers shared by the monitor and the daemon.

mod analysis_directory;
mod root;

pub use analysis_directory::AnalysisDirectory;
pub use root::find_root;
