//! Typecheck Monitor - file-change subscription for a type-checking daemon.

pub mod config;
pub mod daemon;
pub mod filesystem;
pub mod monitor;
pub mod options;
pub mod service;
pub mod watchman;
