//! Error types for startup, scanning and report writing.
//!
//! Only [`ConfigError`] is fatal. Everything that can go wrong inside a
//! cycle ends up in a [`CycleError`], which the scheduler logs before
//! moving on to the next cycle.

use std::path::PathBuf;
use thiserror::Error;

/// Invalid or unusable configuration, detected before the loop starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("home directory could not be determined; set --claude-dir and --output explicitly")]
    NoHomeDir,

    #[error("Claude directory not found: {}", .0.display())]
    ClaudeDirMissing(PathBuf),

    #[error("Claude projects directory not found: {}", .0.display())]
    ProjectsDirMissing(PathBuf),

    #[error("Claude projects directory {} is not readable: {source}", .path.display())]
    ProjectsDirUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("output directory {} could not be created: {source}", .path.display())]
    OutputDirUnusable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("output path {} is a directory", .0.display())]
    OutputIsDirectory(PathBuf),

    #[error("output directory {} is not writable: {source}", .path.display())]
    OutputNotWritable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{name} must be greater than zero")]
    Zero { name: &'static str },
}

/// Failure to enumerate the transcript root itself.
///
/// Per-entry problems below the root never show up here; the scanner
/// skips those entries.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("session root not found: {}", .0.display())]
    RootMissing(PathBuf),

    #[error("session root {} is not a readable directory: {source}", .path.display())]
    RootUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failure to replace the report file. The previous report is left as is.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("failed to create {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write temporary report in {}: {source}", .dir.display())]
    Temp {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to move report into place at {}: {source}", .path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Everything that can abort a single cycle.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Write(#[from] WriteError),
}
