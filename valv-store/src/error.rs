//! Error types for local artifact production and storage.

use thiserror::Error;
use valv_core::BackupCategory;

/// Errors from the local storage leaf.
///
/// Production variants are fatal to a backup run; scan and deletion
/// failures are left to the caller, which treats them as best-effort.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("could not launch backup tool for {category}: {source}")]
    Spawn {
        category: BackupCategory,
        source: std::io::Error,
    },

    #[error("backup tool for {category} exited with status {status}: {stderr}")]
    Failed {
        category: BackupCategory,
        status: i32,
        stderr: String,
    },

    #[error("backup tool for {category} timed out after {seconds}s")]
    TimedOut {
        category: BackupCategory,
        seconds: u64,
    },

    #[error("produced artifact for {category} cannot be read back: {source}")]
    Unreadable {
        category: BackupCategory,
        source: std::io::Error,
    },

    #[error("database connection string is not configured")]
    MissingDatabaseUrl,

    #[error("local storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}
