// src/error.rs

//! Error types for apkdex

use thiserror::Error;

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while syncing or querying the package index
#[derive(Error, Debug)]
pub enum Error {
    /// SQLite operation failed
    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be read or is invalid
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Failed to set up a component (HTTP client, database directory, ...)
    #[error("Initialization error: {0}")]
    InitError(String),

    /// Fetching a remote blob failed
    #[error("Download error: {0}")]
    DownloadError(String),

    /// The external dump tool failed or produced unusable output
    #[error("Decode error: {0}")]
    DecodeError(String),

    /// The dump text violated the indentation grammar
    #[error("Malformed dump at line {line}: {reason}")]
    MalformedDump { line: usize, reason: String },

    /// The write lock could not be acquired within the retry budget
    #[error("Storage is locked by another writer (gave up after {attempts} attempts)")]
    StorageBusy { attempts: u32 },

    /// Requested record does not exist
    #[error("Not found: {0}")]
    NotFoundError(String),
}

impl Error {
    /// Build a structural dump error for the given 1-based line number
    pub fn malformed(line: usize, reason: impl Into<String>) -> Self {
        Self::MalformedDump {
            line,
            reason: reason.into(),
        }
    }

    /// Whether this is a SQLite busy/locked failure worth retrying
    pub fn is_lock_contention(&self) -> bool {
        match self {
            Error::DatabaseError(rusqlite::Error::SqliteFailure(err, _)) => matches!(
                err.code,
                rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
            ),
            _ => false,
        }
    }
}
