//! Storage error handling
//!
//! Provides typed errors for storage operations with descriptive messages
//! and recovery suggestions.

use std::io;
use std::path::PathBuf;

use rusqlite::ErrorCode;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to create data directory
    #[error("Failed to create data directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The database could not be opened at all
    #[error("Storage unavailable: cannot open journal database '{path}': {source}")]
    Unavailable {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Permission denied or database opened read-only
    #[error("Permission denied: cannot write journal database '{path}'. Check file permissions.")]
    PermissionDenied {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Disk is full or quota exceeded
    #[error(
        "Disk full or quota exceeded while writing to '{path}'. Free up disk space and try again."
    )]
    QuotaExceeded {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// The database file is damaged or not a database
    #[error("Journal database '{path}' is corrupted: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Any other failed statement or transaction
    #[error("Database error: {0}")]
    Transaction(#[from] rusqlite::Error),

    /// Record could not be encoded
    #[error("Failed to encode entry: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StorageError {
    /// Create an error from a SQLite error with path context
    ///
    /// Classifies the error based on its result code (cannot open,
    /// permission, disk full, corruption).
    pub fn from_sqlite(error: rusqlite::Error, path: PathBuf) -> Self {
        let code = match &error {
            rusqlite::Error::SqliteFailure(failure, _) => Some(failure.code),
            _ => None,
        };

        match code {
            Some(ErrorCode::CannotOpen) => StorageError::Unavailable {
                path,
                source: error,
            },
            Some(ErrorCode::PermissionDenied)
            | Some(ErrorCode::ReadOnly)
            | Some(ErrorCode::AuthorizationForStatementDenied) => StorageError::PermissionDenied {
                path,
                source: error,
            },
            Some(ErrorCode::DiskFull) => StorageError::QuotaExceeded {
                path,
                source: error,
            },
            Some(ErrorCode::DatabaseCorrupt) | Some(ErrorCode::NotADatabase) => {
                StorageError::Corrupt {
                    path,
                    source: error,
                }
            }
            _ if is_disk_full_error(&error) => StorageError::QuotaExceeded {
                path,
                source: error,
            },
            _ => StorageError::Transaction(error),
        }
    }

    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            StorageError::QuotaExceeded { .. }
                | StorageError::PermissionDenied { .. }
                | StorageError::Unavailable { .. }
        )
    }

    /// Get a recovery suggestion for this error
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            StorageError::QuotaExceeded { .. } => Some("Free up disk space and try again."),
            StorageError::PermissionDenied { .. } => {
                Some("Check file and directory permissions on the data directory.")
            }
            StorageError::Unavailable { .. } => {
                Some("Check that the data directory exists and is on a writable volume.")
            }
            StorageError::Corrupt { .. } => {
                Some("Restore from a journal-backup-all.json backup, or move the database aside to start fresh.")
            }
            StorageError::CreateDirectory { .. } => {
                Some("Check that the parent directory exists and you have write permissions.")
            }
            _ => None,
        }
    }
}

/// Check if a SQLite error message indicates a disk full condition
fn is_disk_full_error(error: &rusqlite::Error) -> bool {
    let msg = error.to_string().to_lowercase();
    msg.contains("no space left")
        || msg.contains("disk full")
        || msg.contains("database or disk is full")
        || msg.contains("quota exceeded")
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
