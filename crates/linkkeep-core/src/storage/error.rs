//! Storage error handling
//!
//! Provides typed errors for storage operations with descriptive messages
//! and recovery suggestions.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to create data or backup directory
    #[error("Failed to create directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Permission denied accessing path
    #[error("Permission denied: cannot access '{path}'. Check file permissions.")]
    PermissionDenied {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Disk is full or quota exceeded
    #[error(
        "Disk full or quota exceeded while writing to '{path}'. Free up disk space and try again."
    )]
    DiskFull {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Failed to read file
    #[error("Failed to read '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Failed to write file
    #[error("Failed to write '{path}': {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Link file could not be parsed and was replaced with an empty one
    #[error("Link file '{path}' is corrupted: {details}. {}", backup_note(.backup_path))]
    CorruptDocument {
        path: PathBuf,
        backup_path: Option<PathBuf>,
        details: String,
    },

    /// File content is not a valid link file
    #[error("Invalid link file format in '{path}': {details}")]
    InvalidFormat { path: PathBuf, details: String },

    /// Serializing the store failed
    #[error("Failed to serialize links: {0}")]
    Serialize(#[from] serde_json::Error),

    /// File not found (when expected to exist)
    #[error("File not found: '{path}'")]
    NotFound { path: PathBuf },

    /// No backups exist to restore from
    #[error("No backups available.")]
    NoBackups,

    /// The requested backup does not exist
    #[error("Backup file not found: {name}")]
    BackupNotFound { name: String },

    /// Atomic write failed during rename
    #[error("Atomic write failed: could not rename '{from}' to '{to}': {source}")]
    AtomicWriteFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Generic I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl StorageError {
    /// Create an error from a failed write, with path context
    ///
    /// Classifies the error based on its kind (permission, disk full, etc.)
    pub fn from_io(error: io::Error, path: PathBuf) -> Self {
        match error.kind() {
            io::ErrorKind::PermissionDenied => StorageError::PermissionDenied {
                path,
                source: error,
            },
            io::ErrorKind::NotFound => StorageError::NotFound { path },
            // StorageFull is not stable on all toolchains, so sniff the message too
            _ if is_disk_full_error(&error) => StorageError::DiskFull {
                path,
                source: error,
            },
            _ => StorageError::WriteError {
                path,
                source: error,
            },
        }
    }

    /// Create an error from a failed read, with path context
    pub fn from_read_io(error: io::Error, path: PathBuf) -> Self {
        match error.kind() {
            io::ErrorKind::PermissionDenied => StorageError::PermissionDenied {
                path,
                source: error,
            },
            io::ErrorKind::NotFound => StorageError::NotFound { path },
            _ => StorageError::ReadError {
                path,
                source: error,
            },
        }
    }

    /// Get a recovery suggestion for this error
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            StorageError::DiskFull { .. } => Some("Free up disk space and try again."),
            StorageError::PermissionDenied { .. } => {
                Some("Check file and directory permissions. You may need to run with different permissions or change ownership.")
            }
            StorageError::CorruptDocument { .. } => {
                Some("The corrupted file was backed up. Restore an earlier backup or recover data from it manually.")
            }
            StorageError::CreateDirectory { .. } => {
                Some("Check that the parent directory exists and you have write permissions.")
            }
            StorageError::NoBackups | StorageError::BackupNotFound { .. } => {
                Some("List available backups with --list-backups.")
            }
            _ => None,
        }
    }
}

fn backup_note(backup_path: &Option<PathBuf>) -> String {
    match backup_path {
        Some(path) => format!("A backup has been created at '{}'.", path.display()),
        None => "No backup was created.".to_string(),
    }
}

/// Check if an I/O error indicates disk full condition
fn is_disk_full_error(error: &io::Error) -> bool {
    let msg = error.to_string().to_lowercase();
    msg.contains("no space left")
        || msg.contains("disk full")
        || msg.contains("quota exceeded")
        || msg.contains("not enough space")
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_denied_classification() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "access denied");
        let err = StorageError::from_io(io_err, PathBuf::from("/test/path"));

        assert!(matches!(err, StorageError::PermissionDenied { .. }));
        assert!(err.recovery_suggestion().is_some());
    }

    #[test]
    fn test_not_found_classification() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err = StorageError::from_io(io_err, PathBuf::from("/missing/file"));

        assert!(matches!(err, StorageError::NotFound { .. }));
    }

    #[test]
    fn test_disk_full_detection() {
        let io_err = io::Error::new(io::ErrorKind::Other, "No space left on device");
        let err = StorageError::from_io(io_err, PathBuf::from("/full/disk"));

        assert!(matches!(err, StorageError::DiskFull { .. }));
        assert!(err.recovery_suggestion().is_some());
    }

    #[test]
    fn test_read_error_classification() {
        let io_err = io::Error::new(io::ErrorKind::InvalidData, "bad bytes");
        let err = StorageError::from_read_io(io_err, PathBuf::from("/data/links.json"));

        assert!(matches!(err, StorageError::ReadError { .. }));
        assert!(err.to_string().contains("Failed to read"));
    }

    #[test]
    fn test_corrupt_document_display() {
        let err = StorageError::CorruptDocument {
            path: PathBuf::from("/data/links.json"),
            backup_path: Some(PathBuf::from("/data/backups/links_backup_20240101_000000.json")),
            details: "expected value at line 1 column 1".to_string(),
        };

        let msg = err.to_string();
        assert!(msg.contains("corrupted"));
        assert!(msg.contains("links_backup_20240101_000000.json"));
    }

    #[test]
    fn test_corrupt_document_without_backup() {
        let err = StorageError::CorruptDocument {
            path: PathBuf::from("/data/links.json"),
            backup_path: None,
            details: "EOF while parsing".to_string(),
        };

        assert!(err.to_string().contains("No backup was created"));
    }
}
