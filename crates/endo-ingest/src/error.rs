//! Error types for menu configuration ingestion.
//!
//! Only file-system failures are errors. Problems with the configuration
//! text itself are reported as [`ConfigWarning`](crate::ConfigWarning)s.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading a menu configuration file.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Configuration file not found.
    #[error("menu CSV not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Failed to read file.
    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File exceeds the configured size limit.
    #[error("menu CSV {path} is {size} bytes, exceeding the {max_size} byte limit")]
    FileTooLarge {
        path: PathBuf,
        size: u64,
        max_size: u64,
    },
}

impl IngestError {
    pub(crate) fn io(path: &std::path::Path, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            IngestError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            IngestError::FileRead {
                path: path.to_path_buf(),
                source: err,
            }
        }
    }
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;
