//! Error types for the directory scanner

use std::io;
use thiserror::Error;

/// Errors returned by scanner operations.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Path not found: {0}")]
    NotFound(String),

    #[error("Path {0} is not a directory")]
    NotADirectory(String),

    #[error("Path {0} is not a file")]
    NotAFile(String),

    #[error("File {path} is too large to read: {size} > {limit} bytes")]
    FileTooLarge { path: String, size: u64, limit: u64 },

    #[error("Invalid search pattern: {0}")]
    InvalidPattern(String),

    #[error("Path {0} resolves outside the base directory")]
    OutsideBase(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
}

impl ScanError {
    /// Classify an I/O error raised while touching `path`.
    pub(crate) fn io(path: &str, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            Self::NotFound(path.to_string())
        } else {
            Self::Io {
                path: path.to_string(),
                source,
            }
        }
    }
}
