//! Error types for artifact deployment

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeploymentError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Malformed controller config {path}: {source}")]
    MalformedConfig {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Controller config {0} has no tags.system block")]
    MissingSystemBlock(PathBuf),

    #[error("Artifact not found: {0}")]
    NotFound(PathBuf),

    #[error("Invalid area path: {0}")]
    InvalidPath(String),
}

impl DeploymentError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        if source.kind() == io::ErrorKind::NotFound {
            Self::NotFound(path)
        } else {
            Self::Io { path, source }
        }
    }
}
