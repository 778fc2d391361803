//! Error types for the path registry

use thiserror::Error;

/// Errors returned by registry writes.
///
/// Lookups never fail; a miss is `None` or an empty list.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Configuration {0} is read-only")]
    ReadOnly(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl RegistryError {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}
