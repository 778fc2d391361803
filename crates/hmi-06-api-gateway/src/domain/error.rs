//! API error responses.
//!
//! Every failed request answers with a JSON body `{message, error}` where
//! `message` names the failed action and `error` carries the underlying
//! cause when there is one.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use hmi_01_uns_registry::RegistryError;
use hmi_02_fs_scanner::ScanError;
use hmi_05_plc_deployment::DeploymentError;
use serde::Serialize;
use std::fmt;

/// REST error with HTTP status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub error: Option<String>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            error: None,
        }
    }

    /// Attach the underlying cause
    pub fn with_error(mut self, error: impl fmt::Display) -> Self {
        self.error = Some(error.to_string());
        self
    }

    /// 404 `"{what} not found"`
    pub fn not_found(what: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, format!("{what} not found"))
    }

    pub fn bad_request(message: impl Into<String>, error: impl fmt::Display) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message).with_error(error)
    }

    pub fn internal(message: impl Into<String>, error: impl fmt::Display) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message).with_error(error)
    }

    /// Registry write failure. Lookups never produce these.
    pub fn registry(message: impl Into<String>, err: RegistryError) -> Self {
        let status = match err {
            RegistryError::NotFound(_) => StatusCode::NOT_FOUND,
            RegistryError::Validation(_) | RegistryError::ReadOnly(_) => StatusCode::BAD_REQUEST,
        };
        Self::new(status, message).with_error(err)
    }

    /// Directory scanner failure
    pub fn scan(message: impl Into<String>, err: ScanError) -> Self {
        let status = match err {
            ScanError::NotFound(_) => StatusCode::NOT_FOUND,
            ScanError::InvalidPattern(_) | ScanError::OutsideBase(_) => StatusCode::BAD_REQUEST,
            ScanError::NotADirectory(_)
            | ScanError::NotAFile(_)
            | ScanError::FileTooLarge { .. }
            | ScanError::Io { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, message).with_error(err)
    }

    /// Artifact lookup failure
    pub fn deployment(message: impl Into<String>, err: DeploymentError) -> Self {
        let status = match err {
            DeploymentError::NotFound(_) => StatusCode::NOT_FOUND,
            DeploymentError::InvalidPath(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, message).with_error(err)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error {
            Some(error) => write!(f, "[{}] {}: {}", self.status.as_u16(), self.message, error),
            None => write!(f, "[{}] {}", self.status.as_u16(), self.message),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = self.status.as_u16(), message = %self.message, error = ?self.error, "Request failed");
        } else {
            tracing::debug!(status = self.status.as_u16(), message = %self.message, "Request rejected");
        }
        let body = ErrorBody {
            message: &self.message,
            error: self.error.as_deref(),
        };
        (self.status, Json(body)).into_response()
    }
}

// Body and query decoding failures are always the client's fault.

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::bad_request("Invalid request body", rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::bad_request("Invalid query string", rejection.body_text())
    }
}

/// Result type for REST handlers
pub type ApiResult<T> = Result<T, ApiError>;

/// Gateway-level errors (startup and serving)
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(#[from] crate::domain::config::ConfigError),

    /// Server socket bind error
    #[error("server bind error on {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// Server terminated with an error
    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}
