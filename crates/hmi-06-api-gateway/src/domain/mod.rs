//! Gateway domain: configuration and error mapping.

pub mod config;
pub mod error;

pub use config::{ConfigError, CorsConfig, GatewayConfig, LimitsConfig, TimeoutConfig, WebSocketConfig};
pub use error::{ApiError, ApiResult, GatewayError};
