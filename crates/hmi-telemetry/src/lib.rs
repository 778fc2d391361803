//! # HMI Telemetry
//!
//! Structured logging for the gateway process.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use hmi_telemetry::{init_logging, TelemetryConfig};
//!
//! let config = TelemetryConfig::from_env();
//! init_logging(&config)?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `HMI_SERVICE_NAME` | `filesystem-hmi` | Service name attached to startup logs |
//! | `HMI_LOG_LEVEL` / `RUST_LOG` | `info` | Log level filter |
//! | `HMI_JSON_LOGS` | `true` in containers | Emit JSON lines instead of pretty output |

mod config;
mod logging;

pub use config::TelemetryConfig;
pub use logging::init_logging;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Invalid log filter: {0}")]
    Filter(String),

    #[error("Failed to install subscriber: {0}")]
    Install(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_install_is_an_error() {
        let config = TelemetryConfig::default();
        // Another test in this binary may have installed one already
        let _ = init_logging(&config);
        assert!(matches!(init_logging(&config), Err(TelemetryError::Install(_))));
    }
}
