//! Telemetry configuration from environment variables.

use std::env;

const DEFAULT_SERVICE_NAME: &str = "filesystem-hmi";

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Attached to the startup log line
    pub service_name: String,
    /// A level (`debug`) or a directive list (`info,hmi_02_fs_scanner=trace`).
    /// `RUST_LOG` still wins when set.
    pub log_level: String,
    pub json_logs: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

impl TelemetryConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable source. JSON output is switched on
    /// automatically inside Kubernetes or Docker unless `HMI_JSON_LOGS`
    /// says otherwise.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let in_container =
            lookup("KUBERNETES_SERVICE_HOST").is_some() || lookup("DOCKER_CONTAINER").is_some();

        Self {
            service_name: lookup("HMI_SERVICE_NAME")
                .unwrap_or_else(|| DEFAULT_SERVICE_NAME.to_string()),
            log_level: lookup("HMI_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            json_logs: lookup("HMI_JSON_LOGS")
                .map(|v| parse_flag(&v))
                .unwrap_or(in_container),
        }
    }
}

pub(crate) fn parse_flag(value: &str) -> bool {
    value.eq_ignore_ascii_case("true") || value == "1"
}
