//! # Runtime Configuration
//!
//! Unified configuration for every subsystem, read from `HMI_*` environment
//! variables on top of the defaults.
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `HMI_HTTP_HOST` | `0.0.0.0` | Gateway bind address |
//! | `HMI_HTTP_PORT` / `PORT` | `5000` | Gateway port |
//! | `HMI_CORS_ORIGINS` | `*` | Comma separated allowed origins |
//! | `HMI_BASE_PATH` | `.` | Directory served by the scanner and monitored per area |
//! | `HMI_SCAN_TTL_SECS` | `5` | Directory scan cache lifetime |
//! | `HMI_METRICS_INTERVAL_MS` | `2000` | Metric random walk period |
//! | `HMI_REPOSITORY_INTERVAL_MS` | `5000` | Repository monitoring period |
//! | `HMI_OPERATIONS_INTERVAL_MS` | `1000` | Operation progress period |
//! | `HMI_BROKER_ENABLED` | `true` | Attempt a broker connection |
//! | `HMI_BROKER_URL` | `mqtt://localhost:1883` | Broker address |
//! | `HMI_BROKER_CONNECT_TIMEOUT_MS` | `3000` | Broker handshake timeout |
//! | `HMI_DEPLOY_PLCS` | `true` | Write controller artifacts at startup |
//!
//! Unparseable values are logged and ignored.

use hmi_04_broker_link::{BrokerConfig, BrokerError};
use hmi_06_api_gateway::domain::ConfigError;
use hmi_06_api_gateway::GatewayConfig;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// Complete process configuration.
#[derive(Debug, Clone, Default)]
pub struct RuntimeConfig {
    /// HTTP and push channel.
    pub gateway: GatewayConfig,
    /// Scanned directory tree.
    pub storage: StorageConfig,
    /// Periodic task intervals.
    pub simulator: SimulatorConfig,
    /// Optional telemetry broker.
    pub broker: BrokerConfig,
    /// Controller artifact generation.
    pub deployment: DeploymentConfig,
}

/// Scanned directory tree.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Root of every file-system route and of the repository areas.
    pub base_path: PathBuf,
    /// Directory scan cache lifetime.
    pub scan_ttl: Duration,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from("."),
            scan_ttl: hmi_02_fs_scanner::DEFAULT_SCAN_TTL,
        }
    }
}

/// Periodic task intervals.
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    pub metrics_interval: Duration,
    pub repository_interval: Duration,
    pub operations_interval: Duration,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            metrics_interval: Duration::from_secs(2),
            repository_interval: Duration::from_secs(5),
            operations_interval: Duration::from_secs(1),
        }
    }
}

/// Controller artifact generation.
#[derive(Debug, Clone)]
pub struct DeploymentConfig {
    /// Write `.plc/` and `.hmi/` artifacts into every area at startup.
    pub enabled: bool,
}

impl Default for DeploymentConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum RuntimeConfigError {
    #[error("gateway: {0}")]
    Gateway(#[from] ConfigError),

    #[error("broker: {0}")]
    Broker(#[from] BrokerError),

    #[error("{0}")]
    Invalid(String),
}

impl RuntimeConfig {
    /// Defaults overridden by the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by `lookup`, which maps a variable name to its
    /// value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        override_parsed(&lookup, "HMI_HTTP_HOST", &mut config.gateway.http.host);
        override_parsed(&lookup, "PORT", &mut config.gateway.http.port);
        override_parsed(&lookup, "HMI_HTTP_PORT", &mut config.gateway.http.port);
        if let Some(origins) = lookup("HMI_CORS_ORIGINS") {
            config.gateway.cors.allowed_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(String::from)
                .collect();
        }

        if let Some(base) = lookup("HMI_BASE_PATH") {
            config.storage.base_path = PathBuf::from(base);
        }
        override_secs(&lookup, "HMI_SCAN_TTL_SECS", &mut config.storage.scan_ttl);

        override_millis(&lookup, "HMI_METRICS_INTERVAL_MS", &mut config.simulator.metrics_interval);
        override_millis(
            &lookup,
            "HMI_REPOSITORY_INTERVAL_MS",
            &mut config.simulator.repository_interval,
        );
        override_millis(
            &lookup,
            "HMI_OPERATIONS_INTERVAL_MS",
            &mut config.simulator.operations_interval,
        );

        override_parsed(&lookup, "HMI_BROKER_ENABLED", &mut config.broker.enabled);
        if let Some(url) = lookup("HMI_BROKER_URL") {
            config.broker.url = url;
        }
        override_millis(
            &lookup,
            "HMI_BROKER_CONNECT_TIMEOUT_MS",
            &mut config.broker.connect_timeout,
        );

        override_parsed(&lookup, "HMI_DEPLOY_PLCS", &mut config.deployment.enabled);

        config
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<(), RuntimeConfigError> {
        self.gateway.validate()?;
        self.broker.validate()?;

        if self.storage.scan_ttl.is_zero() {
            return Err(RuntimeConfigError::Invalid("scan TTL cannot be 0".into()));
        }
        let intervals = [
            ("metrics", self.simulator.metrics_interval),
            ("repository", self.simulator.repository_interval),
            ("operations", self.simulator.operations_interval),
        ];
        if let Some((name, _)) = intervals.iter().find(|(_, d)| d.is_zero()) {
            return Err(RuntimeConfigError::Invalid(format!(
                "{name} interval cannot be 0"
            )));
        }
        Ok(())
    }
}

fn override_parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, target: &mut T) {
    let Some(raw) = lookup(key) else { return };
    match raw.trim().parse() {
        Ok(value) => *target = value,
        Err(_) => warn!(variable = key, value = %raw, "Ignoring unparseable setting"),
    }
}

fn override_secs(lookup: &impl Fn(&str) -> Option<String>, key: &str, target: &mut Duration) {
    let mut secs = target.as_secs();
    override_parsed(lookup, key, &mut secs);
    *target = Duration::from_secs(secs);
}

fn override_millis(lookup: &impl Fn(&str) -> Option<String>, key: &str, target: &mut Duration) {
    let mut millis = target.as_millis() as u64;
    override_parsed(lookup, key, &mut millis);
    *target = Duration::from_millis(millis);
}
