//! FileSystem HMI gateway entry point.

use anyhow::Result;
use hmi_runtime::{HmiRuntime, RuntimeConfig};
use hmi_telemetry::{init_logging, TelemetryConfig};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let telemetry = TelemetryConfig::from_env();
    init_logging(&telemetry)?;
    info!(service = %telemetry.service_name, version = env!("CARGO_PKG_VERSION"), "Starting");

    let config = RuntimeConfig::from_env();
    let runtime = HmiRuntime::new(config)?;

    runtime
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "Failed to listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        })
        .await
}
