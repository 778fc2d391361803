//! Repository area monitoring.
//!
//! Each tick scans every monitored area and mirrors the statistics into the
//! controller's system tags, its deployed `.plc/plc-config.json` and, when the
//! broker link is up, a telemetry message.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use hmi_01_uns_registry::PathRegistry;
use hmi_02_fs_scanner::RepositoryScanner;
use hmi_04_broker_link::{BrokerLink, PlcTelemetry};
use hmi_05_plc_deployment::PlcDeployer;
use shared_types::{
    is_recent, processing_load, DirectoryStats, PlcStatus, PlcSystemSnapshot, RepositoryArea,
    REPOSITORY_AREAS,
};
use tracing::{debug, warn};

pub struct RepositoryMonitor {
    registry: Arc<PathRegistry>,
    scanner: RepositoryScanner,
    deployer: Option<Arc<PlcDeployer>>,
    broker: Option<Arc<BrokerLink>>,
}

impl RepositoryMonitor {
    pub fn new(registry: Arc<PathRegistry>, scanner: RepositoryScanner) -> Self {
        Self {
            registry,
            scanner,
            deployer: None,
            broker: None,
        }
    }

    /// Also refresh deployed controller configs.
    pub fn with_deployer(mut self, deployer: Arc<PlcDeployer>) -> Self {
        self.deployer = Some(deployer);
        self
    }

    /// Also publish telemetry while the link is connected.
    pub fn with_broker(mut self, broker: Arc<BrokerLink>) -> Self {
        self.broker = Some(broker);
        self
    }

    /// Scan every area once and propagate the results. Returns the stats in
    /// area table order.
    pub async fn tick(&self, now: DateTime<Utc>) -> Vec<DirectoryStats> {
        let all = self.scanner.scan_all_areas().await;

        for (area, stats) in REPOSITORY_AREAS.iter().zip(&all) {
            let snapshot = system_snapshot(stats, now);
            self.write_tags(area, &snapshot);

            if let Some(deployer) = &self.deployer {
                if let Err(e) = deployer.update_plc_status(area.path, &snapshot).await {
                    warn!(area = area.name, error = %e, "Controller config refresh failed");
                }
            }
        }

        if let Some(broker) = self.broker.as_ref().filter(|b| b.is_connected()) {
            let mut sent = 0usize;
            for (area, stats) in REPOSITORY_AREAS.iter().zip(&all) {
                if broker
                    .publish_telemetry(&PlcTelemetry::from_stats(area, stats, now))
                    .await
                {
                    sent += 1;
                }
            }
            debug!(sent, "Controller telemetry published");
        }

        all
    }

    fn write_tags(&self, area: &RepositoryArea, snapshot: &PlcSystemSnapshot) {
        let updates = [
            ("FileCount", snapshot.file_count.to_string()),
            ("DirectorySize", snapshot.directory_size.clone()),
            ("LastModified", snapshot.last_modified.to_rfc3339()),
            ("ProcessingLoad", snapshot.processing_load.clone()),
            ("Status", snapshot.status.to_string()),
        ];
        for (name, value) in updates {
            // Missing tags are skipped; the registry may have been reseeded.
            self.registry
                .update_tag_value(&area.system_tag_path(name), value, None);
        }
    }
}

/// Controller system values for one area scan.
pub fn system_snapshot(stats: &DirectoryStats, now: DateTime<Utc>) -> PlcSystemSnapshot {
    let size_mb = stats.size_mb();
    PlcSystemSnapshot {
        file_count: stats.file_count,
        directory_size: format!("{size_mb:.1}"),
        last_modified: stats.last_modified,
        processing_load: format!("{:.1}", processing_load(stats.file_count, size_mb)),
        status: if is_recent(stats.last_modified, now) {
            PlcStatus::Active
        } else {
            PlcStatus::Running
        },
    }
}
