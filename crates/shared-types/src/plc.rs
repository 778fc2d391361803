//! # Virtual Controllers
//!
//! Each monitored repository area is "controlled" by one virtual PLC. The
//! area table is shared by the seed data, the repository monitor, the
//! artifact generator and the broker link so that paths and ids line up.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Controller model reported by every virtual PLC.
pub const PLC_MODEL: &str = "CompactLogix 5370";
/// Firmware reported by every virtual PLC.
pub const PLC_FIRMWARE: &str = "v32.011";
/// Scan rate in milliseconds.
pub const PLC_SCAN_RATE_MS: u64 = 100;
/// An area counts as recently active if modified within this window.
pub const RECENT_ACTIVITY_SECS: i64 = 300;

/// A monitored directory and its controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepositoryArea {
    /// Display name, e.g. `Client`.
    pub name: &'static str,
    /// Directory relative to the gateway base path.
    pub path: &'static str,
    pub description: &'static str,
    /// 1-based controller number.
    pub plc_number: usize,
}

impl RepositoryArea {
    /// Controller id, e.g. `PLC3`.
    #[must_use]
    pub fn plc_id(&self) -> String {
        format!("PLC{}", self.plc_number)
    }

    /// Namespace path of the area node.
    #[must_use]
    pub fn area_node_path(&self) -> String {
        format!("Enterprise/Site1/{}Area", self.name)
    }

    /// Namespace path of the controller node.
    #[must_use]
    pub fn plc_node_path(&self) -> String {
        format!("{}/{}", self.area_node_path(), self.plc_id())
    }

    /// Path of a system tag under the controller node.
    #[must_use]
    pub fn system_tag_path(&self, tag: &str) -> String {
        format!("{}/System/{}", self.plc_node_path(), tag)
    }

    /// Id used on the broker link, e.g. `PLC_CLIENT`.
    #[must_use]
    pub fn broker_id(&self) -> String {
        format!("PLC_{}", self.name.to_uppercase())
    }
}

/// The ten monitored repository areas.
pub const REPOSITORY_AREAS: [RepositoryArea; 10] = [
    RepositoryArea { name: "Client", path: "client", description: "Frontend application area", plc_number: 1 },
    RepositoryArea { name: "Server", path: "server", description: "Backend services area", plc_number: 2 },
    RepositoryArea { name: "Shared", path: "shared", description: "Common schemas and types", plc_number: 3 },
    RepositoryArea { name: "Components", path: "client/src/components", description: "UI components library", plc_number: 4 },
    RepositoryArea { name: "Services", path: "server/services", description: "Backend service modules", plc_number: 5 },
    RepositoryArea { name: "Types", path: "client/src/types", description: "Type definitions", plc_number: 6 },
    RepositoryArea { name: "Hooks", path: "client/src/hooks", description: "Client custom hooks", plc_number: 7 },
    RepositoryArea { name: "Pages", path: "client/src/pages", description: "Application pages", plc_number: 8 },
    RepositoryArea { name: "Assets", path: "attached_assets", description: "Static assets and resources", plc_number: 9 },
    RepositoryArea { name: "Workspace", path: "workspace", description: "Working directory", plc_number: 10 },
];

/// Looks up an area by its directory path.
#[must_use]
pub fn area_by_path(path: &str) -> Option<&'static RepositoryArea> {
    let trimmed = path.trim_matches('/');
    REPOSITORY_AREAS.iter().find(|a| a.path == trimmed)
}

/// Operational status of a virtual PLC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlcStatus {
    Initializing,
    Running,
    Active,
    Warning,
    Error,
    Offline,
}

impl PlcStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            PlcStatus::Initializing => "Initializing",
            PlcStatus::Running => "Running",
            PlcStatus::Active => "Active",
            PlcStatus::Warning => "Warning",
            PlcStatus::Error => "Error",
            PlcStatus::Offline => "Offline",
        }
    }
}

impl std::fmt::Display for PlcStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Values written into a controller's `tags.system` block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlcSystemSnapshot {
    pub file_count: u64,
    /// Megabytes, one decimal.
    pub directory_size: String,
    pub last_modified: DateTime<Utc>,
    /// Percent, one decimal.
    pub processing_load: String,
    pub status: PlcStatus,
}

/// Synthetic load: `fileCount * 0.5 + MB * 0.1`, clamped to `[5, 95]`.
#[must_use]
pub fn processing_load(file_count: u64, size_mb: f64) -> f64 {
    (file_count as f64 * 0.5 + size_mb * 0.1).clamp(5.0, 95.0)
}

/// Whether `last_modified` falls inside the recent-activity window.
#[must_use]
pub fn is_recent(last_modified: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    (now - last_modified).num_seconds() < RECENT_ACTIVITY_SECS
}
