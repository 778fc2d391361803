//! Simulated file operations and system metrics shown on the dashboard.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle of a simulated file operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl OperationStatus {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, OperationStatus::Completed | OperationStatus::Failed)
    }
}

/// A queued file operation (sync, backup, copy, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileOperation {
    pub id: Uuid,
    /// Operation kind, e.g. `SYNC_CHANGES` or `BACKUP_DIR`.
    #[serde(rename = "type")]
    pub kind: String,
    pub target: String,
    pub status: OperationStatus,
    /// 0..=100
    pub progress: u8,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Client request to queue an operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFileOperation {
    #[serde(rename = "type")]
    pub kind: String,
    pub target: String,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

/// Snapshot of the simulated gateway health metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemMetrics {
    pub cpu_usage: f64,
    pub memory_usage: f64,
    #[serde(rename = "diskIO")]
    pub disk_io: f64,
    /// KB/s
    pub throughput: u64,
    pub operations_per_min: u64,
    /// Percentage times 100.
    pub error_rate: u64,
    pub timestamp: DateTime<Utc>,
}

impl Default for SystemMetrics {
    fn default() -> Self {
        Self {
            cpu_usage: 25.3,
            memory_usage: 67.8,
            disk_io: 42.1,
            throughput: 1200,
            operations_per_min: 847,
            error_rate: 30,
            timestamp: Utc::now(),
        }
    }
}
