//! Payloads exchanged with the broker.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared_types::{is_recent, processing_load, DirectoryStats, PlcStatus, RepositoryArea};

use crate::domain::topic::Topic;
use crate::error::BrokerError;

/// Periodic controller telemetry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlcTelemetry {
    pub plc_id: String,
    pub area_name: String,
    pub control_path: String,
    pub file_count: u64,
    /// Bytes.
    pub directory_size: u64,
    pub processing_load: f64,
    pub status: PlcStatus,
    pub last_modified: DateTime<Utc>,
    pub timestamp: DateTime<Utc>,
}

impl PlcTelemetry {
    /// Telemetry for `area` derived from a repository scan.
    pub fn from_stats(area: &RepositoryArea, stats: &DirectoryStats, now: DateTime<Utc>) -> Self {
        Self {
            plc_id: area.broker_id(),
            area_name: area.name.to_string(),
            control_path: area.path.to_string(),
            file_count: stats.file_count,
            directory_size: stats.total_size,
            processing_load: processing_load(stats.file_count, stats.size_mb()),
            status: determine_plc_status(stats, now),
            last_modified: stats.last_modified,
            timestamp: now,
        }
    }
}

/// Status classification used for broker telemetry.
///
/// More than 100 files is `Warning`; more than 50 with recent activity is
/// `Active`; any files at all is `Running`; an empty area is `Offline`.
pub fn determine_plc_status(stats: &DirectoryStats, now: DateTime<Utc>) -> PlcStatus {
    if stats.file_count > 100 {
        PlcStatus::Warning
    } else if stats.file_count > 50 && is_recent(stats.last_modified, now) {
        PlcStatus::Active
    } else if stats.file_count > 0 {
        PlcStatus::Running
    } else {
        PlcStatus::Offline
    }
}

/// Body of a `.../status` message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub status: String,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub metadata: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandKind {
    EmergencyStop,
    ResetAlarms,
    Restart,
    ScanDirectory,
    BackupFiles,
}

/// Operator command addressed to one controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScadaCommand {
    #[serde(rename = "targetPLC")]
    pub target_plc: String,
    pub command: CommandKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
}

/// A decoded inbound message.
#[derive(Debug, Clone, PartialEq)]
pub enum BrokerMessage {
    Telemetry { plc_id: String, telemetry: PlcTelemetry },
    Status { plc_id: String, report: StatusReport },
    Alarm { plc_id: String, alarm: Value },
    SystemEvent { source: String, event: Value },
}

impl BrokerMessage {
    /// Decode a payload received on `topic`.
    ///
    /// Command topics are outbound only and are rejected.
    pub fn decode(topic: &str, payload: Value) -> Result<Self, BrokerError> {
        let malformed = |source| BrokerError::Payload {
            topic: topic.to_string(),
            source,
        };
        match Topic::parse(topic)? {
            Topic::PlcTelemetry(plc_id) => Ok(BrokerMessage::Telemetry {
                plc_id,
                telemetry: serde_json::from_value(payload).map_err(malformed)?,
            }),
            Topic::PlcStatus(plc_id) => Ok(BrokerMessage::Status {
                plc_id,
                report: serde_json::from_value(payload).map_err(malformed)?,
            }),
            Topic::Alarm(plc_id) => Ok(BrokerMessage::Alarm {
                plc_id,
                alarm: payload,
            }),
            Topic::Event(source) => Ok(BrokerMessage::SystemEvent {
                source,
                event: payload,
            }),
            Topic::Command(_) => Err(BrokerError::InvalidTopic(topic.to_string())),
        }
    }
}
