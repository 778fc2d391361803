//! Applies inbound broker messages to the path registry.

use chrono::{DateTime, Utc};
use hmi_01_uns_registry::seed::SITE_PATH;
use hmi_01_uns_registry::PathRegistry;
use serde_json::{json, Value};
use shared_types::{AlarmCondition, AlarmType, NewTagAlarm, TagAlarm, UnsTag};
use tracing::{debug, info, warn};

use crate::domain::messages::{BrokerMessage, PlcTelemetry};

/// Default priority of an alarm raised by a remote controller.
pub const REMOTE_ALARM_PRIORITY: u32 = 500;

/// Registry changes caused by one message.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ingested {
    pub tags: Vec<UnsTag>,
    pub alarm: Option<TagAlarm>,
}

impl Ingested {
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty() && self.alarm.is_none()
    }
}

pub fn apply_message(
    registry: &PathRegistry,
    message: &BrokerMessage,
    now: DateTime<Utc>,
) -> Ingested {
    match message {
        BrokerMessage::Telemetry { plc_id, telemetry } => Ingested {
            tags: apply_telemetry(registry, plc_id, telemetry),
            alarm: None,
        },
        BrokerMessage::Status { plc_id, report } => Ingested {
            tags: apply_status(registry, plc_id, &report.status).into_iter().collect(),
            alarm: None,
        },
        BrokerMessage::Alarm { plc_id, alarm } => Ingested {
            tags: Vec::new(),
            alarm: raise_remote_alarm(registry, plc_id, alarm, now),
        },
        BrokerMessage::SystemEvent { source, event } => {
            debug!(source = %source, event = %event, "Broker system event");
            Ingested::default()
        }
    }
}

fn apply_telemetry(registry: &PathRegistry, plc_id: &str, telemetry: &PlcTelemetry) -> Vec<UnsTag> {
    let base = format!("{SITE_PATH}/{}Area/{plc_id}/System", telemetry.area_name);
    let size_mb = telemetry.directory_size as f64 / (1024.0 * 1024.0);
    let writes = [
        ("FileCount", telemetry.file_count.to_string()),
        ("DirectorySize", format!("{size_mb:.1}")),
        ("ProcessingLoad", telemetry.processing_load.to_string()),
        ("Status", telemetry.status.to_string()),
        ("LastModified", telemetry.last_modified.to_rfc3339()),
    ];

    let updated: Vec<UnsTag> = writes
        .into_iter()
        .filter_map(|(tag, value)| registry.update_tag_value(&format!("{base}/{tag}"), value, None))
        .collect();
    debug!(plc = plc_id, updated = updated.len(), "Applied broker telemetry");
    updated
}

/// The `System/Status` tag of the first controller whose path names `plc_id`.
fn apply_status(registry: &PathRegistry, plc_id: &str, status: &str) -> Option<UnsTag> {
    let target = registry.all_tags().into_iter().find(|tag| {
        tag.tag_path.ends_with("/System/Status")
            && tag.tag_path.split('/').any(|segment| segment == plc_id)
    });
    match target {
        Some(tag) => registry.update_tag_value(&tag.tag_path, status, None),
        None => {
            debug!(plc = plc_id, "No status tag for broker status update");
            None
        }
    }
}

fn raise_remote_alarm(
    registry: &PathRegistry,
    plc_id: &str,
    alarm: &Value,
    now: DateTime<Utc>,
) -> Option<TagAlarm> {
    let alarm_id = match alarm.get("alarmId") {
        Some(Value::String(id)) => id.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => now.timestamp_millis().to_string(),
    };
    let plc_path = format!("{SITE_PATH}/Industrial/{plc_id}");

    let data = NewTagAlarm {
        alarm_path: format!("{plc_path}/Alarms/{alarm_id}"),
        tag_path: plc_path,
        alarm_type: alarm
            .get("type")
            .and_then(|t| serde_json::from_value(t.clone()).ok())
            .unwrap_or(AlarmType::Process),
        condition: alarm
            .get("condition")
            .and_then(|c| serde_json::from_value(c.clone()).ok())
            .unwrap_or_else(|| AlarmCondition::greater_than(0.0)),
        priority: alarm
            .get("priority")
            .and_then(Value::as_u64)
            .and_then(|p| u32::try_from(p).ok())
            .unwrap_or(REMOTE_ALARM_PRIORITY),
        is_active: true,
        is_acknowledged: false,
        message: alarm
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| format!("PLC {plc_id} Alarm")),
        active_time: Some(now),
        metadata: json!({ "source": "MQTT", "plcId": plc_id, "originalAlarm": alarm }),
    };

    match registry.create_alarm(data) {
        Ok(alarm) => {
            info!(alarm = %alarm.alarm_path, priority = alarm.priority, "Remote alarm raised");
            Some(alarm)
        }
        Err(e) => {
            warn!(plc = plc_id, error = %e, "Rejected remote alarm");
            None
        }
    }
}
