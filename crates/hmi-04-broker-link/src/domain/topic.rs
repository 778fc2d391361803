//! Typed broker topics.

use std::fmt;

use crate::error::BrokerError;

const ROOT: &str = "industrial";

/// Patterns subscribed on connect.
pub const SUBSCRIPTIONS: [&str; 4] = [
    "industrial/plc/+/telemetry",
    "industrial/plc/+/status",
    "industrial/alarms/+",
    "industrial/events/+",
];

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Topic {
    PlcTelemetry(String),
    PlcStatus(String),
    Alarm(String),
    Event(String),
    Command(String),
}

impl Topic {
    pub fn parse(topic: &str) -> Result<Self, BrokerError> {
        let invalid = || BrokerError::InvalidTopic(topic.to_string());
        let parts: Vec<&str> = topic.split('/').collect();
        if parts.first() != Some(&ROOT) || parts.iter().any(|p| p.is_empty()) {
            return Err(invalid());
        }

        match parts[1..] {
            ["plc", id, "telemetry"] => Ok(Topic::PlcTelemetry(id.to_string())),
            ["plc", id, "status"] => Ok(Topic::PlcStatus(id.to_string())),
            ["alarms", id] => Ok(Topic::Alarm(id.to_string())),
            ["events", source] => Ok(Topic::Event(source.to_string())),
            ["commands", plc] => Ok(Topic::Command(plc.to_string())),
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Topic::PlcTelemetry(id) => write!(f, "{ROOT}/plc/{id}/telemetry"),
            Topic::PlcStatus(id) => write!(f, "{ROOT}/plc/{id}/status"),
            Topic::Alarm(id) => write!(f, "{ROOT}/alarms/{id}"),
            Topic::Event(source) => write!(f, "{ROOT}/events/{source}"),
            Topic::Command(plc) => write!(f, "{ROOT}/commands/{plc}"),
        }
    }
}
