//! # Push-Channel Events
//!
//! Outbound events ([`HmiEvent`]) and inbound client commands
//! ([`ClientCommand`]) share the same adjacently tagged envelope:
//!
//! ```json
//! { "type": "METRICS_UPDATE", "data": { "cpuUsage": 31.2, ... } }
//! ```

use serde::{Deserialize, Serialize};
use shared_types::{
    DirectoryStructure, DirectorySummary, FileOperation, NewFileOperation, SystemMetrics,
    TagAlarm, UnsTag,
};

/// Full state sent once when a client connects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitialSnapshot {
    pub directories: Vec<DirectorySummary>,
    /// Active, unacknowledged alarms.
    pub alarms: Vec<TagAlarm>,
    pub metrics: SystemMetrics,
    pub operations: Vec<FileOperation>,
}

/// Server-to-client event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HmiEvent {
    InitialData(InitialSnapshot),
    MetricsUpdate(SystemMetrics),
    TagValueUpdated(UnsTag),
    AlarmAcknowledged(TagAlarm),
    AlarmRaised(TagAlarm),
    OperationCreated(FileOperation),
    OperationUpdated(FileOperation),
    DirectoriesUpdate(Vec<DirectorySummary>),
    FilesUpdate(DirectoryStructure),
}

impl HmiEvent {
    /// Topic used for subscription filtering.
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            HmiEvent::InitialData(_) => EventTopic::Snapshot,
            HmiEvent::MetricsUpdate(_) => EventTopic::Metrics,
            HmiEvent::TagValueUpdated(_) => EventTopic::Tags,
            HmiEvent::AlarmAcknowledged(_) | HmiEvent::AlarmRaised(_) => EventTopic::Alarms,
            HmiEvent::OperationCreated(_) | HmiEvent::OperationUpdated(_) => {
                EventTopic::Operations
            }
            HmiEvent::DirectoriesUpdate(_) | HmiEvent::FilesUpdate(_) => EventTopic::Directories,
        }
    }

    /// Wire name of the event, e.g. `METRICS_UPDATE`.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            HmiEvent::InitialData(_) => "INITIAL_DATA",
            HmiEvent::MetricsUpdate(_) => "METRICS_UPDATE",
            HmiEvent::TagValueUpdated(_) => "TAG_VALUE_UPDATED",
            HmiEvent::AlarmAcknowledged(_) => "ALARM_ACKNOWLEDGED",
            HmiEvent::AlarmRaised(_) => "ALARM_RAISED",
            HmiEvent::OperationCreated(_) => "OPERATION_CREATED",
            HmiEvent::OperationUpdated(_) => "OPERATION_UPDATED",
            HmiEvent::DirectoriesUpdate(_) => "DIRECTORIES_UPDATE",
            HmiEvent::FilesUpdate(_) => "FILES_UPDATE",
        }
    }
}

/// Client-to-server command received on the push channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientCommand {
    GetDirectories,
    GetFiles {
        #[serde(default = "root_path")]
        path: String,
    },
    AcknowledgeAlarm {
        #[serde(rename = "alarmPath")]
        alarm_path: String,
    },
    CreateOperation(NewFileOperation),
}

fn root_path() -> String {
    ".".to_string()
}

/// Event categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventTopic {
    Snapshot,
    Metrics,
    Tags,
    Alarms,
    Operations,
    Directories,
    /// All events (no filtering).
    All,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self { topics }
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &HmiEvent) -> bool {
        self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic())
    }
}
