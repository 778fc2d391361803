//! # Unified Namespace Entities
//!
//! Nodes, tags, alarms and views are all addressed by slash-delimited paths.
//! The `New*` structs are the insert payloads accepted by the registry; ids
//! and timestamps are assigned on insert.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// =============================================================================
// NODES
// =============================================================================

/// Level of a node in the enterprise hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeType {
    /// Root of the hierarchy.
    Enterprise,
    Site,
    Area,
    /// A controller or other leaf device.
    Device,
}

/// A node in the namespace tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnsNode {
    pub id: u64,
    /// Full hierarchical path, unique across nodes.
    pub node_id: String,
    /// Path of the parent node; `None` for the root.
    pub parent_node_id: Option<String>,
    pub name: String,
    pub node_type: NodeType,
    pub description: Option<String>,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for [`UnsNode`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUnsNode {
    pub node_id: String,
    #[serde(default)]
    pub parent_node_id: Option<String>,
    pub name: String,
    pub node_type: NodeType,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "empty_object")]
    pub metadata: serde_json::Value,
}

/// Flat directory projection of a node, kept for older dashboard clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectorySummary {
    pub id: u64,
    pub name: String,
    pub path: String,
    /// Numeric id of the parent node, if the parent exists.
    pub parent_id: Option<u64>,
    pub file_count: u64,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Projects nodes into [`DirectorySummary`] rows, resolving parent ids.
#[must_use]
pub fn directory_summaries(nodes: &[UnsNode]) -> Vec<DirectorySummary> {
    let ids: HashMap<&str, u64> = nodes.iter().map(|n| (n.node_id.as_str(), n.id)).collect();
    nodes
        .iter()
        .map(|node| DirectorySummary {
            id: node.id,
            name: node.name.clone(),
            path: node.node_id.clone(),
            parent_id: node
                .parent_node_id
                .as_deref()
                .and_then(|p| ids.get(p).copied()),
            file_count: 0,
            status: "active".to_string(),
            created_at: node.created_at,
            updated_at: node.updated_at,
        })
        .collect()
}

// =============================================================================
// TAGS
// =============================================================================

/// Declared data type of a tag value. Advisory only; values are stored as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TagDataType {
    String,
    Int32,
    Float32,
    Boolean,
    DateTime,
    Json,
}

/// Confidence flag attached to the current value of a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Quality {
    #[default]
    Good,
    Bad,
    Uncertain,
}

impl std::fmt::Display for Quality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Quality::Good => "Good",
            Quality::Bad => "Bad",
            Quality::Uncertain => "Uncertain",
        };
        f.write_str(s)
    }
}

/// A tag: a named value owned by a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnsTag {
    pub id: u64,
    pub tag_path: String,
    /// Path of the owning node.
    pub node_id: String,
    pub tag_name: String,
    pub data_type: TagDataType,
    pub value: String,
    pub quality: Quality,
    /// Refreshed on every write.
    pub timestamp: DateTime<Utc>,
    /// Whether samples should be retained. No history is kept.
    pub historize: bool,
    pub metadata: serde_json::Value,
}

/// Insert payload for [`UnsTag`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUnsTag {
    pub tag_path: String,
    pub node_id: String,
    pub tag_name: String,
    pub data_type: TagDataType,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub quality: Quality,
    #[serde(default)]
    pub historize: bool,
    #[serde(default = "empty_object")]
    pub metadata: serde_json::Value,
}

/// A single historical sample of a tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagHistoryEntry {
    pub tag_path: String,
    pub value: String,
    pub quality: Quality,
    pub timestamp: DateTime<Utc>,
}

// =============================================================================
// ALARMS
// =============================================================================

/// Comparison applied by an alarm condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComparisonOperator {
    #[serde(rename = ">")]
    GreaterThan,
    #[serde(rename = ">=")]
    GreaterOrEqual,
    #[serde(rename = "<")]
    LessThan,
    #[serde(rename = "<=")]
    LessOrEqual,
    #[serde(rename = "==")]
    Equal,
    #[serde(rename = "!=")]
    NotEqual,
}

/// Descriptor of the condition that raises an alarm.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlarmCondition {
    pub operator: ComparisonOperator,
    pub value: f64,
}

impl AlarmCondition {
    pub fn greater_than(value: f64) -> Self {
        Self {
            operator: ComparisonOperator::GreaterThan,
            value,
        }
    }
}

/// Alarm classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlarmType {
    Digital,
    AnalogHi,
    AnalogLo,
    /// Raised by a remote controller over the broker link.
    Process,
}

/// An alarm bound to a triggering tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagAlarm {
    pub id: u64,
    pub alarm_path: String,
    pub tag_path: String,
    pub alarm_type: AlarmType,
    pub condition: AlarmCondition,
    /// Higher is more severe.
    pub priority: u32,
    pub is_active: bool,
    pub is_acknowledged: bool,
    pub message: String,
    pub active_time: Option<DateTime<Utc>>,
    pub ack_time: Option<DateTime<Utc>>,
    pub cleared_time: Option<DateTime<Utc>>,
    pub metadata: serde_json::Value,
}

impl TagAlarm {
    /// Active and not yet acknowledged.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.is_active && !self.is_acknowledged
    }
}

/// Insert payload for [`TagAlarm`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTagAlarm {
    pub alarm_path: String,
    pub tag_path: String,
    pub alarm_type: AlarmType,
    pub condition: AlarmCondition,
    pub priority: u32,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub is_acknowledged: bool,
    pub message: String,
    #[serde(default)]
    pub active_time: Option<DateTime<Utc>>,
    #[serde(default = "empty_object")]
    pub metadata: serde_json::Value,
}

// =============================================================================
// VIEWS
// =============================================================================

/// An HMI view with an opaque layout/binding tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerspectiveView {
    pub id: u64,
    pub view_path: String,
    pub view_name: String,
    pub view_type: String,
    pub view_definition: serde_json::Value,
    pub parent_path: Option<String>,
    pub is_enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for [`PerspectiveView`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPerspectiveView {
    pub view_path: String,
    pub view_name: String,
    pub view_type: String,
    #[serde(default = "empty_object")]
    pub view_definition: serde_json::Value,
    #[serde(default)]
    pub parent_path: Option<String>,
    #[serde(default = "default_true")]
    pub is_enabled: bool,
}

// =============================================================================
// SYSTEM CONFIGURATION
// =============================================================================

/// A gateway configuration entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemConfigEntry {
    pub id: u64,
    pub config_path: String,
    pub config_value: String,
    pub data_type: TagDataType,
    pub description: Option<String>,
    pub is_read_only: bool,
    pub updated_at: DateTime<Utc>,
}

/// Insert/update payload for [`SystemConfigEntry`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSystemConfig {
    pub config_path: String,
    pub config_value: String,
    #[serde(default = "default_config_type")]
    pub data_type: TagDataType,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_read_only: bool,
}

fn empty_object() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

fn default_true() -> bool {
    true
}

fn default_config_type() -> TagDataType {
    TagDataType::String
}
