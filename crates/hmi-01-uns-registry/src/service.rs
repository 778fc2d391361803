//! # Path Registry Service
//!
//! Owns the node, tag, alarm, view and configuration tables. Each table sits
//! behind its own `RwLock`; no operation holds more than one lock at a time.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use shared_types::{
    NewPerspectiveView, NewSystemConfig, NewTagAlarm, NewUnsNode, NewUnsTag, PerspectiveView,
    Quality, SystemConfigEntry, TagAlarm, TagHistoryEntry, UnsNode, UnsTag,
};
use tracing::{debug, warn};

use crate::domain::{validate_alarm, validate_config, validate_node, validate_tag, validate_view};
use crate::error::RegistryError;
use crate::ports::outbound::{SystemTimeSource, TimeSource};

/// Path-keyed in-memory registry.
///
/// Constructed once at startup and shared behind an `Arc` with the API
/// gateway and the simulator.
pub struct PathRegistry {
    nodes: RwLock<BTreeMap<String, UnsNode>>,
    tags: RwLock<BTreeMap<String, UnsTag>>,
    alarms: RwLock<BTreeMap<String, TagAlarm>>,
    views: RwLock<BTreeMap<String, PerspectiveView>>,
    configs: RwLock<BTreeMap<String, SystemConfigEntry>>,
    next_id: AtomicU64,
    clock: Arc<dyn TimeSource>,
}

impl PathRegistry {
    /// Create an empty registry using the system clock.
    pub fn new() -> Self {
        Self::with_time_source(Arc::new(SystemTimeSource))
    }

    pub fn with_time_source(clock: Arc<dyn TimeSource>) -> Self {
        Self {
            nodes: RwLock::new(BTreeMap::new()),
            tags: RwLock::new(BTreeMap::new()),
            alarms: RwLock::new(BTreeMap::new()),
            views: RwLock::new(BTreeMap::new()),
            configs: RwLock::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
            clock,
        }
    }

    fn allocate_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    // =========================================================================
    // NODES
    // =========================================================================

    pub fn get_node(&self, path: &str) -> Option<UnsNode> {
        self.nodes.read().get(path).cloned()
    }

    pub fn all_nodes(&self) -> Vec<UnsNode> {
        self.nodes.read().values().cloned().collect()
    }

    /// Direct children of `parent_path`. Not recursive.
    pub fn children(&self, parent_path: &str) -> Vec<UnsNode> {
        self.nodes
            .read()
            .values()
            .filter(|n| n.parent_node_id.as_deref() == Some(parent_path))
            .cloned()
            .collect()
    }

    pub fn create_node(&self, data: NewUnsNode) -> Result<UnsNode, RegistryError> {
        validate_node(&data)?;
        let now = self.clock.now();

        let mut nodes = self.nodes.write();
        if let Some(parent) = data.parent_node_id.as_deref() {
            if !nodes.contains_key(parent) {
                warn!(node = %data.node_id, parent, "Parent node does not exist");
            }
        }

        let (id, created_at) = match nodes.get(&data.node_id) {
            Some(existing) => {
                debug!(node = %data.node_id, "Replacing existing node");
                (existing.id, existing.created_at)
            }
            None => (self.allocate_id(), now),
        };

        let node = UnsNode {
            id,
            node_id: data.node_id,
            parent_node_id: data.parent_node_id,
            name: data.name,
            node_type: data.node_type,
            description: data.description,
            metadata: data.metadata,
            created_at,
            updated_at: now,
        };
        nodes.insert(node.node_id.clone(), node.clone());
        Ok(node)
    }

    // =========================================================================
    // TAGS
    // =========================================================================

    pub fn get_tag(&self, path: &str) -> Option<UnsTag> {
        self.tags.read().get(path).cloned()
    }

    pub fn all_tags(&self) -> Vec<UnsTag> {
        self.tags.read().values().cloned().collect()
    }

    /// Tags owned by exactly `node_path`.
    pub fn tags_by_node(&self, node_path: &str) -> Vec<UnsTag> {
        self.tags
            .read()
            .values()
            .filter(|t| t.node_id == node_path)
            .cloned()
            .collect()
    }

    /// Write a new value to an existing tag.
    ///
    /// Quality defaults to [`Quality::Good`]. Returns `None`, and changes
    /// nothing, when the tag does not exist.
    pub fn update_tag_value(
        &self,
        path: &str,
        value: impl Into<String>,
        quality: Option<Quality>,
    ) -> Option<UnsTag> {
        let mut tags = self.tags.write();
        let tag = tags.get_mut(path)?;
        tag.value = value.into();
        tag.quality = quality.unwrap_or_default();
        tag.timestamp = self.clock.now();
        Some(tag.clone())
    }

    pub fn create_tag(&self, data: NewUnsTag) -> Result<UnsTag, RegistryError> {
        validate_tag(&data)?;
        if !self.nodes.read().contains_key(&data.node_id) {
            warn!(tag = %data.tag_path, node = %data.node_id, "Owning node does not exist");
        }

        let mut tags = self.tags.write();
        let id = match tags.get(&data.tag_path) {
            Some(existing) => {
                debug!(tag = %data.tag_path, "Replacing existing tag");
                existing.id
            }
            None => self.allocate_id(),
        };

        let tag = UnsTag {
            id,
            tag_path: data.tag_path,
            node_id: data.node_id,
            tag_name: data.tag_name,
            data_type: data.data_type,
            value: data.value,
            quality: data.quality,
            timestamp: self.clock.now(),
            historize: data.historize,
            metadata: data.metadata,
        };
        tags.insert(tag.tag_path.clone(), tag.clone());
        Ok(tag)
    }

    /// Historical samples for a tag. Samples are not retained, so this is
    /// always empty.
    pub fn tag_history(&self, path: &str, limit: usize) -> Vec<TagHistoryEntry> {
        debug!(tag = path, limit, "Tag history requested");
        Vec::new()
    }

    // =========================================================================
    // ALARMS
    // =========================================================================

    pub fn all_alarms(&self) -> Vec<TagAlarm> {
        self.alarms.read().values().cloned().collect()
    }

    /// Alarms that are active and not yet acknowledged.
    pub fn active_alarms(&self) -> Vec<TagAlarm> {
        self.alarms
            .read()
            .values()
            .filter(|a| a.is_pending())
            .cloned()
            .collect()
    }

    pub fn get_alarm(&self, path: &str) -> Option<TagAlarm> {
        self.alarms.read().get(path).cloned()
    }

    /// Mark an alarm acknowledged. The active flag is left alone.
    pub fn acknowledge_alarm(&self, path: &str) -> Option<TagAlarm> {
        let mut alarms = self.alarms.write();
        let alarm = alarms.get_mut(path)?;
        alarm.is_acknowledged = true;
        alarm.ack_time = Some(self.clock.now());
        Some(alarm.clone())
    }

    pub fn create_alarm(&self, data: NewTagAlarm) -> Result<TagAlarm, RegistryError> {
        validate_alarm(&data)?;

        let mut alarms = self.alarms.write();
        let id = match alarms.get(&data.alarm_path) {
            Some(existing) => {
                debug!(alarm = %data.alarm_path, "Replacing existing alarm");
                existing.id
            }
            None => self.allocate_id(),
        };

        let alarm = TagAlarm {
            id,
            alarm_path: data.alarm_path,
            tag_path: data.tag_path,
            alarm_type: data.alarm_type,
            condition: data.condition,
            priority: data.priority,
            is_active: data.is_active,
            is_acknowledged: data.is_acknowledged,
            message: data.message,
            active_time: data.active_time,
            ack_time: None,
            cleared_time: None,
            metadata: data.metadata,
        };
        alarms.insert(alarm.alarm_path.clone(), alarm.clone());
        Ok(alarm)
    }

    // =========================================================================
    // VIEWS
    // =========================================================================

    pub fn get_view(&self, path: &str) -> Option<PerspectiveView> {
        self.views.read().get(path).cloned()
    }

    pub fn all_views(&self) -> Vec<PerspectiveView> {
        self.views.read().values().cloned().collect()
    }

    /// Views whose parent path is exactly `parent_path`.
    pub fn views_by_parent(&self, parent_path: &str) -> Vec<PerspectiveView> {
        self.views
            .read()
            .values()
            .filter(|v| v.parent_path.as_deref() == Some(parent_path))
            .cloned()
            .collect()
    }

    pub fn create_view(&self, data: NewPerspectiveView) -> Result<PerspectiveView, RegistryError> {
        validate_view(&data)?;
        let now = self.clock.now();

        let mut views = self.views.write();
        let (id, created_at) = match views.get(&data.view_path) {
            Some(existing) => {
                debug!(view = %data.view_path, "Replacing existing view");
                (existing.id, existing.created_at)
            }
            None => (self.allocate_id(), now),
        };

        let view = PerspectiveView {
            id,
            view_path: data.view_path,
            view_name: data.view_name,
            view_type: data.view_type,
            view_definition: data.view_definition,
            parent_path: data.parent_path,
            is_enabled: data.is_enabled,
            created_at,
            updated_at: now,
        };
        views.insert(view.view_path.clone(), view.clone());
        Ok(view)
    }

    // =========================================================================
    // SYSTEM CONFIGURATION
    // =========================================================================

    pub fn get_config(&self, path: &str) -> Option<SystemConfigEntry> {
        self.configs.read().get(path).cloned()
    }

    pub fn all_configs(&self) -> Vec<SystemConfigEntry> {
        self.configs.read().values().cloned().collect()
    }

    /// Insert or overwrite a configuration entry.
    ///
    /// Fails with [`RegistryError::ReadOnly`] when the stored entry is
    /// read-only. Overwrites keep the stored id.
    pub fn set_config(&self, data: NewSystemConfig) -> Result<SystemConfigEntry, RegistryError> {
        validate_config(&data)?;

        let mut configs = self.configs.write();
        let id = match configs.get(&data.config_path) {
            Some(existing) if existing.is_read_only => {
                return Err(RegistryError::ReadOnly(data.config_path));
            }
            Some(existing) => existing.id,
            None => self.allocate_id(),
        };

        let entry = SystemConfigEntry {
            id,
            config_path: data.config_path,
            config_value: data.config_value,
            data_type: data.data_type,
            description: data.description,
            is_read_only: data.is_read_only,
            updated_at: self.clock.now(),
        };
        configs.insert(entry.config_path.clone(), entry.clone());
        Ok(entry)
    }
}

impl Default for PathRegistry {
    fn default() -> Self {
        Self::new()
    }
}
