//! # Startup Fixtures
//!
//! Populates an empty registry with the enterprise hierarchy (one area and
//! one controller per repository area), controller system tags, the
//! file-system metrics controller, three alarms, three views and the default
//! gateway configuration.

use serde_json::{json, Value};
use shared_types::{
    AlarmCondition, AlarmType, NewPerspectiveView, NewSystemConfig, NewTagAlarm, NewUnsNode,
    NewUnsTag, NodeType, Quality, TagDataType, PLC_FIRMWARE, PLC_MODEL, PLC_SCAN_RATE_MS,
    REPOSITORY_AREAS,
};
use tracing::info;

use crate::error::RegistryError;
use crate::service::PathRegistry;

pub const ENTERPRISE_PATH: &str = "Enterprise";
pub const SITE_PATH: &str = "Enterprise/Site1";
/// Controller whose tags carry the simulated gateway metrics.
pub const METRICS_PLC_PATH: &str = "Enterprise/Site1/FileSystemArea/PLC1";

/// Tag paths written by the metrics simulator.
pub mod metric_tags {
    pub const CPU_USAGE: &str = "Enterprise/Site1/FileSystemArea/PLC1/System/CpuUsage";
    pub const MEMORY_USAGE: &str = "Enterprise/Site1/FileSystemArea/PLC1/System/MemoryUsage";
    pub const DISK_IO: &str = "Enterprise/Site1/FileSystemArea/PLC1/System/DiskIO";
    pub const THROUGHPUT: &str = "Enterprise/Site1/FileSystemArea/PLC1/System/Throughput";
    pub const PENDING_OPERATIONS: &str =
        "Enterprise/Site1/FileSystemArea/PLC1/FileSystem/OperationQueue/Pending";
    pub const RUNNING_OPERATIONS: &str =
        "Enterprise/Site1/FileSystemArea/PLC1/FileSystem/OperationQueue/Running";
}

/// Controller tags refreshed by repository monitoring, with their types.
pub const MONITORED_SYSTEM_TAGS: [(&str, TagDataType); 4] = [
    ("FileCount", TagDataType::Int32),
    ("DirectorySize", TagDataType::Float32),
    ("LastModified", TagDataType::DateTime),
    ("ProcessingLoad", TagDataType::Float32),
];

/// Load every fixture into `registry`.
pub fn seed_registry(registry: &PathRegistry) -> Result<(), RegistryError> {
    seed_hierarchy(registry)?;
    seed_controller_tags(registry)?;
    seed_metrics_controller(registry)?;
    seed_alarms(registry)?;
    seed_views(registry)?;
    seed_configs(registry)?;

    info!(
        nodes = registry.all_nodes().len(),
        tags = registry.all_tags().len(),
        alarms = registry.all_alarms().len(),
        views = registry.all_views().len(),
        "Registry seeded"
    );
    Ok(())
}

fn node(
    path: &str,
    parent: Option<&str>,
    name: &str,
    node_type: NodeType,
    description: &str,
    metadata: Value,
) -> NewUnsNode {
    NewUnsNode {
        node_id: path.to_string(),
        parent_node_id: parent.map(String::from),
        name: name.to_string(),
        node_type,
        description: Some(description.to_string()),
        metadata,
    }
}

fn tag(
    path: String,
    owner: &str,
    name: &str,
    data_type: TagDataType,
    value: &str,
    historize: bool,
    metadata: Value,
) -> NewUnsTag {
    NewUnsTag {
        tag_path: path,
        node_id: owner.to_string(),
        tag_name: name.to_string(),
        data_type,
        value: value.to_string(),
        quality: Quality::Good,
        historize,
        metadata,
    }
}

fn plc_metadata(controls_path: &str) -> Value {
    json!({
        "type": "Ignition PLC",
        "model": PLC_MODEL,
        "firmware": PLC_FIRMWARE,
        "controlsPath": controls_path,
        "scanRate": format!("{PLC_SCAN_RATE_MS}ms"),
        "status": "Running",
    })
}

fn seed_hierarchy(registry: &PathRegistry) -> Result<(), RegistryError> {
    registry.create_node(node(
        ENTERPRISE_PATH,
        None,
        "Enterprise",
        NodeType::Enterprise,
        "Root enterprise node",
        json!({}),
    ))?;
    registry.create_node(node(
        SITE_PATH,
        Some(ENTERPRISE_PATH),
        "Site1",
        NodeType::Site,
        "Primary site for file operations",
        json!({ "location": "Primary Data Center" }),
    ))?;

    let scanned_at = chrono::Utc::now().to_rfc3339();
    for area in &REPOSITORY_AREAS {
        let area_path = area.area_node_path();
        registry.create_node(node(
            &area_path,
            Some(SITE_PATH),
            &format!("{}Area", area.name),
            NodeType::Area,
            area.description,
            json!({
                "repositoryPath": area.path,
                "monitoring": true,
                "lastScan": scanned_at,
            }),
        ))?;
        registry.create_node(node(
            &area.plc_node_path(),
            Some(&area_path),
            &area.plc_id(),
            NodeType::Device,
            &format!("{} directory controller", area.name),
            plc_metadata(area.path),
        ))?;
    }

    let fs_area = "Enterprise/Site1/FileSystemArea";
    registry.create_node(node(
        fs_area,
        Some(SITE_PATH),
        "FileSystemArea",
        NodeType::Area,
        "Gateway file system operations",
        json!({ "monitoring": true }),
    ))?;
    registry.create_node(node(
        METRICS_PLC_PATH,
        Some(fs_area),
        "PLC1",
        NodeType::Device,
        "File system gateway controller",
        plc_metadata("."),
    ))?;
    Ok(())
}

fn seed_controller_tags(registry: &PathRegistry) -> Result<(), RegistryError> {
    for area in &REPOSITORY_AREAS {
        let owner = area.plc_node_path();
        registry.create_tag(tag(
            area.system_tag_path("Status"),
            &owner,
            "Status",
            TagDataType::String,
            "Running",
            true,
            json!({
                "description": format!("{} PLC operational status", area.name),
                "controlsPath": area.path,
            }),
        ))?;

        for (name, data_type) in MONITORED_SYSTEM_TAGS {
            registry.create_tag(tag(
                area.system_tag_path(name),
                &owner,
                name,
                data_type,
                "0",
                false,
                json!({ "controlsPath": area.path }),
            ))?;
        }
    }
    Ok(())
}

fn seed_metrics_controller(registry: &PathRegistry) -> Result<(), RegistryError> {
    let system = [
        (metric_tags::CPU_USAGE, "CpuUsage", TagDataType::Float32, "25.3", "%"),
        (metric_tags::MEMORY_USAGE, "MemoryUsage", TagDataType::Float32, "67.8", "%"),
        (metric_tags::DISK_IO, "DiskIO", TagDataType::Float32, "42.1", "%"),
        (metric_tags::THROUGHPUT, "Throughput", TagDataType::Int32, "1200", "KB/s"),
    ];
    for (path, name, data_type, value, units) in system {
        registry.create_tag(tag(
            path.to_string(),
            METRICS_PLC_PATH,
            name,
            data_type,
            value,
            true,
            json!({ "units": units }),
        ))?;
    }

    let file_system = [
        ("FileSystem/DirectoryCount", "DirectoryCount", "4", false, "Total number of directories"),
        ("FileSystem/FileCount", "FileCount", "12", false, "Total number of files"),
        ("FileSystem/ConflictCount", "ConflictCount", "1", true, "Number of files with conflicts"),
        ("FileSystem/OperationQueue/Pending", "PendingOperations", "3", true, "Number of pending operations"),
        ("FileSystem/OperationQueue/Running", "RunningOperations", "1", true, "Number of running operations"),
    ];
    for (suffix, name, value, historize, description) in file_system {
        registry.create_tag(tag(
            format!("{METRICS_PLC_PATH}/{suffix}"),
            METRICS_PLC_PATH,
            name,
            TagDataType::Int32,
            value,
            historize,
            json!({ "description": description }),
        ))?;
    }
    Ok(())
}

fn seed_alarms(registry: &PathRegistry) -> Result<(), RegistryError> {
    registry.create_alarm(NewTagAlarm {
        alarm_path: format!("{METRICS_PLC_PATH}/Alarms/FileConflict"),
        tag_path: format!("{METRICS_PLC_PATH}/FileSystem/ConflictCount"),
        alarm_type: AlarmType::Digital,
        condition: AlarmCondition::greater_than(0.0),
        priority: 700,
        is_active: true,
        is_acknowledged: false,
        message: "FILE CONFLICT DETECTED".into(),
        active_time: Some(chrono::Utc::now()),
        metadata: json!({ "location": "PLC.controller.js" }),
    })?;
    registry.create_alarm(NewTagAlarm {
        alarm_path: format!("{METRICS_PLC_PATH}/Alarms/HighMemoryUsage"),
        tag_path: metric_tags::MEMORY_USAGE.into(),
        alarm_type: AlarmType::AnalogHi,
        condition: AlarmCondition::greater_than(80.0),
        priority: 500,
        is_active: false,
        is_acknowledged: false,
        message: "HIGH MEMORY USAGE".into(),
        active_time: None,
        metadata: json!({ "threshold": "80%" }),
    })?;
    registry.create_alarm(NewTagAlarm {
        alarm_path: format!("{METRICS_PLC_PATH}/Alarms/SyncTimeout"),
        tag_path: metric_tags::PENDING_OPERATIONS.into(),
        alarm_type: AlarmType::AnalogHi,
        condition: AlarmCondition::greater_than(5.0),
        priority: 400,
        is_active: false,
        is_acknowledged: false,
        message: "SYNC TIMEOUT".into(),
        active_time: None,
        metadata: json!({ "location": "shared/utilities/" }),
    })?;
    Ok(())
}

fn title_label(text: &str) -> Value {
    json!({
        "type": "ia.display.label",
        "props": {
            "text": text,
            "style": {
                "fontSize": "16px",
                "fontWeight": "bold",
                "color": "#3b82f6",
                "fontFamily": "monospace"
            }
        }
    })
}

fn tag_binding(path: &str) -> Value {
    json!({ "binding": { "type": "tag", "config": { "path": path } } })
}

fn flex_column(extra_props: Value, children: Vec<Value>) -> Value {
    let mut props = json!({
        "direction": "column",
        "style": { "backgroundColor": "#1a1a1a", "color": "#ffffff" }
    });
    if let (Some(target), Value::Object(extra)) = (props.as_object_mut(), extra_props) {
        target.extend(extra);
    }
    json!({
        "type": "ia.container.flex",
        "version": 0,
        "props": props,
        "children": children,
    })
}

fn seed_views(registry: &PathRegistry) -> Result<(), RegistryError> {
    let directory_browser = flex_column(
        json!({ "justify": "flex-start", "alignItems": "stretch" }),
        vec![
            title_label("HMI - OPERATOR INTERFACE"),
            json!({
                "type": "ia.display.tree",
                "props": {
                    "data": tag_binding(&format!("[default]{METRICS_PLC_PATH}/FileSystem/DirectoryTree")),
                    "selection": { "mode": "single" }
                }
            }),
        ],
    );

    let plc_controller = flex_column(
        json!({ "style": { "backgroundColor": "#1a1a1a" } }),
        vec![
            title_label("PLC - DIRECTORY CONTROLLER"),
            json!({
                "type": "ia.display.table",
                "props": {
                    "data": tag_binding(&format!("[default]{METRICS_PLC_PATH}/FileSystem/FileList")),
                    "columns": [
                        { "field": "name", "header": "NAME" },
                        { "field": "status", "header": "STATUS" },
                        { "field": "size", "header": "SIZE" },
                        { "field": "modified", "header": "MODIFIED" }
                    ]
                }
            }),
        ],
    );

    let scada_monitor = flex_column(
        json!({}),
        vec![
            title_label("SCADA - SYSTEM SUPERVISOR"),
            json!({
                "type": "ia.display.alarm-status-table",
                "props": { "data": tag_binding("[System]Gateway/AlarmNotification/ActiveAlarms") }
            }),
            json!({
                "type": "ia.chart.timeseries",
                "props": {
                    "series": [
                        { "name": "CPU Usage", "data": tag_binding(&format!("[default]{}", metric_tags::CPU_USAGE)) },
                        { "name": "Memory Usage", "data": tag_binding(&format!("[default]{}", metric_tags::MEMORY_USAGE)) }
                    ]
                }
            }),
        ],
    );

    for (path, name, definition) in [
        ("FileSystem/HMI/DirectoryBrowser", "DirectoryBrowser", directory_browser),
        ("FileSystem/PLC/Controller", "PLCController", plc_controller),
        ("FileSystem/SCADA/Monitor", "SCADAMonitor", scada_monitor),
    ] {
        registry.create_view(NewPerspectiveView {
            view_path: path.into(),
            view_name: name.into(),
            view_type: "Container".into(),
            view_definition: definition,
            parent_path: shared_types::parent_path(path).map(String::from),
            is_enabled: true,
        })?;
    }
    Ok(())
}

fn seed_configs(registry: &PathRegistry) -> Result<(), RegistryError> {
    let defaults = [
        ("System/Gateway/Name", "FileSystem_Gateway", TagDataType::String, "Gateway name", true),
        ("System/Gateway/Version", "8.1.25", TagDataType::String, "Gateway version", true),
        ("System/Perspective/SessionTimeout", "3600", TagDataType::Int32, "Session timeout in seconds", false),
        ("System/Alarms/MaxActiveAlarms", "1000", TagDataType::Int32, "Maximum number of active alarms", false),
    ];
    for (path, value, data_type, description, read_only) in defaults {
        registry.set_config(NewSystemConfig {
            config_path: path.into(),
            config_value: value.into(),
            data_type,
            description: Some(description.into()),
            is_read_only: read_only,
        })?;
    }
    Ok(())
}
