//! # Artifact Templates
//!
//! Pure renderers for the files written by [`crate::PlcDeployer`]. Each takes
//! the controller profile and the generation time, so output is fully
//! determined by its inputs.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use shared_types::{PlcStatus, RepositoryArea, PLC_FIRMWARE, PLC_MODEL, PLC_SCAN_RATE_MS};

/// Perspective format version stamped into generated views.
pub const VIEW_FORMAT_VERSION: &str = "8.1.25";
/// Preset of the activity timeout timer, in milliseconds.
pub const ACTIVITY_TIMER_PRESET_MS: u64 = 300_000;

/// Identity of one virtual controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlcProfile {
    pub plc_id: String,
    pub area_name: String,
    /// Area directory relative to the deployment base.
    pub control_path: String,
    pub scan_rate: u64,
    pub model: String,
    pub firmware: String,
}

impl From<&RepositoryArea> for PlcProfile {
    fn from(area: &RepositoryArea) -> Self {
        Self {
            plc_id: area.plc_id(),
            area_name: area.name.to_string(),
            control_path: area.path.to_string(),
            scan_rate: PLC_SCAN_RATE_MS,
            model: PLC_MODEL.to_string(),
            firmware: PLC_FIRMWARE.to_string(),
        }
    }
}

pub(crate) fn iso(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

// =============================================================================
// .plc/
// =============================================================================

/// Initial `plc-config.json` document.
pub fn plc_config(profile: &PlcProfile, now: DateTime<Utc>) -> Value {
    json!({
        "plcId": profile.plc_id,
        "areaName": profile.area_name,
        "controlPath": profile.control_path,
        "scanRate": profile.scan_rate,
        "model": profile.model,
        "firmware": profile.firmware,
        "deployedAt": iso(now),
        "status": PlcStatus::Running,
        "tags": {
            "system": {
                "fileCount": 0,
                "directorySize": 0,
                "lastModified": iso(now),
                "processingLoad": 0,
                "status": PlcStatus::Initializing,
            }
        }
    })
}

/// Rung listing for `ladder-logic.txt`.
pub fn ladder_logic(profile: &PlcProfile, now: DateTime<Utc>) -> String {
    format!(
        "// Ladder Logic for {plc} - {area} Controller\n\
         // Generated: {at}\n\
         \n\
         // Input Rungs\n\
         |--[File_Count_Input]--[MOV]--[File_Count_Register]--|\n\
         |--[Directory_Size_Input]--[MOV]--[Size_Register]--|\n\
         |--[Last_Modified_Input]--[MOV]--[Modified_Register]--|\n\
         \n\
         // Processing Logic\n\
         |--[File_Count_Register]--[MUL 0.5]--[ADD]--[Load_Calculator]--|\n\
         |--[Size_Register]--[DIV 1048576]--[MUL 0.1]--[ADD]--[Load_Calculator]--|\n\
         |--[Load_Calculator]--[LIM 5 95]--[MOV]--[Processing_Load_Output]--|\n\
         \n\
         // Status Logic\n\
         |--[System_Heartbeat]--[TON T4:1 {preset}]--[MOV \"Active\"]--[Status_Output]--|\n\
         |--[T4:1/DN]--[MOV \"Running\"]--[Status_Output]--|\n\
         \n\
         // Alarm Logic\n\
         |--[Processing_Load_Output]--[GRT 90]--[SET]--[High_Load_Alarm]--|\n\
         |--[File_Count_Register]--[GRT 1000]--[SET]--[High_File_Count_Alarm]--|\n\
         \n\
         // Output Rungs\n\
         |--[Status_Output]--[MOV]--[UNS_Status_Tag]--|\n\
         |--[Processing_Load_Output]--[MOV]--[UNS_Load_Tag]--|\n\
         |--[File_Count_Register]--[MOV]--[UNS_FileCount_Tag]--|\n\
         \n\
         // End of Program\n",
        plc = profile.plc_id,
        area = profile.area_name,
        at = iso(now),
        preset = ACTIVITY_TIMER_PRESET_MS,
    )
}

fn point(tag: &str, description: &str) -> Value {
    json!({ "tag": tag, "description": description })
}

/// `io-mapping.json`: the same table for every controller.
pub fn io_mapping() -> Value {
    json!({
        "inputs": {
            "I:0/0": point("File_Count_Input", "Directory file count"),
            "I:0/1": point("Directory_Size_Input", "Directory total size"),
            "I:0/2": point("Last_Modified_Input", "Last modification time"),
            "I:0/3": point("System_Heartbeat", "System heartbeat signal"),
        },
        "outputs": {
            "O:0/0": point("Status_Output", "PLC operational status"),
            "O:0/1": point("Processing_Load_Output", "Processing load percentage"),
            "O:0/2": point("High_Load_Alarm", "High processing load alarm"),
            "O:0/3": point("High_File_Count_Alarm", "High file count alarm"),
        },
        "registers": {
            "N7:0": point("File_Count_Register", "File count storage"),
            "N7:1": point("Size_Register", "Directory size storage"),
            "N7:2": point("Modified_Register", "Last modified timestamp"),
            "F8:0": point("Load_Calculator", "Processing load calculation"),
        },
        "timers": {
            "T4:1": {
                "preset": ACTIVITY_TIMER_PRESET_MS,
                "description": "Activity timeout timer (5min)",
            }
        }
    })
}

pub fn watchdog_header(profile: &PlcProfile, now: DateTime<Utc>) -> String {
    format!("PLC {} Watchdog Initialized - {}\n", profile.plc_id, iso(now))
}

pub fn scan_cycle_header(profile: &PlcProfile, now: DateTime<Utc>) -> String {
    format!("Scan Rate: {}ms\nInitialized: {}\n", profile.scan_rate, iso(now))
}

/// Line appended to `watchdog.log` for a status update.
pub fn watchdog_entry(status: &Value, now: DateTime<Utc>) -> String {
    format!("Status Update: {} - {}\n", iso(now), status)
}

// =============================================================================
// .hmi/
// =============================================================================

fn widget(kind: &str, props: Value, x: u32, y: u32, width: u32, height: u32) -> Value {
    json!({
        "type": kind,
        "version": 0,
        "props": props,
        "position": { "x": x, "y": y, "width": width, "height": height },
    })
}

/// Coordinate-container view with a title, load gauge, tag table and two
/// operator buttons.
pub fn perspective_view(profile: &PlcProfile, now: DateTime<Utc>) -> Value {
    let children = vec![
        widget(
            "ia.display.label",
            json!({
                "text": format!("{} - {}", profile.area_name, profile.plc_id),
                "style": { "fontSize": "24px", "fontWeight": "bold", "color": "#00ff00" },
            }),
            20, 20, 300, 40,
        ),
        widget(
            "ia.display.gauge",
            json!({
                "value": "{view.params.processingLoad}",
                "max": 100,
                "min": 0,
                "style": { "primaryColor": "#00ff00", "backgroundColor": "#333333" },
            }),
            20, 80, 200, 200,
        ),
        widget(
            "ia.display.label",
            json!({
                "text": "Processing Load",
                "style": { "fontSize": "14px", "color": "#cccccc" },
            }),
            20, 290, 200, 20,
        ),
        widget(
            "ia.display.table",
            json!({
                "data": "{view.params.systemTags}",
                "columns": [
                    { "field": "tag", "header": "Tag", "width": 200 },
                    { "field": "value", "header": "Value", "width": 150 },
                    { "field": "quality", "header": "Quality", "width": 100 },
                ],
                "style": { "backgroundColor": "#2a2a2a", "color": "#ffffff" },
            }),
            250, 80, 450, 300,
        ),
        widget(
            "ia.input.button",
            json!({
                "text": "Emergency Stop",
                "style": {
                    "backgroundColor": "#ff0000",
                    "color": "#ffffff",
                    "fontSize": "16px",
                    "fontWeight": "bold",
                },
            }),
            20, 320, 120, 40,
        ),
        widget(
            "ia.input.button",
            json!({
                "text": "Reset Alarms",
                "style": { "backgroundColor": "#ffaa00", "color": "#000000", "fontSize": "14px" },
            }),
            150, 320, 120, 40,
        ),
    ];

    json!({
        "meta": {
            "name": format!("{} Control View", profile.area_name),
            "version": VIEW_FORMAT_VERSION,
            "lastModified": iso(now),
            "author": "Industrial Automation System",
        },
        "custom": {},
        "params": {},
        "propConfig": {},
        "root": {
            "type": "ia.container.coord",
            "version": 0,
            "props": { "style": { "backgroundColor": "#1e1e1e", "color": "#ffffff" } },
            "children": children,
        }
    })
}

const INDEX_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{{AREA}} HMI - {{PLC}}</title>
    <style>
        body { font-family: 'Segoe UI', Tahoma, sans-serif; background: #1e1e1e; color: #fff; padding: 20px; }
        .header { background: #2a2a2a; padding: 20px; border-radius: 8px; border-left: 4px solid #00ff00; margin-bottom: 20px; }
        .title { font-size: 24px; font-weight: bold; color: #00ff00; }
        .subtitle { color: #ccc; font-size: 14px; }
        .panel { background: #2a2a2a; padding: 20px; border-radius: 8px; margin-bottom: 20px; }
        .gauge-value { font-size: 48px; font-weight: bold; color: #00ff00; }
        table { width: 100%; border-collapse: collapse; }
        th, td { padding: 10px; text-align: left; border-bottom: 1px solid #404040; }
        .btn { padding: 10px 20px; border: none; border-radius: 4px; font-weight: bold; cursor: pointer; }
        .btn-stop { background: #ff0000; color: #fff; }
        .btn-reset { background: #ffaa00; color: #000; }
    </style>
</head>
<body>
    <div class="header">
        <div class="title">{{AREA}} - {{PLC}}</div>
        <div class="subtitle">{{MODEL}} | Firmware {{FIRMWARE}} | Scan Rate {{SCAN_RATE}}ms</div>
    </div>
    <div class="panel">
        <div>Processing Load</div>
        <div class="gauge-value" id="load">--</div>
    </div>
    <div class="panel">
        <table>
            <thead><tr><th>Tag</th><th>Value</th></tr></thead>
            <tbody id="tags"></tbody>
        </table>
    </div>
    <div class="panel">
        <button class="btn btn-stop" onclick="console.log('Emergency stop activated')">Emergency Stop</button>
        <button class="btn btn-reset" onclick="console.log('Alarms reset')">Reset Alarms</button>
    </div>
    <script>
        async function loadPLCData() {
            try {
                const response = await fetch('./plc-config.json');
                const config = await response.json();
                const system = config.tags.system;
                document.getElementById('load').textContent = system.processingLoad + '%';
                document.getElementById('tags').innerHTML = Object.entries(system)
                    .map(([tag, value]) => `<tr><td>${tag}</td><td>${value}</td></tr>`)
                    .join('');
            } catch (error) {
                console.error('Failed to load PLC data:', error);
            }
        }
        loadPLCData();
        setInterval(loadPLCData, 5000);
    </script>
</body>
</html>
"#;

/// Standalone operator page for the area.
pub fn hmi_index(profile: &PlcProfile) -> String {
    INDEX_TEMPLATE
        .replace("{{AREA}}", &profile.area_name)
        .replace("{{PLC}}", &profile.plc_id)
        .replace("{{MODEL}}", &profile.model)
        .replace("{{FIRMWARE}}", &profile.firmware)
        .replace("{{SCAN_RATE}}", &profile.scan_rate.to_string())
}
