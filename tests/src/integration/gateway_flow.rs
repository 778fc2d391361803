//! # Gateway Flow Tests
//!
//! Drives the full router built from a runtime's handler state:
//!
//! ```text
//! [HTTP request] → [Router] → [PathRegistry / DirectoryScanner]
//!                                   │
//!                                   ↓
//!                            [InMemoryEventBus] → push-channel subscribers
//! ```

// =============================================================================
// TEST FIXTURES (only compiled during tests)
// =============================================================================

#[cfg(test)]
use std::sync::Arc;

#[cfg(test)]
use axum::body::Body;

#[cfg(test)]
use axum::http::{header, Method, Request, StatusCode};

#[cfg(test)]
use axum::Router;

#[cfg(test)]
use serde_json::{json, Value};

#[cfg(test)]
use tempfile::TempDir;

#[cfg(test)]
use tower::ServiceExt;

#[cfg(test)]
use hmi_03_simulator::SequenceRandomSource;

#[cfg(test)]
use hmi_06_api_gateway::{build_router, AppState};

#[cfg(test)]
use hmi_runtime::{HmiRuntime, RuntimeConfig};

#[cfg(test)]
struct Gateway {
    _dir: TempDir,
    runtime: HmiRuntime,
    state: AppState,
    app: Router,
}

/// Runtime over a temp directory with the broker switched off
#[cfg(test)]
fn gateway() -> Gateway {
    let dir = TempDir::new().unwrap();
    let mut config = RuntimeConfig::default();
    config.storage.base_path = dir.path().to_path_buf();
    config.broker.enabled = false;

    let runtime =
        HmiRuntime::with_random_source(config, Arc::new(SequenceRandomSource::neutral())).unwrap();
    let state = runtime.app_state();
    let app = build_router(state.clone(), &runtime.config().gateway);
    Gateway {
        _dir: dir,
        runtime,
        state,
        app,
    }
}

#[cfg(test)]
fn encode(path: &str) -> String {
    path.replace('/', "%2F")
}

#[cfg(test)]
async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, json)
}

// =============================================================================
// TAG WRITES
// =============================================================================

#[cfg(test)]
mod tag_writes {
    use super::*;
    use chrono::{DateTime, Utc};
    use shared_bus::{EventFilter, EventTopic, HmiEvent};

    const TAG_PATH: &str = "Enterprise/Site1/Area/Status";

    async fn create_status_tag(app: &Router) -> Value {
        let (status, _) = call(
            app,
            Method::POST,
            "/api/uns/nodes",
            Some(json!({
                "nodeId": "Enterprise/Site1/Area",
                "parentNodeId": "Enterprise/Site1",
                "name": "Area",
                "nodeType": "Area",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, tag) = call(
            app,
            Method::POST,
            "/api/uns/tags",
            Some(json!({
                "tagPath": TAG_PATH,
                "nodeId": "Enterprise/Site1/Area",
                "tagName": "Status",
                "dataType": "String",
                "value": "Idle",
                "quality": "Bad",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        tag
    }

    fn timestamp(tag: &Value) -> DateTime<Utc> {
        tag["timestamp"].as_str().unwrap().parse().unwrap()
    }

    #[tokio::test]
    async fn test_put_encoded_tag_path_updates_value() {
        let gw = gateway();
        let created = create_status_tag(&gw.app).await;

        let uri = format!("/api/uns/tags/{}/value", encode(TAG_PATH));
        let (status, tag) = call(&gw.app, Method::PUT, &uri, Some(json!({ "value": "Running" }))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(tag["tagPath"], TAG_PATH);
        assert_eq!(tag["value"], "Running");
        assert_eq!(tag["quality"], "Good");
        assert!(timestamp(&tag) >= timestamp(&created));

        let stored = gw.runtime.registry().get_tag(TAG_PATH).unwrap();
        assert_eq!(stored.value, "Running");
    }

    #[tokio::test]
    async fn test_put_unknown_tag_is_not_found() {
        let gw = gateway();

        let uri = format!("/api/uns/tags/{}/value", encode("Enterprise/Site1/Area/Missing"));
        let (status, body) = call(&gw.app, Method::PUT, &uri, Some(json!({ "value": 1 }))).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Tag not found");
    }

    #[tokio::test]
    async fn test_tag_write_reaches_push_subscribers() {
        let gw = gateway();
        create_status_tag(&gw.app).await;
        let mut tags = gw.state.bus.subscribe(EventFilter::topics(vec![EventTopic::Tags]));

        let uri = format!("/api/uns/tags/{}/value", encode(TAG_PATH));
        call(&gw.app, Method::PUT, &uri, Some(json!({ "value": 7.5, "quality": "Uncertain" }))).await;

        match tags.try_recv().unwrap() {
            Some(HmiEvent::TagValueUpdated(tag)) => {
                assert_eq!(tag.tag_path, TAG_PATH);
                assert_eq!(tag.value, "7.5");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }
}

// =============================================================================
// ALARMS
// =============================================================================

#[cfg(test)]
mod alarms {
    use super::*;
    use hmi_01_uns_registry::seed::METRICS_PLC_PATH;
    use shared_bus::{EventFilter, HmiEvent};

    #[tokio::test]
    async fn test_acknowledge_removes_alarm_from_active_list() {
        let gw = gateway();
        let alarm_path = format!("{METRICS_PLC_PATH}/Alarms/FileConflict");
        let mut events = gw.state.bus.subscribe(EventFilter::all());

        let (_, before) = call(&gw.app, Method::GET, "/api/alarms?active=true", None).await;
        let active_before = before.as_array().unwrap().len();

        let uri = format!("/api/alarms/{}/acknowledge", encode(&alarm_path));
        let (status, alarm) = call(&gw.app, Method::PUT, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(alarm["alarmPath"], alarm_path.as_str());

        let (_, after) = call(&gw.app, Method::GET, "/api/alarms?active=true", None).await;
        assert_eq!(after.as_array().unwrap().len() + 1, active_before);

        assert!(matches!(
            events.try_recv().unwrap(),
            Some(HmiEvent::AlarmAcknowledged(_))
        ));
    }
}

// =============================================================================
// FILE SYSTEM
// =============================================================================

#[cfg(test)]
mod filesystem {
    use super::*;

    #[tokio::test]
    async fn test_write_is_visible_in_next_scan() {
        let gw = gateway();

        let (status, _) = call(
            &gw.app,
            Method::POST,
            "/api/filesystem/directory",
            Some(json!({ "path": "logs" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        // Prime the cache for the directory
        let (_, first) = call(&gw.app, Method::GET, "/api/filesystem/scan/logs", None).await;
        assert_eq!(first["totalFiles"], 0);

        let (status, _) = call(
            &gw.app,
            Method::POST,
            "/api/filesystem/file",
            Some(json!({ "path": "logs/today.log", "content": "boot ok" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (_, second) = call(&gw.app, Method::GET, "/api/filesystem/scan/logs", None).await;
        assert_eq!(second["totalFiles"], 1);
        assert_eq!(second["files"][0]["name"], "today.log");

        let uri = format!("/api/filesystem/file/{}", encode("logs/today.log"));
        let (_, read) = call(&gw.app, Method::GET, &uri, None).await;
        assert_eq!(read["content"], "boot ok");
    }

    #[tokio::test]
    async fn test_traversal_is_rejected() {
        let gw = gateway();
        let uri = format!("/api/filesystem/file/{}", encode("../etc/passwd"));
        let (status, _) = call(&gw.app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}

// =============================================================================
// PUSH CHANNEL
// =============================================================================

#[cfg(test)]
mod push_channel {
    use super::*;
    use hmi_06_api_gateway::ws::{handle_command, initial_snapshot};
    use shared_bus::{EventFilter, EventTopic, HmiEvent};

    #[tokio::test]
    async fn test_snapshot_reflects_seeded_state() {
        let gw = gateway();

        match initial_snapshot(&gw.state) {
            HmiEvent::InitialData(snapshot) => {
                assert_eq!(snapshot.operations.len(), 2);
                assert!(!snapshot.directories.is_empty());
                assert!(snapshot.alarms.iter().all(|a| a.is_pending()));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_operation_is_broadcast() {
        let gw = gateway();
        let mut operations = gw
            .state
            .bus
            .subscribe(EventFilter::topics(vec![EventTopic::Operations]));

        let reply = handle_command(
            &gw.state,
            r#"{"type":"CREATE_OPERATION","data":{"type":"BACKUP_DIR","target":"client"}}"#,
        )
        .await;
        assert!(reply.is_none());

        match operations.try_recv().unwrap() {
            Some(HmiEvent::OperationCreated(op)) => assert_eq!(op.target, "client"),
            other => panic!("unexpected event: {other:?}"),
        }
        assert_eq!(gw.state.operations.list().len(), 3);
    }

    #[tokio::test]
    async fn test_get_files_replies_with_listing() {
        let gw = gateway();
        gw.state.scanner.write_file("notes.txt", "hello").await.unwrap();

        let reply = handle_command(&gw.state, r#"{"type":"GET_FILES","data":{"path":"."}}"#).await;
        match reply {
            Some(HmiEvent::FilesUpdate(listing)) => {
                assert!(listing.files.iter().any(|f| f.name == "notes.txt"));
            }
            other => panic!("unexpected reply: {other:?}"),
        }
    }
}
