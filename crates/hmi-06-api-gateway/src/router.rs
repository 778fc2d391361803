//! Route table and middleware stack.

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post, put};
use axum::Router;
use hmi_01_uns_registry::PathRegistry;
use hmi_02_fs_scanner::DirectoryScanner;
use hmi_03_simulator::{MetricsSimulator, OperationQueue};
use hmi_05_plc_deployment::PlcDeployer;
use shared_bus::InMemoryEventBus;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::timeout::TimeoutLayer;

use crate::domain::config::{GatewayConfig, WebSocketConfig};
use crate::middleware::{create_cors_layer, track_requests, GatewayMetrics, TracingLayer};
use crate::rest::{self, alarms, filesystem, hmi, legacy, system, uns, views};
use crate::ws;

/// Shared handler state. Every field is cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<PathRegistry>,
    pub scanner: Arc<DirectoryScanner>,
    pub deployer: Arc<PlcDeployer>,
    pub metrics: Arc<MetricsSimulator>,
    pub operations: Arc<OperationQueue>,
    pub bus: Arc<InMemoryEventBus>,
    pub gateway_metrics: Arc<GatewayMetrics>,
    pub websocket: WebSocketConfig,
}

/// Build the full HTTP router.
///
/// Path parameters that address namespace entries or files are single
/// segments; clients URL-encode embedded slashes (`Enterprise%2FSite1`).
pub fn build_router(state: AppState, config: &GatewayConfig) -> Router {
    let middleware = ServiceBuilder::new()
        .layer(create_cors_layer(&config.cors))
        .layer(TracingLayer::new())
        .layer(axum::middleware::from_fn_with_state(
            state.gateway_metrics.clone(),
            track_requests,
        ))
        .layer(TimeoutLayer::new(config.timeouts.request))
        .layer(DefaultBodyLimit::max(config.limits.max_request_size));

    Router::new()
        .route("/health", get(rest::health_check))
        // Namespace
        .route("/api/uns/nodes", get(uns::list_nodes).post(uns::create_node))
        .route("/api/uns/nodes/:path", get(uns::get_node))
        .route("/api/uns/nodes/:path/children", get(uns::node_children))
        .route("/api/uns/tags", get(uns::list_tags).post(uns::create_tag))
        .route("/api/uns/tags/:path", get(uns::get_tag))
        .route("/api/uns/tags/:path/value", put(uns::update_tag_value))
        .route("/api/uns/tags/:path/history", get(uns::tag_history))
        // Alarms
        .route("/api/alarms", get(alarms::list_alarms).post(alarms::create_alarm))
        .route("/api/alarms/:path/acknowledge", put(alarms::acknowledge_alarm))
        // Views
        .route(
            "/api/perspective/views",
            get(views::list_views).post(views::create_view),
        )
        .route("/api/perspective/views/:path", get(views::get_view))
        // Gateway configuration
        .route(
            "/api/system/config",
            get(system::get_config).put(system::set_config),
        )
        // File system
        .route("/api/filesystem/scan", get(filesystem::scan_root))
        // `scan/%2E` is collapsed to `scan/` by browsers
        .route("/api/filesystem/scan/", get(filesystem::scan_root))
        .route("/api/filesystem/scan/:path", get(filesystem::scan_directory))
        .route("/api/filesystem/file/:path", get(filesystem::read_file))
        .route("/api/filesystem/file", post(filesystem::write_file))
        .route("/api/filesystem/directory", post(filesystem::create_directory))
        .route("/api/filesystem/copy", post(filesystem::copy_file))
        .route("/api/filesystem/stats/:path", get(filesystem::path_stats))
        .route("/api/filesystem/search", get(filesystem::search))
        .route("/api/filesystem/:path", delete(filesystem::delete_path))
        // Flat dashboard routes
        .route("/api/directories", get(legacy::list_directories))
        .route("/api/operations", get(legacy::list_operations))
        .route("/api/metrics", get(legacy::current_metrics))
        // Generated controller artifacts
        .route("/hmi/*rest", get(hmi::serve_artifact))
        // Push channel
        .route(&config.websocket.path, get(ws::ws_upgrade))
        .layer(middleware)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use hmi_01_uns_registry::seed::{metric_tags, METRICS_PLC_PATH};
    use hmi_01_uns_registry::seed_registry;
    use hmi_03_simulator::SequenceRandomSource;
    use serde_json::{json, Value};
    use shared_bus::{EventFilter, EventPublisher, HmiEvent};
    use tempfile::TempDir;
    use tower::ServiceExt;

    struct Fixture {
        _dir: TempDir,
        state: AppState,
        app: Router,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let registry = Arc::new(PathRegistry::new());
        seed_registry(&registry).unwrap();
        let bus = Arc::new(InMemoryEventBus::new());
        let publisher: Arc<dyn EventPublisher> = bus.clone();
        let rng = Arc::new(SequenceRandomSource::neutral());

        let state = AppState {
            registry: registry.clone(),
            scanner: Arc::new(DirectoryScanner::new(dir.path())),
            deployer: Arc::new(PlcDeployer::new(dir.path())),
            metrics: Arc::new(MetricsSimulator::new(
                registry.clone(),
                publisher.clone(),
                rng.clone(),
            )),
            operations: Arc::new(OperationQueue::seeded(registry, publisher, rng)),
            bus,
            gateway_metrics: Arc::new(GatewayMetrics::new()),
            websocket: WebSocketConfig::default(),
        };
        let app = build_router(state.clone(), &GatewayConfig::default());
        Fixture {
            _dir: dir,
            state,
            app,
        }
    }

    fn encode(path: &str) -> String {
        path.replace('/', "%2F")
    }

    async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let response = app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_health() {
        let f = fixture();
        let (status, body) = call(&f.app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_node_lookup_decodes_path() {
        let f = fixture();
        let uri = format!("/api/uns/nodes/{}", encode("Enterprise/Site1"));
        let (status, body) = call(&f.app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["nodeId"], "Enterprise/Site1");

        let (status, body) = call(&f.app, Method::GET, "/api/uns/nodes/Nowhere", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Node not found");
    }

    #[tokio::test]
    async fn test_children_are_direct_only() {
        let f = fixture();
        let uri = format!("/api/uns/nodes/{}/children", encode("Enterprise"));
        let (status, body) = call(&f.app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        let children = body.as_array().unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0]["nodeId"], "Enterprise/Site1");
    }

    #[tokio::test]
    async fn test_tag_value_write_defaults_quality_and_broadcasts() {
        let f = fixture();
        let mut subscription = f.state.bus.subscribe(EventFilter::all());
        let before = f.state.registry.get_tag(metric_tags::CPU_USAGE).unwrap();

        let uri = format!("/api/uns/tags/{}/value", encode(metric_tags::CPU_USAGE));
        let (status, body) =
            call(&f.app, Method::PUT, &uri, Some(json!({ "value": 55.5 }))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["value"], "55.5");
        assert_eq!(body["quality"], "Good");
        let after = f.state.registry.get_tag(metric_tags::CPU_USAGE).unwrap();
        assert!(after.timestamp >= before.timestamp);

        match subscription.try_recv().unwrap() {
            Some(HmiEvent::TagValueUpdated(tag)) => assert_eq!(tag.value, "55.5"),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_tag_value_write_errors() {
        let f = fixture();
        let (status, body) = call(
            &f.app,
            Method::PUT,
            "/api/uns/tags/Missing%2FTag/value",
            Some(json!({ "value": "Stopped" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Tag not found");

        let uri = format!("/api/uns/tags/{}/value", encode(metric_tags::CPU_USAGE));
        let (status, _) = call(&f.app, Method::PUT, &uri, Some(json!({ "quality": "Bad" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_tags_filtered_by_node() {
        let f = fixture();
        let uri = format!("/api/uns/tags?nodeId={}", encode(METRICS_PLC_PATH));
        let (status, body) = call(&f.app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        let tags = body.as_array().unwrap();
        assert!(!tags.is_empty());
        assert!(tags.iter().all(|t| t["nodeId"] == METRICS_PLC_PATH));
    }

    #[tokio::test]
    async fn test_tag_history_is_empty() {
        let f = fixture();
        let uri = format!("/api/uns/tags/{}/history?limit=5", encode(metric_tags::CPU_USAGE));
        let (status, body) = call(&f.app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn test_create_node_validation() {
        let f = fixture();
        let (status, body) = call(
            &f.app,
            Method::POST,
            "/api/uns/nodes",
            Some(json!({
                "nodeId": "Enterprise/Site1/Lab",
                "parentNodeId": "Enterprise/Site1",
                "name": "Lab",
                "nodeType": "Area",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["nodeId"], "Enterprise/Site1/Lab");

        let (status, body) = call(
            &f.app,
            Method::POST,
            "/api/uns/nodes",
            Some(json!({ "nodeId": "", "name": "", "nodeType": "Area" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Failed to create node");
    }

    #[tokio::test]
    async fn test_alarm_acknowledge_flow() {
        let f = fixture();
        let (_, active) = call(&f.app, Method::GET, "/api/alarms?active=true", None).await;
        assert_eq!(active.as_array().unwrap().len(), 1);

        let path = format!("{METRICS_PLC_PATH}/Alarms/FileConflict");
        let uri = format!("/api/alarms/{}/acknowledge", encode(&path));
        let (status, body) = call(&f.app, Method::PUT, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["isAcknowledged"], true);
        assert_eq!(body["isActive"], true);
        assert!(!body["ackTime"].is_null());

        let (_, active) = call(&f.app, Method::GET, "/api/alarms?active=true", None).await;
        assert!(active.as_array().unwrap().is_empty());

        let (status, _) = call(&f.app, Method::PUT, "/api/alarms/Nope/acknowledge", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_system_config_routes() {
        let f = fixture();
        let (status, body) = call(
            &f.app,
            Method::GET,
            "/api/system/config?configPath=System/Gateway/Version",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["configValue"], "8.1.25");

        let (status, _) = call(
            &f.app,
            Method::GET,
            "/api/system/config?configPath=System/Unknown",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = call(
            &f.app,
            Method::PUT,
            "/api/system/config",
            Some(json!({ "configPath": "System/Gateway/Version", "configValue": "9" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = call(
            &f.app,
            Method::PUT,
            "/api/system/config",
            Some(json!({
                "configPath": "System/Perspective/SessionTimeout",
                "configValue": "1800",
                "dataType": "Int32",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["configValue"], "1800");
    }

    #[tokio::test]
    async fn test_filesystem_round_trip() {
        let f = fixture();
        let (status, _) = call(
            &f.app,
            Method::POST,
            "/api/filesystem/directory",
            Some(json!({ "path": "docs" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, _) = call(
            &f.app,
            Method::POST,
            "/api/filesystem/file",
            Some(json!({ "path": "docs/readme.md", "content": "hello" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = call(&f.app, Method::GET, "/api/filesystem/scan/docs", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["files"][0]["name"], "readme.md");

        let uri = format!("/api/filesystem/file/{}", encode("docs/readme.md"));
        let (status, body) = call(&f.app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["content"], "hello");

        let (status, body) = call(
            &f.app,
            Method::GET,
            "/api/filesystem/search?pattern=README",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);

        let (status, _) = call(
            &f.app,
            Method::POST,
            "/api/filesystem/copy",
            Some(json!({ "source": "docs/readme.md", "destination": "docs/copy.md" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let delete_uri = format!("/api/filesystem/{}", encode("docs/readme.md"));
        let (status, _) = call(&f.app, Method::DELETE, &delete_uri, None).await;
        assert_eq!(status, StatusCode::OK);

        let stats_uri = format!("/api/filesystem/stats/{}", encode("docs/readme.md"));
        let (status, _) = call(&f.app, Method::GET, &stats_uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_filesystem_errors() {
        let f = fixture();
        let (status, _) = call(&f.app, Method::GET, "/api/filesystem/scan/missing", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = call(&f.app, Method::GET, "/api/filesystem/search", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let uri = format!("/api/filesystem/scan/{}", encode("../etc"));
        let (status, _) = call(&f.app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_root_scan_with_trailing_slash() {
        let f = fixture();
        for uri in [
            "/api/filesystem/scan",
            "/api/filesystem/scan/",
            "/api/filesystem/scan/.",
            "/api/filesystem/scan/%2E",
        ] {
            let (status, body) = call(&f.app, Method::GET, uri, None).await;
            assert_eq!(status, StatusCode::OK, "{uri}");
            assert_eq!(body["path"], ".", "{uri}");
        }
    }

    #[tokio::test]
    async fn test_search_under_missing_directory_is_empty() {
        let f = fixture();
        let (status, body) = call(
            &f.app,
            Method::GET,
            "/api/filesystem/search?pattern=x&path=missing",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));

        let (status, _) = call(
            &f.app,
            Method::GET,
            "/api/filesystem/search?pattern=x&path=..%2Foutside",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_legacy_routes() {
        let f = fixture();
        let (status, body) = call(&f.app, Method::GET, "/api/operations", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 2);

        let (status, body) = call(&f.app, Method::GET, "/api/metrics", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["cpuUsage"], 25.3);

        let (status, body) = call(&f.app, Method::GET, "/api/directories", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body
            .as_array()
            .unwrap()
            .iter()
            .any(|d| d["path"] == "Enterprise/Site1"));
    }

    #[tokio::test]
    async fn test_hmi_artifacts() {
        let f = fixture();
        let (status, _) = call(&f.app, Method::GET, "/hmi/client/plc-config.json", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let plc_dir = f.state.deployer.base_path().join("client/.plc");
        std::fs::create_dir_all(&plc_dir).unwrap();
        std::fs::write(plc_dir.join("plc-config.json"), r#"{"plcId":"PLC_1"}"#).unwrap();

        let response = f
            .app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/hmi/client/plc-config.json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
    }

    #[tokio::test]
    async fn test_push_commands() {
        let f = fixture();
        let mut subscription = f.state.bus.subscribe(EventFilter::all());

        let reply = ws::handle_command(&f.state, r#"{"type":"GET_DIRECTORIES"}"#).await;
        assert!(matches!(reply, Some(HmiEvent::DirectoriesUpdate(d)) if !d.is_empty()));

        assert!(ws::handle_command(&f.state, "not json").await.is_none());
        assert!(ws::handle_command(&f.state, r#"{"type":"SELF_DESTRUCT"}"#)
            .await
            .is_none());

        let ack = format!(
            r#"{{"type":"ACKNOWLEDGE_ALARM","data":{{"alarmPath":"{METRICS_PLC_PATH}/Alarms/FileConflict"}}}}"#
        );
        assert!(ws::handle_command(&f.state, &ack).await.is_none());
        assert!(matches!(
            subscription.try_recv().unwrap(),
            Some(HmiEvent::AlarmAcknowledged(_))
        ));

        let create = r#"{"type":"CREATE_OPERATION","data":{"type":"SYNC_CHANGES","target":"client"}}"#;
        assert!(ws::handle_command(&f.state, create).await.is_none());
        assert_eq!(f.state.operations.list().len(), 3);
    }

    #[test]
    fn test_initial_snapshot_contents() {
        let f = fixture();
        match ws::initial_snapshot(&f.state) {
            HmiEvent::InitialData(snapshot) => {
                assert_eq!(snapshot.alarms.len(), 1);
                assert_eq!(snapshot.operations.len(), 2);
                assert!(!snapshot.directories.is_empty());
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
