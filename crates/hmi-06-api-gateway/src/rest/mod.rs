//! REST handlers grouped by resource.

pub mod alarms;
pub mod filesystem;
pub mod hmi;
pub mod legacy;
pub mod system;
pub mod uns;
pub mod views;

use axum::extract::State;
use axum::Json;

use crate::router::AppState;

/// Liveness plus request counters
pub async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": crate::VERSION,
        "subscribers": state.bus.subscriber_count(),
        "metrics": state.gateway_metrics.to_json(),
    }))
}
