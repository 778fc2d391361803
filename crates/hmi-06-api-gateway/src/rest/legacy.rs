//! Flat routes kept for older dashboard builds.

use axum::extract::State;
use axum::Json;
use shared_types::{directory_summaries, DirectorySummary, FileOperation, SystemMetrics};

use crate::router::AppState;

pub async fn list_directories(State(state): State<AppState>) -> Json<Vec<DirectorySummary>> {
    Json(directory_summaries(&state.registry.all_nodes()))
}

pub async fn list_operations(State(state): State<AppState>) -> Json<Vec<FileOperation>> {
    Json(state.operations.list())
}

pub async fn current_metrics(State(state): State<AppState>) -> Json<SystemMetrics> {
    Json(state.metrics.snapshot())
}
