//! Namespace routes: nodes, tags and tag values.
//!
//! Path parameters are URL-decoded, so `Enterprise%2FSite1` addresses the
//! node `Enterprise/Site1`.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use hmi_01_uns_registry::DEFAULT_HISTORY_LIMIT;
use serde::Deserialize;
use serde_json::Value;
use shared_bus::{EventPublisher, HmiEvent};
use shared_types::{NewUnsNode, NewUnsTag, Quality, TagHistoryEntry, UnsNode, UnsTag};
use tracing::info;

use crate::domain::error::{ApiError, ApiResult};
use crate::router::AppState;

// =============================================================================
// NODES
// =============================================================================

pub async fn list_nodes(State(state): State<AppState>) -> Json<Vec<UnsNode>> {
    Json(state.registry.all_nodes())
}

pub async fn get_node(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> ApiResult<Json<UnsNode>> {
    state
        .registry
        .get_node(&path)
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Node"))
}

pub async fn node_children(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Json<Vec<UnsNode>> {
    Json(state.registry.children(&path))
}

pub async fn create_node(
    State(state): State<AppState>,
    payload: Result<Json<NewUnsNode>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<UnsNode>)> {
    let Json(data) = payload.map_err(|e| ApiError::bad_request("Failed to create node", e.body_text()))?;
    let node = state
        .registry
        .create_node(data)
        .map_err(|e| ApiError::registry("Failed to create node", e))?;
    info!(node = %node.node_id, "Node created");
    Ok((StatusCode::CREATED, Json(node)))
}

// =============================================================================
// TAGS
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagQuery {
    pub node_id: Option<String>,
}

pub async fn list_tags(
    State(state): State<AppState>,
    query: Result<Query<TagQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<UnsTag>>> {
    let Query(query) = query?;
    let tags = match query.node_id.as_deref() {
        Some(node) if !node.is_empty() => state.registry.tags_by_node(node),
        _ => state.registry.all_tags(),
    };
    Ok(Json(tags))
}

pub async fn get_tag(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> ApiResult<Json<UnsTag>> {
    state
        .registry
        .get_tag(&path)
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Tag"))
}

pub async fn create_tag(
    State(state): State<AppState>,
    payload: Result<Json<NewUnsTag>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<UnsTag>)> {
    let Json(data) = payload.map_err(|e| ApiError::bad_request("Failed to create tag", e.body_text()))?;
    let tag = state
        .registry
        .create_tag(data)
        .map_err(|e| ApiError::registry("Failed to create tag", e))?;
    info!(tag = %tag.tag_path, "Tag created");
    Ok((StatusCode::CREATED, Json(tag)))
}

/// Body of `PUT /api/uns/tags/:path/value`
#[derive(Debug, Deserialize)]
pub struct TagValueUpdate {
    /// Any JSON scalar; stored as text
    pub value: Value,
    #[serde(default)]
    pub quality: Option<Quality>,
}

/// Text form of a written value. Strings are stored verbatim, everything
/// else as its JSON rendering.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub async fn update_tag_value(
    State(state): State<AppState>,
    Path(path): Path<String>,
    payload: Result<Json<TagValueUpdate>, JsonRejection>,
) -> ApiResult<Json<UnsTag>> {
    let Json(update) =
        payload.map_err(|e| ApiError::bad_request("Failed to update tag value", e.body_text()))?;

    let tag = state
        .registry
        .update_tag_value(&path, value_text(&update.value), update.quality)
        .ok_or_else(|| ApiError::not_found("Tag"))?;

    info!(tag = %tag.tag_path, value = %tag.value, quality = %tag.quality, "Tag value written");
    state
        .bus
        .publish(HmiEvent::TagValueUpdated(tag.clone()))
        .await;
    Ok(Json(tag))
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

pub async fn tag_history(
    State(state): State<AppState>,
    Path(path): Path<String>,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<TagHistoryEntry>>> {
    let Query(query) = query?;
    let limit = query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    Ok(Json(state.registry.tag_history(&path, limit)))
}
