//! Perspective view routes.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use shared_types::{NewPerspectiveView, PerspectiveView};

use crate::domain::error::{ApiError, ApiResult};
use crate::router::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewQuery {
    pub parent_path: Option<String>,
}

pub async fn list_views(
    State(state): State<AppState>,
    query: Result<Query<ViewQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<PerspectiveView>>> {
    let Query(query) = query?;
    let views = match query.parent_path.as_deref() {
        Some(parent) if !parent.is_empty() => state.registry.views_by_parent(parent),
        _ => state.registry.all_views(),
    };
    Ok(Json(views))
}

pub async fn get_view(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> ApiResult<Json<PerspectiveView>> {
    state
        .registry
        .get_view(&path)
        .map(Json)
        .ok_or_else(|| ApiError::not_found("View"))
}

pub async fn create_view(
    State(state): State<AppState>,
    payload: Result<Json<NewPerspectiveView>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<PerspectiveView>)> {
    let Json(data) =
        payload.map_err(|e| ApiError::bad_request("Failed to create view", e.body_text()))?;
    let view = state
        .registry
        .create_view(data)
        .map_err(|e| ApiError::registry("Failed to create view", e))?;
    Ok((StatusCode::CREATED, Json(view)))
}
