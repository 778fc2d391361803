//! Gateway configuration store routes.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use shared_types::{NewSystemConfig, SystemConfigEntry};
use tracing::info;

use crate::domain::error::{ApiError, ApiResult};
use crate::router::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigQuery {
    pub config_path: Option<String>,
}

/// One entry when `configPath` is given, otherwise every entry.
pub async fn get_config(
    State(state): State<AppState>,
    query: Result<Query<ConfigQuery>, QueryRejection>,
) -> ApiResult<Response> {
    let Query(query) = query?;
    match query.config_path {
        Some(path) => state
            .registry
            .get_config(&path)
            .map(|entry| Json(entry).into_response())
            .ok_or_else(|| ApiError::not_found("Configuration")),
        None => Ok(Json(state.registry.all_configs()).into_response()),
    }
}

pub async fn set_config(
    State(state): State<AppState>,
    payload: Result<Json<NewSystemConfig>, JsonRejection>,
) -> ApiResult<Json<SystemConfigEntry>> {
    let Json(data) = payload
        .map_err(|e| ApiError::bad_request("Failed to set configuration", e.body_text()))?;
    let entry = state
        .registry
        .set_config(data)
        .map_err(|e| ApiError::registry("Failed to set configuration", e))?;
    info!(config = %entry.config_path, value = %entry.config_value, "Configuration updated");
    Ok(Json(entry))
}
