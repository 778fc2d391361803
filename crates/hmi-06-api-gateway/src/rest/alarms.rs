//! Alarm routes.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use shared_bus::{EventPublisher, HmiEvent};
use shared_types::{NewTagAlarm, TagAlarm};
use tracing::info;

use crate::domain::error::{ApiError, ApiResult};
use crate::router::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct AlarmQuery {
    /// `true` restricts the listing to active, unacknowledged alarms
    pub active: Option<bool>,
}

pub async fn list_alarms(
    State(state): State<AppState>,
    query: Result<Query<AlarmQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<TagAlarm>>> {
    let Query(query) = query?;
    let alarms = if query.active.unwrap_or(false) {
        state.registry.active_alarms()
    } else {
        state.registry.all_alarms()
    };
    Ok(Json(alarms))
}

pub async fn create_alarm(
    State(state): State<AppState>,
    payload: Result<Json<NewTagAlarm>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<TagAlarm>)> {
    let Json(data) =
        payload.map_err(|e| ApiError::bad_request("Failed to create alarm", e.body_text()))?;
    let alarm = state
        .registry
        .create_alarm(data)
        .map_err(|e| ApiError::registry("Failed to create alarm", e))?;

    info!(alarm = %alarm.alarm_path, priority = alarm.priority, "Alarm created");
    if alarm.is_pending() {
        state.bus.publish(HmiEvent::AlarmRaised(alarm.clone())).await;
    }
    Ok((StatusCode::CREATED, Json(alarm)))
}

pub async fn acknowledge_alarm(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> ApiResult<Json<TagAlarm>> {
    let alarm = state
        .registry
        .acknowledge_alarm(&path)
        .ok_or_else(|| ApiError::not_found("Alarm"))?;

    info!(alarm = %alarm.alarm_path, "Alarm acknowledged");
    state
        .bus
        .publish(HmiEvent::AlarmAcknowledged(alarm.clone()))
        .await;
    Ok(Json(alarm))
}
