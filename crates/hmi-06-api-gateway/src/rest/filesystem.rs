//! File-system convenience routes over the directory scanner.
//!
//! Paths are relative to the scanner's base directory. Mutations go
//! through the scanner so its cache is invalidated up the ancestor chain.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use hmi_02_fs_scanner::paths::ROOT;
use serde::{Deserialize, Serialize};
use shared_types::{DirectoryStructure, FilePathItem};
use tracing::info;

use crate::domain::error::{ApiError, ApiResult};
use crate::router::AppState;

#[derive(Debug, Serialize)]
pub struct FileContent {
    pub path: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateDirectoryRequest {
    pub path: String,
}

#[derive(Debug, Deserialize)]
pub struct WriteFileRequest {
    pub path: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct CopyRequest {
    pub source: String,
    pub destination: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub pattern: Option<String>,
    pub path: Option<String>,
}

/// Acknowledgement body for mutations
#[derive(Debug, Serialize)]
pub struct MutationResult {
    pub message: String,
    pub path: String,
}

impl MutationResult {
    fn new(message: &str, path: impl Into<String>) -> Json<Self> {
        Json(Self {
            message: message.to_string(),
            path: path.into(),
        })
    }
}

pub async fn scan_root(State(state): State<AppState>) -> ApiResult<Json<DirectoryStructure>> {
    scan_path(&state, ROOT).await
}

pub async fn scan_directory(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> ApiResult<Json<DirectoryStructure>> {
    scan_path(&state, &path).await
}

async fn scan_path(state: &AppState, path: &str) -> ApiResult<Json<DirectoryStructure>> {
    state
        .scanner
        .scan(path)
        .await
        .map(Json)
        .map_err(|e| ApiError::scan("Failed to scan directory", e))
}

pub async fn read_file(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> ApiResult<Json<FileContent>> {
    let content = state
        .scanner
        .read_file(&path)
        .await
        .map_err(|e| ApiError::scan("Failed to read file", e))?;
    Ok(Json(FileContent { path, content }))
}

pub async fn create_directory(
    State(state): State<AppState>,
    payload: Result<Json<CreateDirectoryRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<MutationResult>)> {
    let Json(request) =
        payload.map_err(|e| ApiError::bad_request("Failed to create directory", e.body_text()))?;
    state
        .scanner
        .create_directory(&request.path)
        .await
        .map_err(|e| ApiError::scan("Failed to create directory", e))?;
    info!(path = %request.path, "Directory created");
    Ok((
        StatusCode::CREATED,
        MutationResult::new("Directory created", request.path),
    ))
}

pub async fn write_file(
    State(state): State<AppState>,
    payload: Result<Json<WriteFileRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<MutationResult>)> {
    let Json(request) =
        payload.map_err(|e| ApiError::bad_request("Failed to write file", e.body_text()))?;
    state
        .scanner
        .write_file(&request.path, &request.content)
        .await
        .map_err(|e| ApiError::scan("Failed to write file", e))?;
    info!(path = %request.path, bytes = request.content.len(), "File written");
    Ok((
        StatusCode::CREATED,
        MutationResult::new("File written", request.path),
    ))
}

pub async fn delete_path(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> ApiResult<Json<MutationResult>> {
    state
        .scanner
        .delete(&path)
        .await
        .map_err(|e| ApiError::scan("Failed to delete", e))?;
    info!(path = %path, "Path deleted");
    Ok(MutationResult::new("Deleted", path))
}

pub async fn copy_file(
    State(state): State<AppState>,
    payload: Result<Json<CopyRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<MutationResult>)> {
    let Json(request) =
        payload.map_err(|e| ApiError::bad_request("Failed to copy file", e.body_text()))?;
    state
        .scanner
        .copy_file(&request.source, &request.destination)
        .await
        .map_err(|e| ApiError::scan("Failed to copy file", e))?;
    info!(source = %request.source, destination = %request.destination, "File copied");
    Ok((
        StatusCode::CREATED,
        MutationResult::new("File copied", request.destination),
    ))
}

pub async fn path_stats(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> ApiResult<Json<FilePathItem>> {
    state
        .scanner
        .path_stats(&path)
        .await
        .map(Json)
        .map_err(|e| ApiError::scan("Failed to get path stats", e))
}

pub async fn search(
    State(state): State<AppState>,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<FilePathItem>>> {
    let Query(query) = query?;
    let pattern = query
        .pattern
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::new(StatusCode::BAD_REQUEST, "Search pattern is required"))?;
    let root = query.path.unwrap_or_else(|| ROOT.to_string());

    state
        .scanner
        .search(&pattern, &root)
        .await
        .map(Json)
        .map_err(|e| ApiError::scan("Failed to search files", e))
}
