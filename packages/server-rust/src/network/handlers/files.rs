//! Uploads of descriptors and key files, base64 encoded in JSON.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use catalyst_core::{ApiError, OrInternal};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use super::AppState;
use crate::network::error::HttpResult;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest {
    pub file_name: String,
    /// File contents, base64 encoded.
    pub file_data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileResponse {
    pub file_id: String,
    pub file_name: String,
    pub file_data: String,
}

/// Stores an upload and returns `{ fileId }`.
pub async fn upload(
    State(state): State<AppState>,
    body: Result<Json<UploadRequest>, JsonRejection>,
) -> HttpResult<Json<Value>> {
    let Json(request) = body?;
    if request.file_name.trim().is_empty() {
        return Err(ApiError::validation("fileName", "File name is required").into());
    }
    let data = STANDARD
        .decode(request.file_data.as_bytes())
        .map_err(|err| ApiError::validation("fileData", format!("Invalid base64: {err}")))?;
    let size = data.len();
    let file_id = state
        .services
        .files
        .write(&request.file_name, data)
        .await
        .or_internal("fileData")?;
    debug!(file_id = %file_id, size, "file stored");
    Ok(Json(json!({ "fileId": file_id })))
}

pub async fn download(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
) -> HttpResult<Json<FileResponse>> {
    let file = state
        .services
        .files
        .read(&file_id)
        .await
        .or_internal("fileId")?
        .ok_or_else(|| ApiError::not_found("fileId", "File not found"))?;
    Ok(Json(FileResponse {
        file_id: file.id,
        file_name: file.name,
        file_data: STANDARD.encode(&file.data),
    }))
}
