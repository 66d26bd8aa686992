//! Registered git repositories.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::Json;
use catalyst_core::model::{GitHubRequest, GitHubView};
use catalyst_core::query::{resources, RawListRequest};
use catalyst_core::ListEnvelope;
use tracing::info;

use super::{AppState, StatusMessage};
use crate::network::error::HttpResult;

pub async fn list(
    State(state): State<AppState>,
    query: Result<Query<RawListRequest>, QueryRejection>,
) -> HttpResult<Json<ListEnvelope<GitHubView>>> {
    let Query(raw) = query?;
    let page = state.services.github.list(&raw).await?;
    Ok(Json(page.into_envelope(resources::GIT_HUB.resource_key)))
}

pub async fn create(
    State(state): State<AppState>,
    body: Result<Json<GitHubRequest>, JsonRejection>,
) -> HttpResult<Json<GitHubView>> {
    let Json(request) = body?;
    Ok(Json(state.services.github.create(request).await?))
}

pub async fn get(
    State(state): State<AppState>,
    Path(git_hub_id): Path<String>,
) -> HttpResult<Json<GitHubView>> {
    Ok(Json(state.services.github.get(&git_hub_id).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Path(git_hub_id): Path<String>,
    body: Result<Json<GitHubRequest>, JsonRejection>,
) -> HttpResult<Json<GitHubView>> {
    let Json(request) = body?;
    Ok(Json(
        state.services.github.update(&git_hub_id, request).await?,
    ))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(git_hub_id): Path<String>,
) -> HttpResult<Json<StatusMessage>> {
    state.services.github.delete(&git_hub_id).await?;
    Ok(Json(StatusMessage::new(200, "Git-Hub deleted successfully")))
}

/// Downloads and extracts the repository; answers once the sync is done.
pub async fn sync(
    State(state): State<AppState>,
    Path(git_hub_id): Path<String>,
) -> HttpResult<Json<StatusMessage>> {
    state.services.github.sync(&git_hub_id).await?;
    info!(git_hub_id = %git_hub_id, "repository synced");
    Ok(Json(StatusMessage::new(200, "Git-Hub sync completed")))
}
