//! Repository servers and Nexus browsing.

use axum::extract::{Path, State};
use axum::Json;
use catalyst_core::model::{NexusArtifact, NexusRepository};
use serde::Deserialize;
use serde_json::{json, Value};

use super::AppState;
use crate::network::error::HttpResult;
use crate::service::ArtifactCoordinates;

/// `{ server: [...] }` for one organization.
pub async fn repository_servers(
    State(state): State<AppState>,
    Path(org_id): Path<String>,
) -> HttpResult<Json<Value>> {
    let servers = state.services.artifacts.repository_servers(&org_id).await?;
    Ok(Json(json!({ "server": servers })))
}

pub async fn nexus_repositories(
    State(state): State<AppState>,
    Path((nexus_id, project_id)): Path<(String, String)>,
) -> HttpResult<Json<Vec<NexusRepository>>> {
    Ok(Json(
        state
            .services
            .artifacts
            .nexus_repositories(&nexus_id, &project_id)
            .await?,
    ))
}

pub async fn artifacts(
    State(state): State<AppState>,
    Path(coords): Path<ArtifactCoordinates>,
) -> HttpResult<Json<Vec<NexusArtifact>>> {
    Ok(Json(state.services.artifacts.artifacts(&coords).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionPath {
    nexus_id: String,
    repo_name: String,
    group_id: String,
    artifact_id: String,
}

pub async fn versions(
    State(state): State<AppState>,
    Path(path): Path<VersionPath>,
) -> HttpResult<Json<Vec<String>>> {
    let coords = ArtifactCoordinates {
        nexus_id: path.nexus_id,
        repo_name: path.repo_name,
        group_id: path.group_id,
    };
    Ok(Json(
        state
            .services
            .artifacts
            .versions(&coords, &path.artifact_id)
            .await?,
    ))
}
