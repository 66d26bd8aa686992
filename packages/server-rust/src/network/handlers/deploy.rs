//! Application deployment pipeline, history and list.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::Json;
use catalyst_core::model::{AppDeployRecord, PipelineRow};
use catalyst_core::query::{resources, RawListRequest};
use catalyst_core::ListEnvelope;
use serde_json::Value;

use super::AppState;
use crate::network::error::HttpResult;
use crate::service::DeployHistoryKey;

pub async fn pipeline(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> HttpResult<Json<Vec<PipelineRow>>> {
    Ok(Json(state.services.deploy.pipeline(&project_id).await?))
}

pub async fn history(
    State(state): State<AppState>,
    Path(key): Path<DeployHistoryKey>,
) -> HttpResult<Json<Vec<AppDeployRecord>>> {
    Ok(Json(state.services.deploy.history(&key).await?))
}

pub async fn list(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    query: Result<Query<RawListRequest>, QueryRejection>,
) -> HttpResult<Json<ListEnvelope<Value>>> {
    let Query(raw) = query?;
    let page = state.services.deploy.list(&project_id, &raw).await?;
    Ok(Json(page.into_envelope(resources::APP_DEPLOY.resource_key)))
}
