//! Versioned services and resource authentication.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use catalyst_core::model::{
    CreateServiceRequest, NodeCredentials, ResourceFilter, ServiceResource, ServiceView,
};
use catalyst_core::query::{resources, RawListRequest};
use catalyst_core::ListEnvelope;
use serde_json::{Map, Value};
use tracing::{info, warn};

use super::{AppState, StatusMessage};
use crate::network::error::HttpResult;

pub async fn list(
    State(state): State<AppState>,
    query: Result<Query<RawListRequest>, QueryRejection>,
) -> HttpResult<Json<ListEnvelope<ServiceView>>> {
    let Query(raw) = query?;
    let page = state.services.services.list(&raw).await?;
    Ok(Json(page.into_envelope(resources::SERVICES.resource_key)))
}

pub async fn create(
    State(state): State<AppState>,
    body: Result<Json<CreateServiceRequest>, JsonRejection>,
) -> HttpResult<Json<ServiceView>> {
    let Json(request) = body?;
    Ok(Json(state.services.services.create(request).await?))
}

pub async fn get(
    State(state): State<AppState>,
    Path(service_id): Path<String>,
) -> HttpResult<Json<ServiceView>> {
    Ok(Json(state.services.services.get(&service_id).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Path(service_id): Path<String>,
    body: Result<Json<Map<String, Value>>, JsonRejection>,
) -> HttpResult<Json<ServiceView>> {
    let Json(patch) = body?;
    Ok(Json(
        state.services.services.update(&service_id, patch).await?,
    ))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(service_id): Path<String>,
) -> HttpResult<Json<StatusMessage>> {
    state.services.services.delete(&service_id).await?;
    Ok(Json(StatusMessage::new(200, "Service deleted successfully")))
}

pub async fn versions(
    State(state): State<AppState>,
    Path(service_id): Path<String>,
) -> HttpResult<Json<Vec<ServiceView>>> {
    Ok(Json(state.services.services.versions(&service_id).await?))
}

pub async fn resources(
    State(state): State<AppState>,
    Path(service_id): Path<String>,
    query: Result<Query<ResourceFilter>, QueryRejection>,
) -> HttpResult<Json<Vec<ServiceResource>>> {
    let Query(filter) = query?;
    Ok(Json(
        state
            .services
            .services
            .resources(&service_id, &filter)
            .await?,
    ))
}

/// Starts authentication and answers 202; verification and bootstrap
/// continue in the background.
///
/// The body is the credentials object, optionally wrapped as
/// `{ "credentials": {...} }`.
pub async fn authenticate(
    State(state): State<AppState>,
    Path((service_id, resource_id)): Path<(String, String)>,
    body: Result<Json<Value>, JsonRejection>,
) -> HttpResult<(StatusCode, Json<StatusMessage>)> {
    let Json(mut body) = body?;
    let wrapped = body.get("credentials").is_some_and(Value::is_object);
    let raw = if wrapped {
        body["credentials"].take()
    } else {
        body
    };
    let credentials = NodeCredentials::from_value(raw)?;

    let services = state.services.services.clone();
    let job = services
        .begin_authentication(&service_id, &resource_id)
        .await?;
    tokio::spawn(async move {
        match services.complete_authentication(&job, credentials).await {
            Ok(outcome) => info!(
                service_id = %job.service_id,
                resource_id = %job.resource_id(),
                ?outcome,
                "authentication finished"
            ),
            Err(err) => warn!(
                service_id = %job.service_id,
                resource_id = %job.resource_id(),
                error = %err,
                "authentication aborted"
            ),
        }
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(StatusMessage::new(202, "Authentication is in Progress")),
    ))
}
