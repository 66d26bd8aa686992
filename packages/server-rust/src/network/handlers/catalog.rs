//! Provider, environment and project listings, and blueprint info.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::Json;
use catalyst_core::model::BlueprintInfo;
use catalyst_core::query::{resources, RawListRequest};
use catalyst_core::ListEnvelope;
use serde_json::Value;

use super::AppState;
use crate::network::error::HttpResult;
use crate::service::{EnvironmentListing, EnvironmentScope, ProjectScope};

type ListQuery = Result<Query<RawListRequest>, QueryRejection>;

pub async fn unmanaged_instances(
    State(state): State<AppState>,
    Path(provider_id): Path<String>,
    query: ListQuery,
) -> HttpResult<Json<ListEnvelope<Value>>> {
    let Query(raw) = query?;
    let page = state
        .services
        .catalog
        .unmanaged_instances(&provider_id, &raw)
        .await?;
    Ok(Json(page.into_envelope(resources::UNMANAGED_INSTANCES.resource_key)))
}

async fn environment_list(
    state: AppState,
    listing: EnvironmentListing,
    scope: EnvironmentScope,
    query: ListQuery,
) -> HttpResult<Json<ListEnvelope<Value>>> {
    let Query(raw) = query?;
    let page = state
        .services
        .catalog
        .environment_list(listing, &scope, &raw)
        .await?;
    Ok(Json(page.into_envelope(listing.schema().resource_key)))
}

pub async fn container_list(
    State(state): State<AppState>,
    Path(scope): Path<EnvironmentScope>,
    query: ListQuery,
) -> HttpResult<Json<ListEnvelope<Value>>> {
    environment_list(state, EnvironmentListing::Containers, scope, query).await
}

pub async fn instance_list(
    State(state): State<AppState>,
    Path(scope): Path<EnvironmentScope>,
    query: ListQuery,
) -> HttpResult<Json<ListEnvelope<Value>>> {
    environment_list(state, EnvironmentListing::Instances, scope, query).await
}

pub async fn task_list(
    State(state): State<AppState>,
    Path(scope): Path<EnvironmentScope>,
    query: ListQuery,
) -> HttpResult<Json<ListEnvelope<Value>>> {
    environment_list(state, EnvironmentListing::Tasks, scope, query).await
}

pub async fn cft_list(
    State(state): State<AppState>,
    Path(scope): Path<EnvironmentScope>,
    query: ListQuery,
) -> HttpResult<Json<ListEnvelope<Value>>> {
    environment_list(state, EnvironmentListing::CftStacks, scope, query).await
}

pub async fn azure_arm_list(
    State(state): State<AppState>,
    Path(scope): Path<EnvironmentScope>,
    query: ListQuery,
) -> HttpResult<Json<ListEnvelope<Value>>> {
    environment_list(state, EnvironmentListing::AzureArms, scope, query).await
}

pub async fn application_list(
    State(state): State<AppState>,
    Path(scope): Path<ProjectScope>,
    query: ListQuery,
) -> HttpResult<Json<ListEnvelope<Value>>> {
    let Query(raw) = query?;
    let page = state.services.catalog.applications(&scope, &raw).await?;
    Ok(Json(page.into_envelope(resources::APPLICATIONS.resource_key)))
}

pub async fn blueprint_info(
    State(state): State<AppState>,
    Path(blueprint_id): Path<String>,
) -> HttpResult<Json<BlueprintInfo>> {
    Ok(Json(
        state.services.catalog.blueprint_info(&blueprint_id).await?,
    ))
}
