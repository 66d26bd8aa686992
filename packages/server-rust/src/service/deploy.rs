//! Application deployment views: pipeline, node history, paginated list.

use std::sync::Arc;

use catalyst_core::error::{ApiResult, OrInternal};
use catalyst_core::model::deploy::{self, build_pipeline, environment_columns, newest_first};
use catalyst_core::model::masters::collections;
use catalyst_core::model::{AppDeployRecord, PipelineRow};
use catalyst_core::query::{resources, PageResult, Predicate, RawListRequest};
use serde_json::Value;
use tracing::debug;

use super::listing::list_page;
use super::masters::MasterLookup;
use crate::storage::{find_as, RecordStore};

/// Path parameters identifying one node's deployments of a version.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployHistoryKey {
    pub project_id: String,
    pub env_name: String,
    pub version: String,
    pub node_ip: String,
}

pub struct DeployService {
    store: Arc<dyn RecordStore>,
    masters: MasterLookup,
}

/// `environmentNames` may be stored as an array or a comma-separated string.
fn configured_environments(project: Option<&Value>) -> Vec<String> {
    match project.and_then(|p| p.get("environmentNames")) {
        Some(Value::Array(names)) => names
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        Some(Value::String(names)) => names
            .split(',')
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

impl DeployService {
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore>, masters: MasterLookup) -> Self {
        Self { store, masters }
    }

    /// One row per application version, one column per environment.
    ///
    /// # Errors
    ///
    /// Internal error when the store fails.
    pub async fn pipeline(&self, project_id: &str) -> ApiResult<Vec<PipelineRow>> {
        let records: Vec<AppDeployRecord> = find_as(
            self.store.as_ref(),
            deploy::COLLECTION,
            &Predicate::eq("projectId", project_id),
        )
        .await
        .or_internal("appDeploy")?;
        let project = self
            .masters
            .document(collections::PROJECTS, project_id)
            .await?;

        let columns = environment_columns(&configured_environments(project.as_ref()), &records);
        let rows = build_pipeline(records, &columns);
        debug!(project_id, rows = rows.len(), columns = columns.len(), "pipeline built");
        Ok(rows)
    }

    /// Every deployment of a version onto one node, newest first.
    ///
    /// # Errors
    ///
    /// Internal error when the store fails.
    pub async fn history(&self, key: &DeployHistoryKey) -> ApiResult<Vec<AppDeployRecord>> {
        let predicate = Predicate::eq("projectId", key.project_id.as_str())
            .and_eq("envId", key.env_name.as_str())
            .and_eq("applicationVersion", key.version.as_str())
            .and_eq("applicationNodeIP", key.node_ip.as_str());
        let mut records: Vec<AppDeployRecord> =
            find_as(self.store.as_ref(), deploy::COLLECTION, &predicate)
                .await
                .or_internal("appDeploy")?;
        records.sort_by(newest_first);
        Ok(records)
    }

    /// # Errors
    ///
    /// Validation errors for malformed pagination; internal on store failure.
    pub async fn list(
        &self,
        project_id: &str,
        raw: &RawListRequest,
    ) -> ApiResult<PageResult<Value>> {
        list_page(
            self.store.as_ref(),
            &resources::APP_DEPLOY,
            raw,
            Predicate::eq("projectId", project_id),
        )
        .await
    }
}
