//! Repository servers of an organization and Nexus content browsing.

use std::sync::Arc;

use catalyst_core::error::{ApiError, ApiResult, OrInternal};
use catalyst_core::model::masters::collections;
use catalyst_core::model::repository::{self, artifact_versions, RepositoryServerView};
use catalyst_core::model::{NexusArtifact, NexusRepository, NexusServer, RepositoryServer};
use catalyst_core::query::Predicate;
use serde_json::Value;
use tracing::debug;

use super::masters::MasterLookup;
use crate::storage::{find_as, find_one_as, RecordStore};
use crate::traits::NexusClient;

/// Nexus path parameters shared by the artifact endpoints.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactCoordinates {
    pub nexus_id: String,
    pub repo_name: String,
    pub group_id: String,
}

pub struct ArtifactService {
    store: Arc<dyn RecordStore>,
    masters: MasterLookup,
    nexus: Arc<dyn NexusClient>,
}

/// Repository names a project restricts itself to, if it declares any.
fn allowed_repositories(project: &Value) -> Option<Vec<String>> {
    let names = project.get("nexusRepositories")?.as_array()?;
    Some(
        names
            .iter()
            .filter_map(|entry| match entry {
                Value::String(name) => Some(name.clone()),
                Value::Object(map) => map
                    .get("repoName")
                    .or_else(|| map.get("name"))
                    .and_then(Value::as_str)
                    .map(str::to_string),
                _ => None,
            })
            .collect(),
    )
}

impl ArtifactService {
    #[must_use]
    pub fn new(
        store: Arc<dyn RecordStore>,
        masters: MasterLookup,
        nexus: Arc<dyn NexusClient>,
    ) -> Self {
        Self {
            store,
            masters,
            nexus,
        }
    }

    /// Docker and Nexus servers registered for an organization.
    ///
    /// # Errors
    ///
    /// Internal error when the store fails or a stored server is malformed.
    pub async fn repository_servers(&self, org_id: &str) -> ApiResult<Vec<RepositoryServerView>> {
        let servers: Vec<RepositoryServer> = find_as(
            self.store.as_ref(),
            repository::COLLECTION,
            &Predicate::eq("orgId", org_id),
        )
        .await
        .or_internal("repositoryServer")?;
        let org_name = self.masters.org_name(Some(org_id)).await?;

        Ok(servers
            .into_iter()
            .map(|server| RepositoryServerView {
                server,
                org_name: org_name.clone(),
            })
            .collect())
    }

    async fn nexus_server(&self, nexus_id: &str) -> ApiResult<NexusServer> {
        let server: Option<RepositoryServer> = find_one_as(
            self.store.as_ref(),
            repository::COLLECTION,
            &Predicate::eq("rowid", nexus_id).and_eq("configType", "nexus"),
        )
        .await
        .or_internal("nexusId")?;
        server
            .as_ref()
            .and_then(RepositoryServer::as_nexus)
            .cloned()
            .ok_or_else(|| ApiError::not_found("nexusId", "Nexus Server not found"))
    }

    /// Nexus repositories visible to a project.
    ///
    /// # Errors
    ///
    /// 404 on `nexusId` or `projectId`; internal when Nexus is unreachable.
    pub async fn nexus_repositories(
        &self,
        nexus_id: &str,
        project_id: &str,
    ) -> ApiResult<Vec<NexusRepository>> {
        let server = self.nexus_server(nexus_id).await?;
        let project = self
            .masters
            .document(collections::PROJECTS, project_id)
            .await?
            .ok_or_else(|| ApiError::not_found("projectId", "Project not found"))?;

        let mut repositories = self
            .nexus
            .repositories(&server)
            .await
            .or_internal("nexusId")?;
        if let Some(allowed) = allowed_repositories(&project) {
            repositories.retain(|r| allowed.iter().any(|a| *a == r.id || *a == r.name));
        }
        debug!(nexus_id, project_id, count = repositories.len(), "nexus repositories listed");
        Ok(repositories)
    }

    /// # Errors
    ///
    /// 404 on `nexusId`; internal when Nexus is unreachable.
    pub async fn artifacts(&self, coords: &ArtifactCoordinates) -> ApiResult<Vec<NexusArtifact>> {
        let server = self.nexus_server(&coords.nexus_id).await?;
        self.nexus
            .artifacts(&server, &coords.repo_name, &coords.group_id)
            .await
            .or_internal("nexusId")
    }

    /// Distinct versions of one artifact, in the order Nexus lists them.
    ///
    /// # Errors
    ///
    /// 404 on `nexusId`; internal when Nexus is unreachable.
    pub async fn versions(
        &self,
        coords: &ArtifactCoordinates,
        artifact_id: &str,
    ) -> ApiResult<Vec<String>> {
        let artifacts = self.artifacts(coords).await?;
        Ok(artifact_versions(&artifacts, artifact_id))
    }
}
