//! Artifact repository servers (docker registries, Nexus) and Nexus content.

use serde::{Deserialize, Serialize};

pub const COLLECTION: &str = "repositoryServers";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DockerServer {
    #[serde(rename = "_id")]
    pub id: String,
    pub rowid: String,
    pub org_id: String,
    pub docker_repo_name: Option<String>,
    pub docker_repo_url: Option<String>,
    pub docker_user_id: Option<String>,
    pub docker_email_id: Option<String>,
    #[serde(skip_serializing)]
    pub docker_password: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NexusServer {
    #[serde(rename = "_id")]
    pub id: String,
    pub rowid: String,
    pub org_id: String,
    pub nexus_server_name: Option<String>,
    /// Base URL, e.g. `http://nexus.example.com:8081/nexus`.
    pub hostname: String,
    pub username: Option<String>,
    #[serde(skip_serializing)]
    pub nexus_password: Option<String>,
    pub group_id: Vec<String>,
}

/// A repository server, tagged by `configType`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "configType", rename_all = "lowercase")]
pub enum RepositoryServer {
    Docker(DockerServer),
    Nexus(NexusServer),
}

impl RepositoryServer {
    #[must_use]
    pub fn as_nexus(&self) -> Option<&NexusServer> {
        match self {
            Self::Nexus(server) => Some(server),
            Self::Docker(_) => None,
        }
    }
}

/// Repository server with its organization name resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryServerView {
    #[serde(flatten)]
    pub server: RepositoryServer,
    pub org_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NexusRepository {
    pub id: String,
    pub name: String,
    #[serde(rename = "resourceURI")]
    pub resource_uri: Option<String>,
    pub repo_type: Option<String>,
    pub format: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NexusArtifact {
    #[serde(rename = "resourceURI")]
    pub resource_uri: Option<String>,
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    pub packaging: Option<String>,
    pub extension: Option<String>,
    pub repo_id: Option<String>,
    pub context_id: Option<String>,
    pub pom_link: Option<String>,
    pub artifact_link: Option<String>,
}

/// Distinct versions of `artifact_id`, in first-seen order.
#[must_use]
pub fn artifact_versions(artifacts: &[NexusArtifact], artifact_id: &str) -> Vec<String> {
    let mut versions: Vec<String> = Vec::new();
    for artifact in artifacts.iter().filter(|a| a.artifact_id == artifact_id) {
        if !versions.contains(&artifact.version) {
            versions.push(artifact.version.clone());
        }
    }
    versions
}
