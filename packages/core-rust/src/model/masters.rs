//! Organization hierarchy references ("master details").

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Reference collections holding `{ rowid, name }` documents.
pub mod collections {
    pub const ORGANIZATIONS: &str = "organizations";
    pub const BUSINESS_GROUPS: &str = "businessGroups";
    pub const PROJECTS: &str = "projects";
    pub const ENVIRONMENTS: &str = "environments";
    pub const CONFIG_MANAGEMENT: &str = "configManagement";
}

/// Identifiers a record carries for its place in the org hierarchy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MasterIds {
    pub org_id: Option<String>,
    pub bg_id: Option<String>,
    pub project_id: Option<String>,
    pub env_id: Option<String>,
    pub config_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monitor: Option<Value>,
}

/// [`MasterIds`] with each id's display name resolved.
///
/// A name is `None` when the referenced document does not exist.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasterDetails {
    pub org_id: Option<String>,
    pub org_name: Option<String>,
    pub bg_id: Option<String>,
    pub bg_name: Option<String>,
    pub project_id: Option<String>,
    pub project_name: Option<String>,
    pub env_id: Option<String>,
    pub env_name: Option<String>,
    pub config_id: Option<String>,
    pub config_name: Option<String>,
    pub monitor: Option<Value>,
}

impl MasterDetails {
    /// Starts from the ids with no names resolved yet.
    #[must_use]
    pub fn unresolved(ids: &MasterIds) -> Self {
        Self {
            org_id: ids.org_id.clone(),
            bg_id: ids.bg_id.clone(),
            project_id: ids.project_id.clone(),
            env_id: ids.env_id.clone(),
            config_id: ids.config_id.clone(),
            monitor: ids.monitor.clone(),
            ..Self::default()
        }
    }
}
