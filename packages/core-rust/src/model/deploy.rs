//! Application deployments and the per-environment pipeline view.

use std::cmp::Ordering;

use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

pub const COLLECTION: &str = "appDeploy";

/// One deployment of an application version onto a node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppDeployRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub project_id: String,
    pub env_id: String,
    pub application_name: String,
    pub application_version: String,
    pub application_instance_name: Option<String>,
    #[serde(rename = "applicationNodeIP")]
    pub application_node_ip: Option<String>,
    /// `YYYY-MM-DD hh:mm:ss +zzzz`; sorts lexically.
    pub application_last_deploy: Option<String>,
    pub application_status: Option<String>,
    pub application_type: Option<String>,
    pub container_id: Option<String>,
    pub host_name: Option<String>,
    pub app_logs: Option<String>,
}

/// Newest deployment first; undated deployments last.
#[must_use]
pub fn newest_first(a: &AppDeployRecord, b: &AppDeployRecord) -> Ordering {
    b.application_last_deploy.cmp(&a.application_last_deploy)
}

/// Latest deployment details shown in a pipeline column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineCell {
    pub project_id: String,
    pub application_instance_name: Option<String>,
    #[serde(rename = "applicationNodeIP")]
    pub application_node_ip: Option<String>,
    pub application_last_deploy: Option<String>,
    pub application_status: Option<String>,
    pub container_id: Option<String>,
    pub host_name: Option<String>,
    pub app_logs: Option<String>,
}

impl From<&AppDeployRecord> for PipelineCell {
    fn from(record: &AppDeployRecord) -> Self {
        Self {
            project_id: record.project_id.clone(),
            application_instance_name: record.application_instance_name.clone(),
            application_node_ip: record.application_node_ip.clone(),
            application_last_deploy: record.application_last_deploy.clone(),
            application_status: record.application_status.clone(),
            container_id: record.container_id.clone(),
            host_name: record.host_name.clone(),
            app_logs: record.app_logs.clone(),
        }
    }
}

/// Column content: the latest deployment, or `{}` when none exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum EnvCell {
    Deployed(PipelineCell),
    Empty {},
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppName {
    pub name: String,
    pub version: String,
}

/// One pipeline row: an application version across environments.
///
/// Serializes as `{ "appName": {...}, "<env>": {...}, ... }` keeping the
/// environment column order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineRow {
    pub app_name: AppName,
    pub environments: Vec<(String, EnvCell)>,
}

impl Serialize for PipelineRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.environments.len() + 1))?;
        map.serialize_entry("appName", &self.app_name)?;
        for (env, cell) in &self.environments {
            map.serialize_entry(env, cell)?;
        }
        map.end()
    }
}

/// Environment columns: configured order, else first appearance in `records`.
#[must_use]
pub fn environment_columns(configured: &[String], records: &[AppDeployRecord]) -> Vec<String> {
    if !configured.is_empty() {
        return configured.to_vec();
    }
    let mut columns: Vec<String> = Vec::new();
    for record in records {
        if !columns.contains(&record.env_id) {
            columns.push(record.env_id.clone());
        }
    }
    columns
}

/// Groups deployments by application name and version.
///
/// Rows are ordered by their most recent deployment, newest first; each
/// column holds the newest deployment into that environment.
#[must_use]
pub fn build_pipeline(mut records: Vec<AppDeployRecord>, columns: &[String]) -> Vec<PipelineRow> {
    records.sort_by(newest_first);

    let mut rows: Vec<PipelineRow> = Vec::new();
    for record in &records {
        let row = match rows.iter_mut().position(|row| {
            row.app_name.name == record.application_name
                && row.app_name.version == record.application_version
        }) {
            Some(index) => &mut rows[index],
            None => {
                rows.push(PipelineRow {
                    app_name: AppName {
                        name: record.application_name.clone(),
                        version: record.application_version.clone(),
                    },
                    environments: columns
                        .iter()
                        .map(|env| (env.clone(), EnvCell::Empty {}))
                        .collect(),
                });
                let last = rows.len() - 1;
                &mut rows[last]
            }
        };

        if let Some((_, cell)) = row
            .environments
            .iter_mut()
            .find(|(env, _)| *env == record.env_id)
        {
            if matches!(cell, EnvCell::Empty {}) {
                *cell = EnvCell::Deployed(PipelineCell::from(record));
            }
        }
    }
    rows
}
