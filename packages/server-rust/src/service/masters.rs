//! Resolution of org / business group / project / environment / config names.

use std::sync::Arc;

use catalyst_core::error::{ApiResult, OrInternal};
use catalyst_core::model::masters::collections;
use catalyst_core::model::{MasterDetails, MasterIds};
use catalyst_core::query::Predicate;
use serde_json::Value;

use crate::storage::RecordStore;

/// Looks up reference documents by their `rowid`.
#[derive(Clone)]
pub struct MasterLookup {
    store: Arc<dyn RecordStore>,
}

impl MasterLookup {
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// The reference document with this `rowid`, if any.
    ///
    /// # Errors
    ///
    /// Internal error (attribute = collection) when the store fails.
    pub async fn document(&self, collection: &str, rowid: &str) -> ApiResult<Option<Value>> {
        self.store
            .find_one(collection, &Predicate::eq("rowid", rowid))
            .await
            .or_internal(collection)
    }

    /// Display name of a reference; `None` when the id is absent or unknown.
    ///
    /// # Errors
    ///
    /// Internal error when the store fails.
    pub async fn name(&self, collection: &str, rowid: Option<&str>) -> ApiResult<Option<String>> {
        let Some(rowid) = rowid else {
            return Ok(None);
        };
        Ok(self
            .document(collection, rowid)
            .await?
            .and_then(|doc| doc.get("name").and_then(Value::as_str).map(str::to_string)))
    }

    pub async fn org_name(&self, org_id: Option<&str>) -> ApiResult<Option<String>> {
        self.name(collections::ORGANIZATIONS, org_id).await
    }

    pub async fn bg_name(&self, bg_id: Option<&str>) -> ApiResult<Option<String>> {
        self.name(collections::BUSINESS_GROUPS, bg_id).await
    }

    pub async fn project_name(&self, project_id: Option<&str>) -> ApiResult<Option<String>> {
        self.name(collections::PROJECTS, project_id).await
    }

    /// Resolves every name in order: org, business group, project,
    /// environment, config management. The first store failure aborts.
    ///
    /// # Errors
    ///
    /// Internal error when the store fails.
    pub async fn resolve(&self, ids: &MasterIds) -> ApiResult<MasterDetails> {
        let mut details = MasterDetails::unresolved(ids);
        details.org_name = self.org_name(ids.org_id.as_deref()).await?;
        details.bg_name = self.bg_name(ids.bg_id.as_deref()).await?;
        details.project_name = self.project_name(ids.project_id.as_deref()).await?;
        details.env_name = self
            .name(collections::ENVIRONMENTS, ids.env_id.as_deref())
            .await?;
        details.config_name = self
            .name(collections::CONFIG_MANAGEMENT, ids.config_id.as_deref())
            .await?;
        Ok(details)
    }
}
