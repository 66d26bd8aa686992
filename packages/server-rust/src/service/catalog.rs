//! Provider-, environment- and project-scoped listings plus blueprint info.

use std::sync::Arc;

use catalyst_core::error::{ApiError, ApiResult, OrInternal};
use catalyst_core::model::blueprint::{
    self, decode_config, AzureLaunchConfig, CloudFormationConfig, DockerConfig, ImageRecord,
    InstanceLaunchConfig, KeyPairRecord, ProviderRecord,
};
use catalyst_core::model::{BlueprintDetails, BlueprintInfo, BlueprintKind, BlueprintRecord};
use catalyst_core::query::{resources, PageResult, Predicate, RawListRequest, ResourceSchema};
use serde_json::Value;
use tracing::debug;

use super::listing::list_page;
use super::masters::MasterLookup;
use crate::storage::{load, RecordStore};

/// Listings scoped to one environment of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvironmentListing {
    Containers,
    Instances,
    Tasks,
    CftStacks,
    AzureArms,
}

impl EnvironmentListing {
    #[must_use]
    pub fn schema(self) -> ResourceSchema {
        match self {
            Self::Containers => resources::CONTAINERS,
            Self::Instances => resources::INSTANCES,
            Self::Tasks => resources::TASKS,
            Self::CftStacks => resources::CFT_STACKS,
            Self::AzureArms => resources::AZURE_ARMS,
        }
    }
}

/// Org / business group / project / environment path parameters.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentScope {
    pub org_id: String,
    pub bg_id: String,
    pub project_id: String,
    pub env_id: String,
}

/// Org / business group / project path parameters.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectScope {
    pub org_id: String,
    pub bg_id: String,
    pub project_id: String,
}

impl ProjectScope {
    fn predicate(&self) -> Predicate {
        Predicate::eq("orgId", self.org_id.as_str())
            .and_eq("bgId", self.bg_id.as_str())
            .and_eq("projectId", self.project_id.as_str())
    }
}

impl EnvironmentScope {
    fn predicate(&self) -> Predicate {
        Predicate::eq("orgId", self.org_id.as_str())
            .and_eq("bgId", self.bg_id.as_str())
            .and_eq("projectId", self.project_id.as_str())
            .and_eq("envId", self.env_id.as_str())
    }
}

pub struct CatalogService {
    store: Arc<dyn RecordStore>,
    masters: MasterLookup,
}

impl CatalogService {
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore>, masters: MasterLookup) -> Self {
        Self { store, masters }
    }

    /// Instances discovered on a provider account but not managed by Catalyst.
    ///
    /// # Errors
    ///
    /// 404 on `providerId` when the provider does not exist.
    pub async fn unmanaged_instances(
        &self,
        provider_id: &str,
        raw: &RawListRequest,
    ) -> ApiResult<PageResult<Value>> {
        let provider = self
            .store
            .get(blueprint::PROVIDERS_COLLECTION, provider_id)
            .await
            .or_internal("providerId")?;
        if provider.is_none() {
            return Err(ApiError::not_found("providerId", "Provider not found"));
        }
        list_page(
            self.store.as_ref(),
            &resources::UNMANAGED_INSTANCES,
            raw,
            Predicate::eq("providerId", provider_id),
        )
        .await
    }

    /// # Errors
    ///
    /// Validation errors for malformed pagination; internal on store failure.
    pub async fn environment_list(
        &self,
        listing: EnvironmentListing,
        scope: &EnvironmentScope,
        raw: &RawListRequest,
    ) -> ApiResult<PageResult<Value>> {
        list_page(self.store.as_ref(), &listing.schema(), raw, scope.predicate()).await
    }

    /// # Errors
    ///
    /// Validation errors for malformed pagination; internal on store failure.
    pub async fn applications(
        &self,
        scope: &ProjectScope,
        raw: &RawListRequest,
    ) -> ApiResult<PageResult<Value>> {
        list_page(
            self.store.as_ref(),
            &resources::APPLICATIONS,
            raw,
            scope.predicate(),
        )
        .await
    }

    /// Describes a blueprint with its references resolved to names.
    ///
    /// # Errors
    ///
    /// 404 on `blueprintId` when absent; 500 for an unknown blueprint type
    /// or a config that does not fit its type.
    pub async fn blueprint_info(&self, blueprint_id: &str) -> ApiResult<BlueprintInfo> {
        let record: BlueprintRecord =
            load(self.store.as_ref(), blueprint::COLLECTION, blueprint_id)
                .await
                .or_internal("blueprintId")?
                .ok_or_else(|| ApiError::not_found("blueprintId", "Blueprint not found"))?;
        let kind = BlueprintKind::parse(&record.blueprint_type)?;

        let org_name = self.masters.org_name(record.org_id.as_deref()).await?;
        let bg_name = self.masters.bg_name(record.bg_id.as_deref()).await?;
        let project_name = self.masters.project_name(record.project_id.as_deref()).await?;

        let details = match kind {
            BlueprintKind::InstanceLaunch => self.instance_launch(&record).await?,
            BlueprintKind::AzureLaunch => self.azure_launch(&record).await?,
            BlueprintKind::AwsCloudFormation => self.cloud_formation(&record).await?,
            BlueprintKind::Docker => BlueprintDetails::Docker {
                blueprint_config: decode_config::<DockerConfig>(&record.blueprint_config)?,
            },
        };
        debug!(blueprint_id, kind = ?kind, "blueprint info assembled");

        Ok(BlueprintInfo {
            id: record.id,
            name: record.name,
            template_id: record.template_id,
            template_type: record.template_type,
            users: record.users,
            org_name,
            bg_name,
            project_name,
            details,
        })
    }

    async fn provider(&self, id: Option<&str>) -> ApiResult<Option<ProviderRecord>> {
        self.by_id(blueprint::PROVIDERS_COLLECTION, id, "providerId")
            .await
    }

    async fn by_id<T: serde::de::DeserializeOwned>(
        &self,
        collection: &str,
        id: Option<&str>,
        attribute: &str,
    ) -> ApiResult<Option<T>> {
        let Some(id) = id else {
            return Ok(None);
        };
        load(self.store.as_ref(), collection, id)
            .await
            .or_internal(attribute)
    }

    async fn instance_launch(&self, record: &BlueprintRecord) -> ApiResult<BlueprintDetails> {
        let config: InstanceLaunchConfig = decode_config(&record.blueprint_config)?;
        let provider = self.provider(config.cloud_provider_id.as_deref()).await?;
        let key_pair: Option<KeyPairRecord> = self
            .by_id(
                blueprint::KEY_PAIRS_COLLECTION,
                config.cloud_provider_data.key_pair_id.as_deref(),
                "keyPairId",
            )
            .await?;
        let image: Option<ImageRecord> = self
            .by_id(
                blueprint::IMAGES_COLLECTION,
                config.cloud_provider_data.image_id.as_deref(),
                "imageId",
            )
            .await?;

        let (provider_type, provider_name) = provider
            .map(|p| (p.provider_type, p.provider_name))
            .unwrap_or_default();
        let (key_pair_name, region) = key_pair
            .map(|k| (k.key_pair_name, k.region))
            .unwrap_or_default();
        Ok(BlueprintDetails::InstanceLaunch {
            provider_type,
            provider_name,
            key_pair_name,
            image_name: image.and_then(|i| i.name),
            region,
            blueprint_config: config,
        })
    }

    async fn azure_launch(&self, record: &BlueprintRecord) -> ApiResult<BlueprintDetails> {
        let config: AzureLaunchConfig = decode_config(&record.blueprint_config)?;
        let provider = self
            .provider(config.cloud_provider_id.as_deref())
            .await?
            .unwrap_or_default();
        Ok(BlueprintDetails::AzureLaunch {
            provider_type: provider.provider_type,
            provider_name: provider.provider_name,
            pem_file_name: provider.pem_file_name,
            key_file_name: provider.key_file_name,
            blueprint_config: config,
        })
    }

    async fn cloud_formation(&self, record: &BlueprintRecord) -> ApiResult<BlueprintDetails> {
        let config: CloudFormationConfig = decode_config(&record.blueprint_config)?;
        let provider = self
            .provider(config.cloud_provider_id.as_deref())
            .await?
            .unwrap_or_default();
        Ok(BlueprintDetails::AwsCloudFormation {
            provider_type: provider.provider_type,
            provider_name: provider.provider_name,
            region: config.region.clone(),
            blueprint_config: config,
        })
    }
}
