//! Blueprint templates and the per-kind `blueprintInfo` response.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ApiError, ApiResult};

pub const COLLECTION: &str = "blueprints";
pub const PROVIDERS_COLLECTION: &str = "providers";
pub const KEY_PAIRS_COLLECTION: &str = "keyPairs";
pub const IMAGES_COLLECTION: &str = "images";

/// Stored blueprint; `blueprint_config` is interpreted per `blueprint_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlueprintRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub template_id: Option<String>,
    #[serde(default)]
    pub template_type: Option<String>,
    pub blueprint_type: String,
    #[serde(default)]
    pub users: Vec<String>,
    #[serde(default)]
    pub org_id: Option<String>,
    #[serde(default)]
    pub bg_id: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub blueprint_config: Value,
}

/// Blueprint kinds the console knows how to describe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlueprintKind {
    InstanceLaunch,
    AzureLaunch,
    AwsCloudFormation,
    Docker,
}

impl BlueprintKind {
    /// # Errors
    ///
    /// Returns an internal error for a stored type with no known shape.
    pub fn parse(raw: &str) -> ApiResult<Self> {
        match raw {
            "instance_launch" => Ok(Self::InstanceLaunch),
            "azure_launch" => Ok(Self::AzureLaunch),
            "aws_cf" => Ok(Self::AwsCloudFormation),
            "docker" => Ok(Self::Docker),
            other => Err(ApiError::internal(
                "blueprintType",
                format!("unsupported blueprint type '{other}'"),
            )),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderRecord {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub provider_name: Option<String>,
    #[serde(default)]
    pub provider_type: Option<String>,
    #[serde(default)]
    pub pem_file_name: Option<String>,
    #[serde(default)]
    pub key_file_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyPairRecord {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub key_pair_name: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CloudProviderData {
    pub key_pair_id: Option<String>,
    pub instance_type: Option<String>,
    #[serde(rename = "instanceAmiid")]
    pub instance_ami_id: Option<String>,
    pub instance_username: Option<String>,
    pub vpc_id: Option<String>,
    pub subnet_id: Option<String>,
    pub image_id: Option<String>,
    #[serde(rename = "instanceOS")]
    pub instance_os: Option<String>,
    pub instance_count: Option<Value>,
    pub security_group_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RunlistVersion {
    pub ver: String,
    pub runlist: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InfraManagerData {
    pub latest_version: Option<String>,
    pub versions_list: Vec<RunlistVersion>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InstanceLaunchConfig {
    pub cloud_provider_type: Option<String>,
    pub cloud_provider_id: Option<String>,
    pub cloud_provider_data: CloudProviderData,
    pub infra_manger_type: Option<String>,
    pub infra_manager_id: Option<String>,
    pub infra_manager_data: InfraManagerData,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AzureProviderData {
    pub location: Option<String>,
    pub vm_size: Option<String>,
    pub image_id: Option<String>,
    pub network_id: Option<String>,
    pub subnet_id: Option<String>,
    pub security_group_ports: Option<String>,
    pub instance_username: Option<String>,
    #[serde(rename = "instanceOS")]
    pub instance_os: Option<String>,
    pub instance_count: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AzureLaunchConfig {
    pub cloud_provider_type: Option<String>,
    pub cloud_provider_id: Option<String>,
    pub cloud_provider_data: AzureProviderData,
    pub infra_manger_type: Option<String>,
    pub infra_manager_id: Option<String>,
    pub infra_manager_data: InfraManagerData,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CloudFormationInstance {
    pub logical_id: String,
    pub username: Option<String>,
    pub runlist: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StackParameter {
    #[serde(rename = "ParameterKey")]
    pub parameter_key: String,
    #[serde(rename = "ParameterValue")]
    pub parameter_value: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CloudFormationConfig {
    pub cloud_provider_id: Option<String>,
    pub infra_manger_type: Option<String>,
    pub infra_manager_id: Option<String>,
    pub template_file: Option<String>,
    pub region: Option<String>,
    pub instances: Vec<CloudFormationInstance>,
    pub stack_parameters: Vec<StackParameter>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DockerComposeEntry {
    pub docker_container_paths_title: Option<String>,
    pub docker_container_paths: Option<String>,
    pub docker_repo_tags: Option<String>,
    pub docker_image_name: Option<String>,
    pub docker_launch_parameters: Option<String>,
    pub docker_repo_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DockerConfig {
    pub docker_container_paths_title: Option<String>,
    pub docker_container_paths: Option<String>,
    pub docker_launch_parameters: Option<String>,
    pub docker_repo_name: Option<String>,
    pub docker_image_name: Option<String>,
    pub docker_compose: Vec<DockerComposeEntry>,
}

/// Kind-specific part of a blueprint description, tagged by `blueprintType`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "blueprintType")]
pub enum BlueprintDetails {
    #[serde(rename = "instance_launch", rename_all = "camelCase")]
    InstanceLaunch {
        provider_type: Option<String>,
        provider_name: Option<String>,
        key_pair_name: Option<String>,
        image_name: Option<String>,
        region: Option<String>,
        blueprint_config: InstanceLaunchConfig,
    },
    #[serde(rename = "azure_launch", rename_all = "camelCase")]
    AzureLaunch {
        provider_type: Option<String>,
        provider_name: Option<String>,
        pem_file_name: Option<String>,
        key_file_name: Option<String>,
        blueprint_config: AzureLaunchConfig,
    },
    #[serde(rename = "aws_cf", rename_all = "camelCase")]
    AwsCloudFormation {
        provider_type: Option<String>,
        provider_name: Option<String>,
        region: Option<String>,
        blueprint_config: CloudFormationConfig,
    },
    #[serde(rename = "docker", rename_all = "camelCase")]
    Docker { blueprint_config: DockerConfig },
}

/// `blueprintInfo` response: common fields plus the tagged details.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlueprintInfo {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub template_id: Option<String>,
    pub template_type: Option<String>,
    pub users: Vec<String>,
    pub org_name: Option<String>,
    pub bg_name: Option<String>,
    pub project_name: Option<String>,
    #[serde(flatten)]
    pub details: BlueprintDetails,
}

/// Decodes `blueprint_config` into the typed shape for its kind.
///
/// # Errors
///
/// Returns an internal error when the stored config does not fit the shape.
pub fn decode_config<T: DeserializeOwned + Default>(config: &Value) -> ApiResult<T> {
    if config.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(config.clone())
        .map_err(|err| ApiError::internal("blueprintConfig", err.to_string()))
}
