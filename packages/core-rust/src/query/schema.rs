//! Per-resource field schemas consumed by the query pipeline.
//!
//! A schema names the response key, the backing collection, the default sort
//! field, the free-text search fields, and every field a client may filter or
//! sort on. Client-facing field names map onto (possibly dotted) document
//! paths.

/// A client-visible field and the document path it reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryField {
    pub name: &'static str,
    pub path: &'static str,
}

/// Field with identical client name and document path.
#[must_use]
pub const fn field(name: &'static str) -> QueryField {
    QueryField { name, path: name }
}

/// Field whose document path differs from its client name.
#[must_use]
pub const fn aliased(name: &'static str, path: &'static str) -> QueryField {
    QueryField { name, path }
}

/// Describes how one listable resource is queried and serialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceSchema {
    /// Key under which records appear in the response envelope.
    pub resource_key: &'static str,
    /// Record store collection holding the documents.
    pub collection: &'static str,
    /// Sort field used when `sortBy` is absent or unknown.
    pub default_sort: &'static str,
    /// Document paths searched by `search`, OR'd together.
    pub search_fields: &'static [&'static str],
    /// Fields accepted by `filterBy` and `sortBy`.
    pub fields: &'static [QueryField],
}

impl ResourceSchema {
    /// Resolves a client field name to its document path.
    #[must_use]
    pub fn path_of(&self, name: &str) -> Option<&'static str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.path)
    }

    #[must_use]
    pub fn is_known_field(&self, name: &str) -> bool {
        self.path_of(name).is_some()
    }

    /// Document path of the default sort field.
    #[must_use]
    pub fn default_sort_path(&self) -> &'static str {
        self.path_of(self.default_sort).unwrap_or(self.default_sort)
    }
}

/// Schemas for every paginated console listing.
pub mod resources {
    use super::{aliased, field, ResourceSchema};

    pub const UNMANAGED_INSTANCES: ResourceSchema = ResourceSchema {
        resource_key: "unmanagedInstances",
        collection: "unmanagedInstances",
        default_sort: "state",
        search_fields: &["platformId", "ip"],
        fields: &[
            field("platformId"),
            field("ip"),
            field("os"),
            field("state"),
            field("providerType"),
            aliased("region", "providerData.region"),
        ],
    };

    pub const INSTANCES: ResourceSchema = ResourceSchema {
        resource_key: "instances",
        collection: "instances",
        default_sort: "instanceState",
        search_fields: &["platformId", "instanceIP"],
        fields: &[
            field("name"),
            field("platformId"),
            field("instanceIP"),
            field("instanceState"),
            field("bootStrapStatus"),
            aliased("os", "hardware.os"),
            aliased("platform", "hardware.platform"),
        ],
    };

    pub const CONTAINERS: ResourceSchema = ResourceSchema {
        resource_key: "containerDetail",
        collection: "containers",
        default_sort: "state",
        search_fields: &["containerID", "instanceIP"],
        fields: &[
            field("state"),
            field("instanceIP"),
            field("containerID"),
            field("image"),
            field("created"),
        ],
    };

    pub const TASKS: ResourceSchema = ResourceSchema {
        resource_key: "tasks",
        collection: "tasks",
        default_sort: "name",
        search_fields: &["name", "description"],
        fields: &[field("name"), field("taskType"), field("description")],
    };

    pub const APPLICATIONS: ResourceSchema = ResourceSchema {
        resource_key: "applications",
        collection: "applications",
        default_sort: "name",
        search_fields: &["name", "buildId"],
        fields: &[field("name"), field("buildId"), field("iconpath")],
    };

    pub const CFT_STACKS: ResourceSchema = ResourceSchema {
        resource_key: "cftList",
        collection: "cftStacks",
        default_sort: "status",
        search_fields: &["stackName", "templateFile"],
        fields: &[
            field("status"),
            field("stackName"),
            field("templateFile"),
            field("infraMangerType"),
        ],
    };

    pub const AZURE_ARMS: ResourceSchema = ResourceSchema {
        resource_key: "azureArms",
        collection: "azureArms",
        default_sort: "status",
        search_fields: &["deploymentName", "resourceGroup"],
        fields: &[
            field("status"),
            field("deploymentName"),
            field("resourceGroup"),
            field("templateFile"),
        ],
    };

    pub const APP_DEPLOY: ResourceSchema = ResourceSchema {
        resource_key: "appDeploy",
        collection: "appDeploy",
        default_sort: "envId",
        search_fields: &["envId", "applicationVersion"],
        fields: &[
            field("envId"),
            field("applicationName"),
            field("applicationVersion"),
            field("applicationStatus"),
            field("applicationNodeIP"),
            field("applicationLastDeploy"),
            field("applicationType"),
        ],
    };

    pub const GIT_HUB: ResourceSchema = ResourceSchema {
        resource_key: "gitHub",
        collection: "gitHub",
        default_sort: "repositoryName",
        search_fields: &[
            "repositoryName",
            "repositoryOwner",
            "repositoryType",
            "repositoryDesc",
        ],
        fields: &[
            field("repositoryName"),
            field("repositoryOwner"),
            field("repositoryType"),
            field("repositoryBranch"),
            field("authenticationType"),
            field("orgId"),
        ],
    };

    pub const SERVICES: ResourceSchema = ResourceSchema {
        resource_key: "services",
        collection: "services",
        default_sort: "createdOn",
        search_fields: &["name", "desc", "state"],
        fields: &[
            field("name"),
            field("state"),
            field("type"),
            field("version"),
            field("createdOn"),
            field("updatedOn"),
            aliased("orgId", "masterDetails.orgId"),
            aliased("bgId", "masterDetails.bgId"),
            aliased("projectId", "masterDetails.projectId"),
            aliased("envId", "masterDetails.envId"),
        ],
    };
}
