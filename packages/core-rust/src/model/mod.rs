//! Console domain records, request payloads and response views.

pub mod blueprint;
pub mod deploy;
pub mod github;
pub mod masters;
pub mod repository;
pub mod service;

pub use blueprint::{BlueprintDetails, BlueprintInfo, BlueprintKind, BlueprintRecord};
pub use deploy::{AppDeployRecord, PipelineRow};
pub use github::{GitHubCredentials, GitHubRecord, GitHubRequest, GitHubView};
pub use masters::{MasterDetails, MasterIds};
pub use repository::{NexusArtifact, NexusRepository, NexusServer, RepositoryServer};
pub use service::{
    AuthenticationState, BootstrapState, CreateServiceRequest, NodeCredentials, ResourceFilter,
    ServiceRecord, ServiceResource, ServiceState, ServiceView,
};

