//! Console domain services.
//!
//! Each service owns one resource family and talks to the outside world only
//! through the collaborator traits in [`crate::traits`] and the stores in
//! [`crate::storage`]:
//!
//! 1. **Catalog** (`catalog`): provider, environment and project listings,
//!    blueprint info
//! 2. **Deploy** (`deploy`): application deployment pipeline and history
//! 3. **Artifacts** (`artifacts`): repository servers and Nexus browsing
//! 4. **GitHub** (`github`): registered repositories and their sync
//! 5. **Service map** (`service_map`): versioned services and resource
//!    authentication

pub mod artifacts;
pub mod catalog;
pub mod config;
pub mod deploy;
pub mod github;
pub mod listing;
pub mod masters;
pub mod service_map;

use std::sync::Arc;

pub use artifacts::{ArtifactCoordinates, ArtifactService};
pub use catalog::{CatalogService, EnvironmentListing, EnvironmentScope, ProjectScope};
pub use config::{ConfigFile, ConsoleConfig};
pub use deploy::{DeployHistoryKey, DeployService};
pub use github::{GitHubService, SyncTools};
pub use masters::MasterLookup;
pub use service_map::{AuthenticationJob, AuthenticationOutcome, ServiceMapService};

use crate::infra::{
    AesGcmCipher, CommandBootstrapper, HttpNexusClient, LoggingSyncListener,
    ProcessCommandRunner, SshNodeAuthenticator, TarArchiveExtractor,
};
use crate::storage::{FileStore, MemoryFileStore, MemoryRecordStore, RecordStore};
use crate::traits::{
    ArchiveExtractor, Bootstrapper, Cipher, CommandRunner, NexusClient, NodeAuthenticator,
    RepositorySyncListener,
};

/// Everything the services depend on from outside the process.
#[derive(Clone)]
pub struct Collaborators {
    pub store: Arc<dyn RecordStore>,
    pub files: Arc<dyn FileStore>,
    pub cipher: Arc<dyn Cipher>,
    pub runner: Arc<dyn CommandRunner>,
    pub extractor: Arc<dyn ArchiveExtractor>,
    pub nexus: Arc<dyn NexusClient>,
    pub authenticator: Arc<dyn NodeAuthenticator>,
    pub bootstrapper: Arc<dyn Bootstrapper>,
    pub listener: Arc<dyn RepositorySyncListener>,
}

impl Collaborators {
    /// Default wiring: in-memory stores, AES-GCM, local processes and an HTTP
    /// Nexus client.
    ///
    /// # Errors
    ///
    /// Fails when the cipher configuration is unsupported or the HTTP client
    /// cannot be built.
    pub fn from_config(config: &ConsoleConfig) -> anyhow::Result<Self> {
        let runner: Arc<dyn CommandRunner> = Arc::new(ProcessCommandRunner);
        let integrations = &config.integrations;
        let temp_dir = config.paths.temp_dir.clone();

        Ok(Self {
            store: Arc::new(MemoryRecordStore::new()),
            files: Arc::new(MemoryFileStore::new()),
            cipher: Arc::new(AesGcmCipher::new(&config.crypto)?),
            extractor: Arc::new(TarArchiveExtractor::new(runner.clone())),
            nexus: Arc::new(HttpNexusClient::new(integrations.nexus_timeout)?),
            authenticator: Arc::new(SshNodeAuthenticator::new(
                runner.clone(),
                integrations.ssh_program.clone(),
                temp_dir.clone(),
            )),
            bootstrapper: Arc::new(CommandBootstrapper::new(
                runner.clone(),
                integrations.bootstrap_program.clone(),
                temp_dir,
            )),
            listener: Arc::new(LoggingSyncListener),
            runner,
        })
    }
}

/// The console services, shared by every request handler.
#[derive(Clone)]
pub struct ConsoleServices {
    pub catalog: Arc<CatalogService>,
    pub deploy: Arc<DeployService>,
    pub artifacts: Arc<ArtifactService>,
    pub github: Arc<GitHubService>,
    pub services: Arc<ServiceMapService>,
    pub files: Arc<dyn FileStore>,
}

impl ConsoleServices {
    #[must_use]
    pub fn new(collaborators: Collaborators, config: &ConsoleConfig) -> Self {
        let Collaborators {
            store,
            files,
            cipher,
            runner,
            extractor,
            nexus,
            authenticator,
            bootstrapper,
            listener,
        } = collaborators;
        let masters = MasterLookup::new(store.clone());
        let sync = SyncTools {
            runner,
            extractor,
            listener,
            paths: config.paths.clone(),
            api_base: config.integrations.git_hub_api_base.clone(),
        };

        Self {
            catalog: Arc::new(CatalogService::new(store.clone(), masters.clone())),
            deploy: Arc::new(DeployService::new(store.clone(), masters.clone())),
            artifacts: Arc::new(ArtifactService::new(store.clone(), masters.clone(), nexus)),
            github: Arc::new(GitHubService::new(
                store.clone(),
                files.clone(),
                cipher,
                masters.clone(),
                sync,
            )),
            services: Arc::new(ServiceMapService::new(
                store,
                files.clone(),
                masters,
                authenticator,
                bootstrapper,
            )),
            files,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_wiring_builds() {
        let config = ConsoleConfig::default();
        let collaborators = Collaborators::from_config(&config).unwrap();
        let services = ConsoleServices::new(collaborators, &config);
        assert!(Arc::strong_count(&services.files) >= 2);
    }

    #[test]
    fn unsupported_cipher_is_rejected() {
        let mut config = ConsoleConfig::default();
        config.crypto.algorithm = "des".into();
        assert!(Collaborators::from_config(&config).is_err());
    }
}
