use std::path::{Path, PathBuf};

use async_trait::async_trait;
use catalyst_core::model::{NexusArtifact, NexusRepository, NexusServer};

use crate::infra::crypto::CryptoError;

/// Symmetric encryption of stored secrets (repository passwords).
/// Implementations: AES-256-GCM ([`AesGcmCipher`](crate::infra::AesGcmCipher)).
pub trait Cipher: Send + Sync {
    /// Encrypt a plaintext into its encoded, storable form.
    fn encrypt(&self, plaintext: &str) -> Result<String, CryptoError>;

    /// Decrypt a value previously produced by [`Cipher::encrypt`].
    fn decrypt(&self, ciphertext: &str) -> Result<String, CryptoError>;
}

/// A program invocation as an argv vector. Never passed through a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    /// Extra environment variables; used for secrets kept off the argv.
    pub env: Vec<(String, String)>,
    pub current_dir: Option<PathBuf>,
}

impl CommandSpec {
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            current_dir: None,
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    #[must_use]
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }
}

/// Exit status and captured output of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// `-1` when the process was killed by a signal.
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// External process execution (curl, tar, ssh, bootstrap tooling).
/// Implementations: `tokio::process` ([`ProcessCommandRunner`](crate::infra::ProcessCommandRunner)).
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run a program to completion. A non-zero exit is not an error.
    async fn run(&self, command: &CommandSpec) -> anyhow::Result<CommandOutput>;
}

/// Unpacks downloaded repository archives.
/// Implementations: `tar` ([`TarArchiveExtractor`](crate::infra::TarArchiveExtractor)).
#[async_trait]
pub trait ArchiveExtractor: Send + Sync {
    /// Extract a gzipped tarball into `destination`, creating it if needed.
    async fn extract(&self, archive: &Path, destination: &Path) -> anyhow::Result<()>;
}

/// Read access to a Nexus repository manager.
/// Implementations: REST over reqwest ([`HttpNexusClient`](crate::infra::HttpNexusClient)).
#[async_trait]
pub trait NexusClient: Send + Sync {
    /// All repositories hosted by the server.
    async fn repositories(&self, server: &NexusServer) -> anyhow::Result<Vec<NexusRepository>>;

    /// Artifacts of `group_id` published to `repository`.
    async fn artifacts(
        &self,
        server: &NexusServer,
        repository: &str,
        group_id: &str,
    ) -> anyhow::Result<Vec<NexusArtifact>>;
}

/// A node being authenticated or bootstrapped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeTarget {
    pub resource_id: String,
    pub address: String,
    pub os: Option<String>,
}

/// Credentials with any key file already read from the file store.
#[derive(Clone, PartialEq, Eq)]
pub enum NodeLogin {
    Password { username: String, password: String },
    PrivateKey { username: String, key: Vec<u8> },
}

impl NodeLogin {
    #[must_use]
    pub fn username(&self) -> &str {
        match self {
            Self::Password { username, .. } | Self::PrivateKey { username, .. } => username,
        }
    }
}

impl std::fmt::Debug for NodeLogin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Password { username, .. } => f
                .debug_struct("Password")
                .field("username", username)
                .finish_non_exhaustive(),
            Self::PrivateKey { username, .. } => f
                .debug_struct("PrivateKey")
                .field("username", username)
                .finish_non_exhaustive(),
        }
    }
}

/// Verifies that credentials open a session on a node.
/// Implementations: ssh ([`SshNodeAuthenticator`](crate::infra::SshNodeAuthenticator)).
#[async_trait]
pub trait NodeAuthenticator: Send + Sync {
    /// `Ok(false)` means the node rejected the credentials.
    async fn verify(&self, node: &NodeTarget, login: &NodeLogin) -> anyhow::Result<bool>;
}

/// Applies configuration management to a freshly authenticated node.
/// Implementations: external bootstrap program ([`CommandBootstrapper`](crate::infra::CommandBootstrapper)).
#[async_trait]
pub trait Bootstrapper: Send + Sync {
    async fn bootstrap(&self, node: &NodeTarget, login: &NodeLogin) -> anyhow::Result<()>;
}

/// Notified after a repository sync completes (the bots service hook).
/// Implementations: log only ([`LoggingSyncListener`](crate::infra::LoggingSyncListener)).
#[async_trait]
pub trait RepositorySyncListener: Send + Sync {
    async fn repository_synced(&self, git_hub_id: &str) -> anyhow::Result<()>;
}
