//! Fakes for the collaborator traits, shared by unit tests.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use catalyst_core::model::{NexusArtifact, NexusRepository, NexusServer};

use crate::traits::{
    ArchiveExtractor, Bootstrapper, CommandOutput, CommandRunner, CommandSpec, NexusClient,
    NodeAuthenticator, NodeLogin, NodeTarget, RepositorySyncListener,
};

/// Records every command and replays scripted outputs (success once empty).
#[derive(Default)]
pub struct RecordingRunner {
    commands: Mutex<Vec<CommandSpec>>,
    outputs: Mutex<VecDeque<CommandOutput>>,
}

impl RecordingRunner {
    pub fn succeeding() -> Self {
        Self::default()
    }

    pub fn with_outputs(outputs: Vec<CommandOutput>) -> Self {
        Self {
            commands: Mutex::default(),
            outputs: Mutex::new(outputs.into()),
        }
    }

    pub fn commands(&self) -> Vec<CommandSpec> {
        self.commands.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandRunner for RecordingRunner {
    async fn run(&self, command: &CommandSpec) -> anyhow::Result<CommandOutput> {
        self.commands.lock().unwrap().push(command.clone());
        Ok(self
            .outputs
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_default())
    }
}

/// Records extractions without touching the file system.
#[derive(Default)]
pub struct RecordingExtractor {
    pub calls: Mutex<Vec<(PathBuf, PathBuf)>>,
}

#[async_trait]
impl ArchiveExtractor for RecordingExtractor {
    async fn extract(&self, archive: &Path, destination: &Path) -> anyhow::Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push((archive.to_path_buf(), destination.to_path_buf()));
        Ok(())
    }
}

/// Accepts or rejects every login, recording who asked.
pub struct StaticAuthenticator {
    accept: bool,
    pub logins: Mutex<Vec<(String, NodeLogin)>>,
}

impl StaticAuthenticator {
    pub fn accepting() -> Self {
        Self {
            accept: true,
            logins: Mutex::default(),
        }
    }

    pub fn rejecting() -> Self {
        Self {
            accept: false,
            logins: Mutex::default(),
        }
    }
}

#[async_trait]
impl NodeAuthenticator for StaticAuthenticator {
    async fn verify(&self, node: &NodeTarget, login: &NodeLogin) -> anyhow::Result<bool> {
        self.logins
            .lock()
            .unwrap()
            .push((node.resource_id.clone(), login.clone()));
        Ok(self.accept)
    }
}

/// Bootstrapper that succeeds or fails on demand.
#[derive(Default)]
pub struct StaticBootstrapper {
    pub fail: bool,
    pub runs: AtomicUsize,
}

#[async_trait]
impl Bootstrapper for StaticBootstrapper {
    async fn bootstrap(&self, _node: &NodeTarget, _login: &NodeLogin) -> anyhow::Result<()> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            anyhow::bail!("chef run failed");
        }
        Ok(())
    }
}

/// Serves canned Nexus content.
#[derive(Default)]
pub struct StaticNexus {
    pub repositories: Vec<NexusRepository>,
    pub artifacts: Vec<NexusArtifact>,
}

#[async_trait]
impl NexusClient for StaticNexus {
    async fn repositories(&self, _server: &NexusServer) -> anyhow::Result<Vec<NexusRepository>> {
        Ok(self.repositories.clone())
    }

    async fn artifacts(
        &self,
        _server: &NexusServer,
        repository: &str,
        group_id: &str,
    ) -> anyhow::Result<Vec<NexusArtifact>> {
        Ok(self
            .artifacts
            .iter()
            .filter(|a| a.repo_id.as_deref() == Some(repository) && a.group_id == group_id)
            .cloned()
            .collect())
    }
}

/// Counts sync notifications; optionally fails them.
#[derive(Default)]
pub struct CountingListener {
    pub fail: bool,
    pub synced: Mutex<Vec<String>>,
}

#[async_trait]
impl RepositorySyncListener for CountingListener {
    async fn repository_synced(&self, git_hub_id: &str) -> anyhow::Result<()> {
        self.synced.lock().unwrap().push(git_hub_id.to_string());
        if self.fail {
            anyhow::bail!("bots service unavailable");
        }
        Ok(())
    }
}
