//! Node access over ssh: credential checks and bootstrap runs.
//!
//! Private keys are staged as `0600` files under the configured temp
//! directory for the duration of one command and removed afterwards.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use async_trait::async_trait;
use tracing::{info, warn};

use crate::traits::{
    Bootstrapper, CommandRunner, CommandSpec, NodeAuthenticator, NodeLogin, NodeTarget,
};

/// A private key written to disk; deleted by [`StagedKey::remove`].
struct StagedKey {
    path: PathBuf,
}

impl StagedKey {
    async fn write(temp_dir: &Path, node: &NodeTarget, key: &[u8]) -> anyhow::Result<Self> {
        tokio::fs::create_dir_all(temp_dir)
            .await
            .with_context(|| format!("creating {}", temp_dir.display()))?;
        let path = temp_dir.join(format!(
            "{}-{}.pem",
            node.resource_id,
            uuid::Uuid::new_v4().simple()
        ));
        tokio::fs::write(&path, key)
            .await
            .with_context(|| format!("writing {}", path.display()))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600)).await?;
        }
        Ok(Self { path })
    }

    async fn remove(self) {
        if let Err(err) = tokio::fs::remove_file(&self.path).await {
            warn!(path = %self.path.display(), error = %err, "failed to remove staged key");
        }
    }
}

/// Verifies credentials by running `exit` over ssh.
///
/// Password logins go through `sshpass -e` so the secret travels in the
/// environment rather than on the command line.
pub struct SshNodeAuthenticator {
    runner: Arc<dyn CommandRunner>,
    ssh_program: String,
    temp_dir: PathBuf,
}

impl SshNodeAuthenticator {
    #[must_use]
    pub fn new(runner: Arc<dyn CommandRunner>, ssh_program: String, temp_dir: PathBuf) -> Self {
        Self {
            runner,
            ssh_program,
            temp_dir,
        }
    }

    fn ssh_args(&self, node: &NodeTarget, username: &str) -> Vec<String> {
        vec![
            "-o".into(),
            "StrictHostKeyChecking=no".into(),
            "-o".into(),
            "ConnectTimeout=15".into(),
            format!("{username}@{}", node.address),
            "exit".into(),
        ]
    }
}

#[async_trait]
impl NodeAuthenticator for SshNodeAuthenticator {
    async fn verify(&self, node: &NodeTarget, login: &NodeLogin) -> anyhow::Result<bool> {
        let output = match login {
            NodeLogin::Password { username, password } => {
                let spec = CommandSpec::new("sshpass")
                    .arg("-e")
                    .arg(&self.ssh_program)
                    .args(self.ssh_args(node, username))
                    .env("SSHPASS", password);
                self.runner.run(&spec).await?
            }
            NodeLogin::PrivateKey { username, key } => {
                let staged = StagedKey::write(&self.temp_dir, node, key).await?;
                let spec = CommandSpec::new(&self.ssh_program)
                    .arg("-i")
                    .arg(staged.path.to_string_lossy())
                    .args(["-o", "BatchMode=yes"])
                    .args(self.ssh_args(node, username));
                let result = self.runner.run(&spec).await;
                staged.remove().await;
                result?
            }
        };
        info!(
            resource_id = %node.resource_id,
            address = %node.address,
            accepted = output.success(),
            "node credentials checked"
        );
        Ok(output.success())
    }
}

/// Runs `<program> bootstrap <address> -x <user> ...` against a node.
pub struct CommandBootstrapper {
    runner: Arc<dyn CommandRunner>,
    program: String,
    temp_dir: PathBuf,
}

impl CommandBootstrapper {
    #[must_use]
    pub fn new(runner: Arc<dyn CommandRunner>, program: String, temp_dir: PathBuf) -> Self {
        Self {
            runner,
            program,
            temp_dir,
        }
    }

    fn base(&self, node: &NodeTarget, username: &str) -> CommandSpec {
        CommandSpec::new(&self.program).args([
            "bootstrap".to_string(),
            node.address.clone(),
            "-x".to_string(),
            username.to_string(),
            "-N".to_string(),
            node.resource_id.clone(),
            "--sudo".to_string(),
            "--yes".to_string(),
        ])
    }
}

#[async_trait]
impl Bootstrapper for CommandBootstrapper {
    async fn bootstrap(&self, node: &NodeTarget, login: &NodeLogin) -> anyhow::Result<()> {
        let output = match login {
            NodeLogin::Password { username, password } => {
                let spec = self.base(node, username).arg("-P").arg(password);
                self.runner.run(&spec).await?
            }
            NodeLogin::PrivateKey { username, key } => {
                let staged = StagedKey::write(&self.temp_dir, node, key).await?;
                let spec = self
                    .base(node, username)
                    .arg("-i")
                    .arg(staged.path.to_string_lossy());
                let result = self.runner.run(&spec).await;
                staged.remove().await;
                result?
            }
        };
        if !output.success() {
            bail!(
                "bootstrap of {} exited with {}: {}",
                node.resource_id,
                output.exit_code,
                output.stderr.trim()
            );
        }
        info!(resource_id = %node.resource_id, "node bootstrapped");
        Ok(())
    }
}
