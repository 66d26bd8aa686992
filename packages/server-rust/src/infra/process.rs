//! [`CommandRunner`] over `tokio::process`.

use std::process::Stdio;

use anyhow::Context;
use async_trait::async_trait;
use tracing::debug;

use crate::traits::{CommandOutput, CommandRunner, CommandSpec};

/// Spawns real child processes. Arguments and environment values are never
/// logged since they may carry credentials.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessCommandRunner;

#[async_trait]
impl CommandRunner for ProcessCommandRunner {
    async fn run(&self, spec: &CommandSpec) -> anyhow::Result<CommandOutput> {
        let mut command = tokio::process::Command::new(&spec.program);
        command
            .args(&spec.args)
            .envs(spec.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .kill_on_drop(true);
        if let Some(dir) = &spec.current_dir {
            command.current_dir(dir);
        }

        let output = command
            .output()
            .await
            .with_context(|| format!("failed to spawn '{}'", spec.program))?;
        let exit_code = output.status.code().unwrap_or(-1);
        debug!(program = %spec.program, exit_code, "process finished");

        Ok(CommandOutput {
            exit_code,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
