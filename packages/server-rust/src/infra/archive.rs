//! [`ArchiveExtractor`] that shells out to `tar`.

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context};
use async_trait::async_trait;

use crate::traits::{ArchiveExtractor, CommandRunner, CommandSpec};

/// Runs `tar -xzf <archive> -C <destination>`.
pub struct TarArchiveExtractor {
    runner: Arc<dyn CommandRunner>,
    program: String,
}

impl TarArchiveExtractor {
    #[must_use]
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            program: "tar".to_string(),
        }
    }
}

#[async_trait]
impl ArchiveExtractor for TarArchiveExtractor {
    async fn extract(&self, archive: &Path, destination: &Path) -> anyhow::Result<()> {
        tokio::fs::create_dir_all(destination)
            .await
            .with_context(|| format!("creating {}", destination.display()))?;

        let spec = CommandSpec::new(&self.program)
            .arg("-xzf")
            .arg(archive.to_string_lossy())
            .arg("-C")
            .arg(destination.to_string_lossy());
        let output = self.runner.run(&spec).await?;
        if !output.success() {
            bail!(
                "tar exited with {} extracting {}: {}",
                output.exit_code,
                archive.display(),
                output.stderr.trim()
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::testing::RecordingRunner;
    use crate::traits::CommandOutput;

    #[tokio::test]
    async fn creates_destination_and_runs_tar() {
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("gitHub").join("g1");
        let runner = Arc::new(RecordingRunner::succeeding());
        let extractor = TarArchiveExtractor::new(runner.clone());

        extractor
            .extract(Path::new("/staging/catalyst.tgz"), &destination)
            .await
            .unwrap();

        assert!(destination.is_dir());
        let commands = runner.commands();
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].program, "tar");
        assert_eq!(
            commands[0].args,
            [
                "-xzf".to_string(),
                "/staging/catalyst.tgz".to_string(),
                "-C".to_string(),
                destination.to_string_lossy().into_owned(),
            ]
        );
    }

    #[tokio::test]
    async fn non_zero_exit_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(RecordingRunner::with_outputs(vec![CommandOutput {
            exit_code: 2,
            stderr: "gzip: stdin: not in gzip format".into(),
            ..CommandOutput::default()
        }]));
        let extractor = TarArchiveExtractor::new(runner);

        let err = extractor
            .extract(Path::new("broken.tgz"), dir.path())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not in gzip format"));
    }
}
