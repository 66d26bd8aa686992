use async_trait::async_trait;
use tracing::info;

use crate::traits::RepositorySyncListener;

/// Stands in for the bots service: records the sync in the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingSyncListener;

#[async_trait]
impl RepositorySyncListener for LoggingSyncListener {
    async fn repository_synced(&self, git_hub_id: &str) -> anyhow::Result<()> {
        info!(git_hub_id, "repository synced; bots refresh requested");
        Ok(())
    }
}
