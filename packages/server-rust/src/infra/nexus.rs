//! Nexus 2 REST client.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use catalyst_core::model::{NexusArtifact, NexusRepository, NexusServer};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::traits::NexusClient;

/// Nexus wraps every listing in `{ "data": [...] }`.
#[derive(Debug, Deserialize)]
struct DataEnvelope<T> {
    #[serde(default = "Vec::new")]
    data: Vec<T>,
}

/// [`NexusClient`] calling `/service/local/...` with basic auth.
pub struct HttpNexusClient {
    http: reqwest::Client,
}

impl HttpNexusClient {
    /// # Errors
    ///
    /// Fails when the HTTP client cannot be built (TLS backend setup).
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("building nexus http client")?;
        Ok(Self { http })
    }

    async fn get_data<T: DeserializeOwned>(
        &self,
        server: &NexusServer,
        path: &str,
        query: &[(&str, &str)],
    ) -> anyhow::Result<Vec<T>> {
        let url = format!("{}{path}", server.hostname.trim_end_matches('/'));
        let mut request = self
            .http
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .query(query);
        if let Some(user) = &server.username {
            request = request.basic_auth(user, server.nexus_password.as_ref());
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("requesting {url}"))?
            .error_for_status()
            .with_context(|| format!("nexus rejected {url}"))?;
        let envelope: DataEnvelope<T> = response
            .json()
            .await
            .with_context(|| format!("decoding {url}"))?;
        debug!(url = %url, count = envelope.data.len(), "nexus listing fetched");
        Ok(envelope.data)
    }
}

#[async_trait]
impl NexusClient for HttpNexusClient {
    async fn repositories(&self, server: &NexusServer) -> anyhow::Result<Vec<NexusRepository>> {
        self.get_data(server, "/service/local/repositories", &[])
            .await
    }

    async fn artifacts(
        &self,
        server: &NexusServer,
        repository: &str,
        group_id: &str,
    ) -> anyhow::Result<Vec<NexusArtifact>> {
        self.get_data(
            server,
            "/service/local/data_index",
            &[("g", group_id), ("repositoryId", repository)],
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelope_decodes_nexus_listings() {
        let envelope: DataEnvelope<NexusArtifact> = serde_json::from_value(json!({
            "totalCount": 1,
            "data": [{
                "resourceURI": "http://nexus/content/D4D-3.02.100.war",
                "groupId": "org.catalyst",
                "artifactId": "D4D",
                "version": "3.02.100",
                "packaging": "war",
                "repoId": "releases"
            }]
        }))
        .unwrap();
        assert_eq!(envelope.data[0].artifact_id, "D4D");
        assert_eq!(envelope.data[0].repo_id.as_deref(), Some("releases"));

        let empty: DataEnvelope<NexusRepository> = serde_json::from_value(json!({})).unwrap();
        assert!(empty.data.is_empty());
    }

    #[test]
    fn client_builds_with_timeout() {
        assert!(HttpNexusClient::new(Duration::from_secs(5)).is_ok());
    }
}
