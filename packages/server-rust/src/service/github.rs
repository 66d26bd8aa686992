//! Registered git repositories: CRUD, credential formatting and sync.
//!
//! A sync downloads the branch tarball with `curl` into the staging
//! directory, then extracts it under `<gitHubDir>/<gitHubId>`. Download
//! credentials reach curl through a `0600` config file, never the argv.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;

use catalyst_core::error::{ApiError, ApiResult, OrInternal};
use catalyst_core::model::github::{self, AuthenticationType, GitHubRecord, GitHubRequest};
use catalyst_core::model::{GitHubCredentials, GitHubView};
use catalyst_core::query::{resources, PageResult, Predicate, RawListRequest};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use super::config::PathsConfig;
use super::listing::list_page;
use super::masters::MasterLookup;
use crate::storage::{load, FileStore, RecordStore};
use crate::traits::{ArchiveExtractor, Cipher, CommandRunner, CommandSpec, RepositorySyncListener};

const ATTRIBUTE: &str = "gitHubId";

/// Collaborators used only by [`GitHubService::sync`].
#[derive(Clone)]
pub struct SyncTools {
    pub runner: Arc<dyn CommandRunner>,
    pub extractor: Arc<dyn ArchiveExtractor>,
    pub listener: Arc<dyn RepositorySyncListener>,
    pub paths: PathsConfig,
    /// GitHub REST API base, e.g. `https://api.github.com`.
    pub api_base: String,
}

pub struct GitHubService {
    store: Arc<dyn RecordStore>,
    files: Arc<dyn FileStore>,
    cipher: Arc<dyn Cipher>,
    masters: MasterLookup,
    sync: SyncTools,
}

impl GitHubService {
    #[must_use]
    pub fn new(
        store: Arc<dyn RecordStore>,
        files: Arc<dyn FileStore>,
        cipher: Arc<dyn Cipher>,
        masters: MasterLookup,
        sync: SyncTools,
    ) -> Self {
        Self {
            store,
            files,
            cipher,
            masters,
            sync,
        }
    }

    /// Loads a repository record.
    ///
    /// # Errors
    ///
    /// 404 "Git-Hub not found" when absent; 500 on store failure.
    pub async fn check_exists(&self, id: &str) -> ApiResult<GitHubRecord> {
        load(self.store.as_ref(), github::COLLECTION, id)
            .await
            .or_internal(ATTRIBUTE)?
            .ok_or_else(|| ApiError::not_found(ATTRIBUTE, "Git-Hub not found"))
    }

    /// # Errors
    ///
    /// 400 naming the first missing required attribute; 500 when encryption
    /// or the store fails.
    pub async fn create(&self, request: GitHubRequest) -> ApiResult<GitHubView> {
        let id = uuid::Uuid::new_v4().simple().to_string();
        let mut record = request.into_record(id)?;
        self.seal_password(&mut record)?;

        let doc = serde_json::to_value(&record).or_internal("gitHub")?;
        self.store
            .insert(github::COLLECTION, doc)
            .await
            .or_internal("gitHub")?;
        info!(git_hub_id = %record.id, name = %record.repository_name, "repository registered");
        self.format(record).await
    }

    /// Patches the fields present in `request`.
    ///
    /// # Errors
    ///
    /// 404 when absent; 400 on malformed coordinates; 500 when encryption
    /// or the store fails.
    pub async fn update(&self, id: &str, request: GitHubRequest) -> ApiResult<GitHubView> {
        let mut record = self.check_exists(id).await?;
        let new_password = request.repository_password.is_some();
        request.apply_to(&mut record)?;
        if new_password {
            self.seal_password(&mut record)?;
        }

        let doc = serde_json::to_value(&record).or_internal("gitHub")?;
        let updated = self
            .store
            .modify(
                github::COLLECTION,
                id,
                Box::new(move |stored| {
                    *stored = doc;
                    Ok(())
                }),
            )
            .await
            .or_internal("gitHub")?;
        if updated.is_none() {
            return Err(ApiError::not_found(ATTRIBUTE, "Git-Hub not found"));
        }
        self.format(record).await
    }

    /// # Errors
    ///
    /// 404 when absent; 500 on store failure.
    pub async fn delete(&self, id: &str) -> ApiResult<()> {
        self.check_exists(id).await?;
        self.store
            .delete(github::COLLECTION, id)
            .await
            .or_internal("gitHub")?;
        info!(git_hub_id = id, "repository removed");
        Ok(())
    }

    /// # Errors
    ///
    /// 404 when absent; 500 when formatting fails.
    pub async fn get(&self, id: &str) -> ApiResult<GitHubView> {
        let record = self.check_exists(id).await?;
        self.format(record).await
    }

    /// Paginated repositories, each formatted. The first formatting failure
    /// aborts the whole listing.
    ///
    /// # Errors
    ///
    /// 400 for malformed pagination; 500 when the store or formatting fails.
    pub async fn list(&self, raw: &RawListRequest) -> ApiResult<PageResult<GitHubView>> {
        let page = list_page(self.store.as_ref(), &resources::GIT_HUB, raw, Predicate::all()).await?;
        let mut views = Vec::with_capacity(page.records.len());
        for doc in &page.records {
            let record: GitHubRecord = serde_json::from_value(doc.clone()).or_internal("gitHub")?;
            views.push(self.format(record).await?);
        }
        Ok(page.with_records(views))
    }

    /// Builds the client view: org name plus the credential block for the
    /// record's authentication type.
    ///
    /// # Errors
    ///
    /// 500 when decryption, a key file read, or the org lookup fails.
    pub async fn format(&self, record: GitHubRecord) -> ApiResult<GitHubView> {
        let org_name = self.masters.org_name(Some(&record.org_id)).await?;
        let credentials = match record.authentication_type {
            Some(AuthenticationType::UserName) => {
                let password = match record.repository_password.as_deref() {
                    Some(stored) if record.stores_encrypted_password() => Some(
                        self.cipher
                            .decrypt(stored)
                            .or_internal("repositoryPassword")?,
                    ),
                    other => other.map(str::to_string),
                };
                GitHubCredentials::UserName {
                    repository_user_name: record.repository_user_name.clone(),
                    repository_password: password,
                }
            }
            Some(AuthenticationType::Token) => GitHubCredentials::Token {
                repository_user_name: record.repository_user_name.clone(),
                repository_token: record.repository_token.clone(),
            },
            Some(AuthenticationType::SshKey) => {
                let (public_id, public_name, public_data) = self
                    .key_file(
                        record.repository_ssh_public_key_file_id.as_deref(),
                        "repositorySSHPublicKeyFileId",
                    )
                    .await?;
                let (private_id, private_name, private_data) = self
                    .key_file(
                        record.repository_ssh_private_key_file_id.as_deref(),
                        "repositorySSHPrivateKeyFileId",
                    )
                    .await?;
                GitHubCredentials::SshKey {
                    public_key_file_id: public_id,
                    public_key_file_name: public_name,
                    public_key_file_data: public_data,
                    private_key_file_id: private_id,
                    private_key_file_name: private_name,
                    private_key_file_data: private_data,
                }
            }
            None => GitHubCredentials::None,
        };

        Ok(GitHubView {
            id: record.id,
            repository_name: record.repository_name,
            repository_desc: record.repository_desc,
            repository_owner: record.repository_owner,
            repository_type: record.repository_type,
            repository_branch: record.repository_branch,
            org_id: record.org_id,
            org_name,
            credentials,
        })
    }

    async fn key_file(
        &self,
        id: Option<&str>,
        attribute: &str,
    ) -> ApiResult<(String, String, String)> {
        let id = id.ok_or_else(|| ApiError::internal(attribute, "key file id is missing"))?;
        let file = self
            .files
            .read(id)
            .await
            .or_internal(attribute)?
            .ok_or_else(|| ApiError::internal(attribute, format!("key file {id} not found")))?;
        Ok((file.id.clone(), file.name.clone(), file.text()))
    }

    fn seal_password(&self, record: &mut GitHubRecord) -> ApiResult<()> {
        if !record.stores_encrypted_password() {
            return Ok(());
        }
        if let Some(plain) = record.repository_password.as_deref() {
            record.repository_password = Some(
                self.cipher
                    .encrypt(plain)
                    .or_internal("repositoryPassword")?,
            );
        }
        Ok(())
    }

    /// Download argv: `curl -sSfL [-K <config>] -o <archive> <tarball url>`.
    fn download_command(
        &self,
        view: &GitHubView,
        archive: &Path,
        credentials: Option<&Path>,
    ) -> CommandSpec {
        let url = format!(
            "{}/repos/{}/{}/tarball/{}",
            self.sync.api_base.trim_end_matches('/'),
            view.repository_owner,
            view.repository_name,
            view.repository_branch
        );
        let mut spec = CommandSpec::new("curl").arg("-sSfL");
        if let Some(config) = credentials {
            spec = spec.arg("-K").arg(config.to_string_lossy());
        }
        spec.arg("-o").arg(archive.to_string_lossy()).arg(url)
    }

    /// Downloads and extracts the repository's branch.
    ///
    /// # Errors
    ///
    /// 404 when absent; 400 on malformed coordinates or "Invalid Git-Hub
    /// Credentials Details" when the download fails; 500 when staging or
    /// extraction fails.
    pub async fn sync(&self, id: &str) -> ApiResult<()> {
        let record = self.check_exists(id).await?;
        record.check_coordinates()?;
        let cloned_before = record.is_repo_cloned;
        let archive = self.sync.paths.current_dir.join(record.archive_name());
        let view = self.format(record).await?;

        tokio::fs::create_dir_all(&self.sync.paths.current_dir)
            .await
            .or_internal(ATTRIBUTE)?;
        if cloned_before {
            remove_if_present(&archive, false).await?;
        }

        let staged = match view.credentials.basic_auth() {
            Some(auth) => Some(
                StagedCurlConfig::write(&self.sync.paths.temp_dir, id, &auth)
                    .await
                    .or_internal(ATTRIBUTE)?,
            ),
            None => None,
        };
        let command =
            self.download_command(&view, &archive, staged.as_ref().map(|c| c.path.as_path()));
        let output = self.sync.runner.run(&command).await;
        if let Some(staged) = staged {
            staged.remove().await;
        }
        let output = output.or_internal(ATTRIBUTE)?;
        if !output.success() {
            debug!(git_hub_id = id, exit_code = output.exit_code, "repository download failed");
            return Err(ApiError::validation(
                ATTRIBUTE,
                "Invalid Git-Hub Credentials Details",
            ));
        }

        let destination = self.sync.paths.git_hub_dir.join(id);
        remove_if_present(&destination, true).await?;
        self.sync
            .extractor
            .extract(&archive, &destination)
            .await
            .or_internal(ATTRIBUTE)?;

        if !cloned_before {
            let mut patch = Map::new();
            patch.insert("isRepoCloned".to_string(), Value::Bool(true));
            if let Err(err) = self.store.update(github::COLLECTION, id, patch).await {
                warn!(git_hub_id = id, error = %err, "failed to flag repository as cloned");
            }
        }
        if let Err(err) = self.sync.listener.repository_synced(id).await {
            warn!(git_hub_id = id, error = %err, "repository sync listener failed");
        }
        info!(git_hub_id = id, path = %destination.display(), "repository synced");
        Ok(())
    }
}

/// curl config carrying `user = "name:secret"` for one download.
struct StagedCurlConfig {
    path: PathBuf,
}

impl StagedCurlConfig {
    async fn write(temp_dir: &Path, id: &str, auth: &str) -> anyhow::Result<Self> {
        tokio::fs::create_dir_all(temp_dir)
            .await
            .with_context(|| format!("creating {}", temp_dir.display()))?;
        let path = temp_dir.join(format!("{id}-{}.curlrc", uuid::Uuid::new_v4().simple()));
        tokio::fs::write(&path, curl_user_line(auth))
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
            warn!(path = %self.path.display(), error = %err, "failed to remove curl config");
        }
    }
}

/// `user = "<auth>"` with curl's config-file escapes applied.
fn curl_user_line(auth: &str) -> String {
    let mut quoted = String::with_capacity(auth.len() + 2);
    for c in auth.chars() {
        match c {
            '\\' => quoted.push_str("\\\\"),
            '"' => quoted.push_str("\\\""),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            c => quoted.push(c),
        }
    }
    format!("user = \"{quoted}\"\n")
}

async fn remove_if_present(path: &Path, directory: bool) -> ApiResult<()> {
    let result = if directory {
        tokio::fs::remove_dir_all(path).await
    } else {
        tokio::fs::remove_file(path).await
    };
    match result {
        Err(err) if err.kind() != ErrorKind::NotFound => Err(ApiError::internal(
            ATTRIBUTE,
            format!("cannot remove {}: {err}", path.display()),
        )),
        _ => Ok(()),
    }
}
