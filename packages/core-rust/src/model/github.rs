//! Registered git repositories and their formatted views.

use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};

pub const COLLECTION: &str = "gitHub";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepositoryType {
    Public,
    Private,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AuthenticationType {
    UserName,
    Token,
    SshKey,
}

fn default_branch() -> String {
    "master".to_string()
}

/// Stored repository document. `repository_password` holds ciphertext.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitHubRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub repository_name: String,
    #[serde(default)]
    pub repository_desc: Option<String>,
    pub repository_owner: String,
    pub repository_type: RepositoryType,
    #[serde(default = "default_branch")]
    pub repository_branch: String,
    #[serde(default)]
    pub authentication_type: Option<AuthenticationType>,
    #[serde(default)]
    pub repository_user_name: Option<String>,
    #[serde(default)]
    pub repository_password: Option<String>,
    #[serde(default)]
    pub repository_token: Option<String>,
    #[serde(rename = "repositorySSHPublicKeyFileId", default)]
    pub repository_ssh_public_key_file_id: Option<String>,
    #[serde(rename = "repositorySSHPrivateKeyFileId", default)]
    pub repository_ssh_private_key_file_id: Option<String>,
    pub org_id: String,
    #[serde(default)]
    pub is_repo_cloned: bool,
}

impl GitHubRecord {
    /// Whether the stored password must be encrypted at rest.
    #[must_use]
    pub fn stores_encrypted_password(&self) -> bool {
        self.repository_type == RepositoryType::Private
            && self.authentication_type == Some(AuthenticationType::UserName)
    }

    /// Archive name written by a sync: `<gitHubId>.tgz`.
    #[must_use]
    pub fn archive_name(&self) -> String {
        format!("{}.tgz", self.id)
    }

    /// Checks the parts that end up in sync paths and the tarball URL.
    ///
    /// Id, name and owner are single path segments. The branch may contain
    /// `/` but no empty or `..` segment.
    ///
    /// # Errors
    ///
    /// Validation error on the first offending attribute.
    pub fn check_coordinates(&self) -> ApiResult<()> {
        path_segment(&self.id, "gitHubId")?;
        path_segment(&self.repository_name, "repositoryName")?;
        path_segment(&self.repository_owner, "repositoryOwner")?;
        for segment in self.repository_branch.split('/') {
            path_segment(segment, "repositoryBranch")?;
        }
        Ok(())
    }
}

fn path_segment(value: &str, attribute: &str) -> ApiResult<()> {
    let unsafe_char = |c: char| {
        c.is_control() || c.is_whitespace() || matches!(c, '/' | '\\' | '?' | '#' | '%')
    };
    if value.is_empty() || value == "." || value.contains("..") || value.chars().any(unsafe_char) {
        return Err(ApiError::validation(
            attribute,
            format!("{attribute} contains characters that are not allowed"),
        ));
    }
    Ok(())
}

/// Create or update payload. Every field is optional so updates can patch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitHubRequest {
    pub repository_name: Option<String>,
    pub repository_desc: Option<String>,
    pub repository_owner: Option<String>,
    pub repository_type: Option<RepositoryType>,
    pub repository_branch: Option<String>,
    pub authentication_type: Option<AuthenticationType>,
    pub repository_user_name: Option<String>,
    pub repository_password: Option<String>,
    pub repository_token: Option<String>,
    #[serde(rename = "repositorySSHPublicKeyFileId")]
    pub repository_ssh_public_key_file_id: Option<String>,
    #[serde(rename = "repositorySSHPrivateKeyFileId")]
    pub repository_ssh_private_key_file_id: Option<String>,
    pub org_id: Option<String>,
}

fn required(value: Option<String>, attribute: &str) -> ApiResult<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ApiError::validation(attribute, format!("{attribute} is required")))
}

impl GitHubRequest {
    /// Builds a new record, checking the required attributes and the
    /// repository coordinates.
    ///
    /// # Errors
    ///
    /// Returns a validation error naming the first missing or malformed
    /// attribute.
    pub fn into_record(self, id: String) -> ApiResult<GitHubRecord> {
        let repository_name = required(self.repository_name, "repositoryName")?;
        let repository_owner = required(self.repository_owner, "repositoryOwner")?;
        let repository_type = self.repository_type.ok_or_else(|| {
            ApiError::validation("repositoryType", "repositoryType is required")
        })?;
        let org_id = required(self.org_id, "orgId")?;

        let record = GitHubRecord {
            id,
            repository_name,
            repository_desc: self.repository_desc,
            repository_owner,
            repository_type,
            repository_branch: self.repository_branch.unwrap_or_else(default_branch),
            authentication_type: self.authentication_type,
            repository_user_name: self.repository_user_name,
            repository_password: self.repository_password,
            repository_token: self.repository_token,
            repository_ssh_public_key_file_id: self.repository_ssh_public_key_file_id,
            repository_ssh_private_key_file_id: self.repository_ssh_private_key_file_id,
            org_id,
            is_repo_cloned: false,
        };
        record.check_coordinates()?;
        Ok(record)
    }

    /// Overwrites the fields present in the request. On error `record` may
    /// be partially patched and must not be stored.
    ///
    /// # Errors
    ///
    /// Validation error when the patched coordinates are malformed.
    pub fn apply_to(self, record: &mut GitHubRecord) -> ApiResult<()> {
        let Self {
            repository_name,
            repository_desc,
            repository_owner,
            repository_type,
            repository_branch,
            authentication_type,
            repository_user_name,
            repository_password,
            repository_token,
            repository_ssh_public_key_file_id,
            repository_ssh_private_key_file_id,
            org_id,
        } = self;

        if let Some(name) = repository_name {
            record.repository_name = name;
        }
        if let Some(owner) = repository_owner {
            record.repository_owner = owner;
        }
        if let Some(kind) = repository_type {
            record.repository_type = kind;
        }
        if let Some(branch) = repository_branch {
            record.repository_branch = branch;
        }
        if let Some(org) = org_id {
            record.org_id = org;
        }
        replace_if_some(&mut record.repository_desc, repository_desc);
        replace_if_some(&mut record.authentication_type, authentication_type);
        replace_if_some(&mut record.repository_user_name, repository_user_name);
        replace_if_some(&mut record.repository_password, repository_password);
        replace_if_some(&mut record.repository_token, repository_token);
        replace_if_some(
            &mut record.repository_ssh_public_key_file_id,
            repository_ssh_public_key_file_id,
        );
        replace_if_some(
            &mut record.repository_ssh_private_key_file_id,
            repository_ssh_private_key_file_id,
        );
        record.check_coordinates()
    }
}

fn replace_if_some<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}

/// Credential block of a formatted repository, tagged by `authenticationType`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "authenticationType")]
pub enum GitHubCredentials {
    #[serde(rename = "userName", rename_all = "camelCase")]
    UserName {
        repository_user_name: Option<String>,
        /// Decrypted password.
        repository_password: Option<String>,
    },
    #[serde(rename = "token", rename_all = "camelCase")]
    Token {
        repository_user_name: Option<String>,
        repository_token: Option<String>,
    },
    #[serde(rename = "sshKey")]
    SshKey {
        #[serde(rename = "repositorySSHPublicKeyFileId")]
        public_key_file_id: String,
        #[serde(rename = "repositorySSHPublicKeyFileName")]
        public_key_file_name: String,
        #[serde(rename = "repositorySSHPublicKeyFileData")]
        public_key_file_data: String,
        #[serde(rename = "repositorySSHPrivateKeyFileId")]
        private_key_file_id: String,
        #[serde(rename = "repositorySSHPrivateKeyFileName")]
        private_key_file_name: String,
        #[serde(rename = "repositorySSHPrivateKeyFileData")]
        private_key_file_data: String,
    },
    #[serde(rename = "none")]
    None,
}

impl GitHubCredentials {
    /// `user:secret` pair for HTTP basic auth, when the variant carries one.
    #[must_use]
    pub fn basic_auth(&self) -> Option<String> {
        match self {
            Self::UserName {
                repository_user_name: Some(user),
                repository_password: Some(secret),
            }
            | Self::Token {
                repository_user_name: Some(user),
                repository_token: Some(secret),
            } => Some(format!("{user}:{secret}")),
            _ => None,
        }
    }
}

/// Repository as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GitHubView {
    #[serde(rename = "_id")]
    pub id: String,
    pub repository_name: String,
    pub repository_desc: Option<String>,
    pub repository_owner: String,
    pub repository_type: RepositoryType,
    pub repository_branch: String,
    pub org_id: String,
    pub org_name: Option<String>,
    #[serde(flatten)]
    pub credentials: GitHubCredentials,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request() -> GitHubRequest {
        GitHubRequest {
            repository_name: Some("catalyst".into()),
            repository_owner: Some("relevance".into()),
            repository_type: Some(RepositoryType::Private),
            authentication_type: Some(AuthenticationType::UserName),
            repository_user_name: Some("dev".into()),
            repository_password: Some("secret".into()),
            org_id: Some("org-1".into()),
            ..GitHubRequest::default()
        }
    }

    #[test]
    fn into_record_requires_core_attributes() {
        let err = GitHubRequest {
            repository_owner: None,
            ..request()
        }
        .into_record("g1".into())
        .unwrap_err();
        assert_eq!(err.attribute(), "repositoryOwner");

        let record = request().into_record("g1".into()).unwrap();
        assert_eq!(record.repository_branch, "master");
        assert!(record.stores_encrypted_password());
        assert!(!record.is_repo_cloned);
    }

    #[test]
    fn coordinates_must_stay_inside_their_path_segment() {
        let err = GitHubRequest {
            repository_name: Some("../../victim".into()),
            ..request()
        }
        .into_record("g1".into())
        .unwrap_err();
        assert_eq!((err.status_code(), err.attribute()), (400, "repositoryName"));

        for (owner, branch, attribute) in [
            ("ops/infra", "master", "repositoryOwner"),
            ("ops", "../master", "repositoryBranch"),
            ("ops", "release//1", "repositoryBranch"),
            ("ops", "dev\ntools", "repositoryBranch"),
        ] {
            let err = GitHubRequest {
                repository_owner: Some(owner.into()),
                repository_branch: Some(branch.into()),
                ..request()
            }
            .into_record("g1".into())
            .unwrap_err();
            assert_eq!(err.attribute(), attribute, "{owner} {branch}");
        }

        let record = GitHubRequest {
            repository_branch: Some("release/1.2".into()),
            ..request()
        }
        .into_record("g1".into())
        .unwrap();
        assert_eq!(record.repository_branch, "release/1.2");

        let mut record = request().into_record("g1".into()).unwrap();
        let err = GitHubRequest {
            repository_name: Some("..".into()),
            ..GitHubRequest::default()
        }
        .apply_to(&mut record)
        .unwrap_err();
        assert_eq!(err.attribute(), "repositoryName");
    }

    #[test]
    fn apply_to_patches_only_present_fields() {
        let mut record = request().into_record("g1".into()).unwrap();
        GitHubRequest {
            repository_branch: Some("develop".into()),
            repository_type: Some(RepositoryType::Public),
            ..GitHubRequest::default()
        }
        .apply_to(&mut record)
        .unwrap();

        assert_eq!(record.repository_branch, "develop");
        assert_eq!(record.repository_name, "catalyst");
        assert_eq!(record.repository_user_name.as_deref(), Some("dev"));
        assert!(!record.stores_encrypted_password());
    }

    #[test]
    fn view_flattens_tagged_credentials() {
        let view = GitHubView {
            id: "g1".into(),
            repository_name: "catalyst".into(),
            repository_desc: None,
            repository_owner: "relevance".into(),
            repository_type: RepositoryType::Public,
            repository_branch: "master".into(),
            org_id: "org-1".into(),
            org_name: Some("Phoenix".into()),
            credentials: GitHubCredentials::Token {
                repository_user_name: Some("dev".into()),
                repository_token: Some("tok".into()),
            },
        };
        let json = serde_json::to_value(&view).unwrap();

        assert_eq!(json["authenticationType"], "token");
        assert_eq!(json["repositoryToken"], "tok");
        assert_eq!(json["orgName"], "Phoenix");
        assert_eq!(json["_id"], "g1");
    }

    #[test]
    fn stored_document_uses_console_field_names() {
        let record: GitHubRecord = serde_json::from_value(json!({
            "_id": "g2",
            "repositoryName": "infra",
            "repositoryOwner": "ops",
            "repositoryType": "Public",
            "repositorySSHPublicKeyFileId": "f1",
            "orgId": "org-1",
        }))
        .unwrap();
        assert_eq!(record.repository_ssh_public_key_file_id.as_deref(), Some("f1"));
        assert_eq!(record.archive_name(), "g2.tgz");
    }

    #[test]
    fn basic_auth_only_for_complete_pairs() {
        let creds = GitHubCredentials::UserName {
            repository_user_name: Some("dev".into()),
            repository_password: Some("pw".into()),
        };
        assert_eq!(creds.basic_auth().as_deref(), Some("dev:pw"));
        assert!(GitHubCredentials::None.basic_auth().is_none());
        assert!(GitHubCredentials::Token {
            repository_user_name: None,
            repository_token: Some("t".into()),
        }
        .basic_auth()
        .is_none());
    }
}
