//! Console configuration: defaults, YAML file overlay.
//!
//! [`ConsoleConfig`] is built once at startup (defaults, then the optional
//! `--config` file, then command-line flags) and handed to each component.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

use crate::network::config::{NetworkConfig, TlsConfig};

/// Everything the server needs to start.
#[derive(Debug, Clone, Default)]
pub struct ConsoleConfig {
    pub network: NetworkConfig,
    pub crypto: CryptoConfig,
    pub paths: PathsConfig,
    pub integrations: IntegrationsConfig,
}

/// Text encoding of ciphertext stored in the record store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CipherEncoding {
    #[default]
    Base64,
    Hex,
}

/// Secret encryption settings.
#[derive(Debug, Clone)]
pub struct CryptoConfig {
    /// Algorithm label. Only `aes-256-gcm` is supported.
    pub algorithm: String,
    /// Password the encryption key is derived from.
    pub password: String,
    pub encoding: CipherEncoding,
}

impl Default for CryptoConfig {
    fn default() -> Self {
        Self {
            algorithm: "aes-256-gcm".to_string(),
            password: "catalystPass".to_string(),
            encoding: CipherEncoding::Base64,
        }
    }
}

/// Working directories on the local file system.
#[derive(Debug, Clone)]
pub struct PathsConfig {
    /// Staging area for downloaded repository archives.
    pub current_dir: PathBuf,
    /// Root under which each repository is extracted into `<gitHubId>/`.
    pub git_hub_dir: PathBuf,
    /// Scratch space for PEM files handed to ssh and the bootstrapper.
    pub temp_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            current_dir: PathBuf::from("data/current"),
            git_hub_dir: PathBuf::from("data/gitHub"),
            temp_dir: PathBuf::from("data/temp"),
        }
    }
}

/// External systems the console talks to.
#[derive(Debug, Clone)]
pub struct IntegrationsConfig {
    /// Base URL of the GitHub REST API used for tarball downloads.
    pub git_hub_api_base: String,
    /// Per-request timeout for Nexus calls.
    pub nexus_timeout: Duration,
    /// Program invoked to bootstrap authenticated nodes.
    pub bootstrap_program: String,
    /// ssh client used to verify node credentials.
    pub ssh_program: String,
}

impl Default for IntegrationsConfig {
    fn default() -> Self {
        Self {
            git_hub_api_base: "https://api.github.com".to_string(),
            nexus_timeout: Duration::from_secs(30),
            bootstrap_program: "knife".to_string(),
            ssh_program: "ssh".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// YAML file overlay
// ---------------------------------------------------------------------------

/// Shape of the `--config` YAML file. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct ConfigFile {
    pub network: NetworkSection,
    pub crypto: CryptoSection,
    pub paths: PathsSection,
    pub integrations: IntegrationsSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct NetworkSection {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub cors_origins: Option<Vec<String>>,
    pub request_timeout_secs: Option<u64>,
    pub max_body_bytes: Option<usize>,
    pub tls_cert_path: Option<PathBuf>,
    pub tls_key_path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct CryptoSection {
    pub algorithm: Option<String>,
    pub password: Option<String>,
    pub encoding: Option<CipherEncoding>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct PathsSection {
    pub current_dir: Option<PathBuf>,
    pub git_hub_dir: Option<PathBuf>,
    pub temp_dir: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct IntegrationsSection {
    pub git_hub_api_base: Option<String>,
    pub nexus_timeout_secs: Option<u64>,
    pub bootstrap_program: Option<String>,
    pub ssh_program: Option<String>,
}

fn set<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

impl ConfigFile {
    /// Reads and parses a YAML config file.
    ///
    /// # Errors
    ///
    /// Fails when the file is unreadable or has unknown keys or bad values.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("parsing config file {}", path.display()))
    }

    /// # Errors
    ///
    /// Fails on malformed YAML, unknown keys or bad values.
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(raw)?)
    }

    /// Overwrites every setting present in the file.
    ///
    /// # Errors
    ///
    /// Fails when only one of the two TLS paths is given.
    pub fn apply(self, config: &mut ConsoleConfig) -> anyhow::Result<()> {
        let network = self.network;
        set(&mut config.network.host, network.host);
        set(&mut config.network.port, network.port);
        set(&mut config.network.cors_origins, network.cors_origins);
        set(
            &mut config.network.request_timeout,
            network.request_timeout_secs.map(Duration::from_secs),
        );
        set(&mut config.network.max_body_bytes, network.max_body_bytes);
        match (network.tls_cert_path, network.tls_key_path) {
            (Some(cert_path), Some(key_path)) => {
                config.network.tls = Some(TlsConfig {
                    cert_path,
                    key_path,
                });
            }
            (None, None) => {}
            _ => anyhow::bail!("tlsCertPath and tlsKeyPath must be set together"),
        }

        set(&mut config.crypto.algorithm, self.crypto.algorithm);
        set(&mut config.crypto.password, self.crypto.password);
        set(&mut config.crypto.encoding, self.crypto.encoding);

        set(&mut config.paths.current_dir, self.paths.current_dir);
        set(&mut config.paths.git_hub_dir, self.paths.git_hub_dir);
        set(&mut config.paths.temp_dir, self.paths.temp_dir);

        let integrations = self.integrations;
        set(
            &mut config.integrations.git_hub_api_base,
            integrations.git_hub_api_base,
        );
        set(
            &mut config.integrations.nexus_timeout,
            integrations.nexus_timeout_secs.map(Duration::from_secs),
        );
        set(
            &mut config.integrations.bootstrap_program,
            integrations.bootstrap_program,
        );
        set(&mut config.integrations.ssh_program, integrations.ssh_program);
        Ok(())
    }
}
