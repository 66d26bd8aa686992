//! `catalyst-server` binary: configuration, logging, wiring and serve.

use std::path::PathBuf;

use anyhow::Context;
use catalyst_server::network::NetworkModule;
use catalyst_server::service::{Collaborators, ConfigFile, ConsoleConfig, ConsoleServices};
use catalyst_server::storage::seed::load_seed_file;
use clap::{Parser, ValueEnum};
use tracing::{error, info};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Json,
    Pretty,
}

/// Catalyst console REST server.
#[derive(Parser, Debug)]
#[command(name = "catalyst-server", version)]
struct Args {
    /// YAML configuration file; flags below override it.
    #[arg(long, env = "CATALYST_CONFIG")]
    config: Option<PathBuf>,

    /// JSON seed mapping collection names to document arrays.
    #[arg(long, env = "CATALYST_SEED")]
    seed: Option<PathBuf>,

    #[arg(long, env = "CATALYST_HOST")]
    host: Option<String>,

    #[arg(long, env = "CATALYST_PORT")]
    port: Option<u16>,

    /// Password the secret cipher derives its key from.
    #[arg(long, env = "CATALYST_CRYPTO_PASSWORD", hide_env_values = true)]
    crypto_password: Option<String>,

    #[arg(long, env = "CATALYST_LOG_FORMAT", value_enum, default_value = "pretty")]
    log_format: LogFormat,
}

impl Args {
    fn apply(&self, config: &mut ConsoleConfig) {
        if let Some(host) = &self.host {
            config.network.host.clone_from(host);
        }
        if let Some(port) = self.port {
            config.network.port = port;
        }
        if let Some(password) = &self.crypto_password {
            config.crypto.password.clone_from(password);
        }
    }
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(fmt::layer()).init(),
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown requested"),
        Err(err) => {
            error!(error = %err, "cannot listen for ctrl-c; running until killed");
            std::future::pending::<()>().await;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.log_format);

    let mut config = ConsoleConfig::default();
    if let Some(path) = &args.config {
        ConfigFile::load(path)?.apply(&mut config)?;
        info!(path = %path.display(), "configuration loaded");
    }
    args.apply(&mut config);

    for dir in [&config.paths.git_hub_dir, &config.paths.temp_dir] {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("creating {}", dir.display()))?;
    }

    let collaborators = Collaborators::from_config(&config)?;
    if let Some(seed) = &args.seed {
        load_seed_file(collaborators.store.as_ref(), seed).await?;
    }
    let services = ConsoleServices::new(collaborators, &config);

    let mut module = NetworkModule::new(config.network.clone(), services);
    let port = module.start().await?;
    info!(port, tls = config.network.tls.is_some(), "catalyst server started");

    module.serve(shutdown_signal()).await
}
