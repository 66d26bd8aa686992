//! Console HTTP server with a deferred startup lifecycle.
//!
//! `new()` wires the router state, `start()` binds the listener and reports
//! the port, `serve()` accepts requests until the shutdown future resolves.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tracing::{info, warn};

use super::config::{NetworkConfig, TlsConfig};
use super::handlers::{
    catalog, deploy, files, github, health_handler, liveness_handler, readiness_handler,
    repositories, services, AppState,
};
use super::middleware::{build_http_layers, track_in_flight};
use super::shutdown::ShutdownController;
use crate::service::ConsoleServices;

const ENVIRONMENT: &str = "/organizations/{orgId}/businessgroups/{bgId}/projects/{projectId}";

/// Assembles every console route with its middleware.
///
/// Health probes sit outside the in-flight tracking so they keep answering
/// while the server drains.
pub fn router(state: AppState, config: &NetworkConfig) -> Router {
    let environment = |listing: &str| format!("{ENVIRONMENT}/environments/{{envId}}/{listing}");

    let api = Router::new()
        .route(
            "/providers/{providerId}/unmanagedInstances",
            get(catalog::unmanaged_instances),
        )
        .route(
            "/blueprints/{blueprintId}/blueprintInfo",
            get(catalog::blueprint_info),
        )
        .route(&environment("containerList"), get(catalog::container_list))
        .route(&environment("instanceList"), get(catalog::instance_list))
        .route(&environment("taskList"), get(catalog::task_list))
        .route(&environment("cftList"), get(catalog::cft_list))
        .route(&environment("azureArmList"), get(catalog::azure_arm_list))
        .route(
            &format!("{ENVIRONMENT}/applicationList"),
            get(catalog::application_list),
        )
        .route(
            "/app/deploy/project/{projectId}/appDeployList",
            get(deploy::list),
        )
        .route(
            "/app/deploy/project/{projectId}/env/{envName}/version/{version}/node/{nodeIp}/appDeployHistoryList",
            get(deploy::history),
        )
        .route(
            "/app/deploy/project/{projectId}/appDeploy",
            get(deploy::pipeline),
        )
        .route(
            "/d4dMasters/organization/{orgId}/repositoryServer/list",
            get(repositories::repository_servers),
        )
        .route(
            "/app/deploy/nexus/{nexusId}/project/{projectId}/nexusRepositoryList",
            get(repositories::nexus_repositories),
        )
        .route(
            "/app/deploy/nexus/{nexusId}/repositories/{repoName}/group/{groupId}/artifactList",
            get(repositories::artifacts),
        )
        .route(
            "/app/deploy/nexus/{nexusId}/repositories/{repoName}/group/{groupId}/artifact/{artifactId}/versionList",
            get(repositories::versions),
        )
        .route("/git-hub", get(github::list).post(github::create))
        .route(
            "/git-hub/{gitHubId}",
            get(github::get).patch(github::update).delete(github::delete),
        )
        .route("/git-hub/{gitHubId}/sync", post(github::sync))
        .route("/services", get(services::list).post(services::create))
        .route(
            "/services/{serviceId}",
            get(services::get)
                .patch(services::update)
                .delete(services::delete),
        )
        .route("/services/{serviceId}/versions", get(services::versions))
        .route("/services/{serviceId}/resources", get(services::resources))
        .route(
            "/services/{serviceId}/resources/{resourceId}/authentication",
            post(services::authenticate),
        )
        .route("/file-upload", post(files::upload))
        .route("/file-upload/{fileId}", get(files::download))
        .layer(axum::middleware::from_fn_with_state(
            Arc::clone(&state.shutdown),
            track_in_flight,
        ));

    Router::new()
        .route("/health", get(health_handler))
        .route("/health/live", get(liveness_handler))
        .route("/health/ready", get(readiness_handler))
        .merge(api)
        .layer(DefaultBodyLimit::disable())
        .layer(build_http_layers(config))
        .with_state(state)
}

/// Owns the listener and the shutdown controller for one server run.
pub struct NetworkModule {
    config: NetworkConfig,
    listener: Option<TcpListener>,
    shutdown: Arc<ShutdownController>,
    services: ConsoleServices,
}

impl NetworkModule {
    #[must_use]
    pub fn new(config: NetworkConfig, services: ConsoleServices) -> Self {
        Self {
            config,
            listener: None,
            shutdown: Arc::new(ShutdownController::new()),
            services,
        }
    }

    #[must_use]
    pub fn shutdown_controller(&self) -> Arc<ShutdownController> {
        Arc::clone(&self.shutdown)
    }

    #[must_use]
    pub fn build_router(&self) -> Router {
        let state = AppState {
            shutdown: Arc::clone(&self.shutdown),
            services: self.services.clone(),
            start_time: Instant::now(),
        };
        router(state, &self.config)
    }

    /// Binds the configured address. Returns the bound port, which differs
    /// from the configured one when that is 0.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound.
    pub async fn start(&mut self) -> anyhow::Result<u16> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = TcpListener::bind(&addr).await?;
        let port = listener.local_addr()?.port();

        info!(host = %self.config.host, port, "listener bound");

        self.listener = Some(listener);
        Ok(port)
    }

    /// Serves until `shutdown` resolves, then drains in-flight requests for
    /// up to 30 seconds.
    ///
    /// # Errors
    ///
    /// Fails when `start()` was not called, TLS material cannot be loaded, or
    /// the server hits a fatal I/O error.
    pub async fn serve(
        mut self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> anyhow::Result<()> {
        let listener = self
            .listener
            .take()
            .ok_or_else(|| anyhow::anyhow!("start() must be called before serve()"))?;
        let router = self.build_router();
        let shutdown_ctrl = self.shutdown;

        shutdown_ctrl.set_ready();

        match self.config.tls {
            Some(ref tls) => serve_tls(listener, router, tls, shutdown).await?,
            None => serve_plain(listener, router, shutdown).await?,
        }
        drain(&shutdown_ctrl).await;
        Ok(())
    }
}

async fn serve_plain(
    listener: TcpListener,
    router: Router,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    info!("serving plain HTTP");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

/// Reuses the bound listener for rustls through `axum-server`.
async fn serve_tls(
    listener: TcpListener,
    router: Router,
    tls: &TlsConfig,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    use axum_server::tls_rustls::RustlsConfig;

    let rustls_config = RustlsConfig::from_pem_file(&tls.cert_path, &tls.key_path)
        .await
        .map_err(|e| anyhow::anyhow!("failed to load TLS certificates: {e}"))?;

    let addr = listener.local_addr()?;
    let std_listener = listener.into_std()?;
    let handle = axum_server::Handle::new();
    let shutdown_handle = handle.clone();

    tokio::spawn(async move {
        shutdown.await;
        shutdown_handle.graceful_shutdown(None);
    });

    info!(%addr, "serving HTTPS");
    axum_server::from_tcp_rustls(std_listener, rustls_config)
        .handle(handle)
        .serve(router.into_make_service())
        .await?;
    Ok(())
}

async fn drain(shutdown_ctrl: &ShutdownController) {
    shutdown_ctrl.trigger_shutdown();
    if shutdown_ctrl.wait_for_drain(Duration::from_secs(30)).await {
        info!("in-flight requests drained");
    } else {
        warn!(
            remaining = shutdown_ctrl.in_flight_count(),
            "drain timeout expired with requests in flight"
        );
    }
}
