/// Server setup and initialization
///
/// Wires together all components: SQLite storage, the cluster resource API,
/// the workflow orchestrator, the host checker engine and HTTP routes.

use crate::{
    api::{create_host_routes, create_workflow_routes, AppState},
    cluster::{DisabledResourceApi, KubeResourceApi, ResourceApi},
    cmdb::{CmdbService, SqliteHostStore},
    config::Config,
    database::DatabaseManager,
    runtime::SweepScheduler,
    workflow::{SqliteWorkflowStore, WorkflowService},
};
use anyhow::Result;
use axum::{routing::get, Router};
use std::sync::Arc;
use tokio::net::TcpListener;

/// A fully wired application: the router plus the background pieces that
/// need stopping on shutdown
pub struct App {
    pub router: Router,
    pub cmdb: Arc<CmdbService>,
    pub scheduler: Arc<SweepScheduler>,
}

impl App {
    /// Stop the sweep schedule, then drain and stop the checkers
    pub async fn shutdown(&self) {
        if let Err(e) = self.scheduler.stop().await {
            tracing::warn!("⚠️ Failed to stop sweep scheduler: {}", e);
        }
        self.cmdb.shutdown().await;
    }
}

/// Build the HTTP router over already constructed services
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check endpoint
        .route("/healthz", get(health_check))
        .merge(create_workflow_routes())
        .merge(create_host_routes())
        .with_state(state)
}

/// Pick the resource API: a real cluster client when enabled and reachable,
/// otherwise one that refuses every call
async fn create_resource_api(config: &Config) -> Arc<dyn ResourceApi> {
    if !config.kube.enabled {
        tracing::info!("☸️ Kubernetes disabled, workflow resource calls will fail");
        return Arc::new(DisabledResourceApi);
    }

    match KubeResourceApi::try_default().await {
        Ok(api) => {
            tracing::info!("☸️ Connected to Kubernetes cluster");
            Arc::new(api)
        }
        Err(e) => {
            tracing::error!("❌ Failed to connect to Kubernetes, continuing without it: {}", e);
            Arc::new(DisabledResourceApi)
        }
    }
}

/// Create the application with all routes and background services
///
/// Starts the host checker engine, queues an initial sweep and schedules
/// the periodic ones.
pub async fn create_app(config: Config) -> Result<App> {
    tracing::info!("📁 Opening database in {}", config.database.data_dir);
    let database = DatabaseManager::open(&config.database.data_dir)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to open database: {}", e))?;

    tracing::info!("📋 Initializing workflow orchestrator");
    let resources = create_resource_api(&config).await;
    let workflows = WorkflowService::new(
        resources,
        Arc::new(SqliteWorkflowStore::new(database.pool())),
        config.workflow.rollback_on_failure,
    );

    tracing::info!("🖥️ Initializing CMDB host checker");
    let cmdb = Arc::new(CmdbService::new(
        Arc::new(SqliteHostStore::new(database.pool())),
        &config.checker,
    ));
    cmdb.start_checker();

    let discovery = cmdb.discovery();
    tokio::spawn(async move {
        if let Err(e) = discovery.start_host_check().await {
            tracing::error!("❌ Initial host sweep failed: {}", e);
        }
    });

    let scheduler = Arc::new(
        SweepScheduler::new(cmdb.discovery())
            .await
            .map_err(|e| anyhow::anyhow!("Failed to initialize sweep scheduler: {}", e))?,
    );
    scheduler.start(&config.checker.sweep_schedule).await?;

    tracing::info!("📡 Creating HTTP router with all endpoints");
    let router = create_router(AppState { workflows, cmdb: Arc::clone(&cmdb) });

    tracing::info!("✅ Application initialized successfully");
    Ok(App { router, cmdb, scheduler })
}

/// Start the HTTP server with the given configuration
///
/// Serves until Ctrl-C, then stops the background engine before returning.
pub async fn start_server(config: Config) -> Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(true)
        .with_level(true)
        .init();

    tracing::info!("Starting clusterdesk server...");

    let app = create_app(config.clone()).await?;

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&bind_addr).await?;

    tracing::info!("Server listening on http://{}", bind_addr);

    axum::serve(listener, app.router.clone().into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    app.shutdown().await;
    tracing::info!("👋 Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("❌ Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("🛑 Shutdown signal received");
}

async fn health_check() -> &'static str {
    "ok"
}
