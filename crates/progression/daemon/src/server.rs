//! Server setup and lifecycle management

use crate::api::create_router;
use crate::api::rest::state::AppState;
use crate::config::DaemonConfig;
use crate::error::{DaemonError, DaemonResult};
use progression_service::{
    AccessGuard, DirectorySeed, InMemoryDirectory, InMemoryProfileStore, ProgressionService,
    Sources, StaticBadgeRegistry,
};
use std::sync::Arc;
use tokio::net::TcpListener;

/// Progression daemon server
pub struct Server {
    config: DaemonConfig,
    service: Arc<ProgressionService>,
}

impl Server {
    /// Wire the orchestrator over in-memory storage and collaborators.
    pub fn new(config: DaemonConfig) -> DaemonResult<Self> {
        let directory = Arc::new(match &config.seed.directory_file {
            Some(path) => load_directory(path)?,
            None => InMemoryDirectory::new(),
        });
        let badges =
            StaticBadgeRegistry::standard().with_badges(config.seed.extra_badges.iter().cloned());

        let service = ProgressionService::new(
            Arc::new(InMemoryProfileStore::new()),
            AccessGuard::new(directory.clone()),
            Sources::in_memory(directory, Arc::new(badges)),
            config.service.clone(),
        );

        Ok(Self {
            config,
            service: Arc::new(service),
        })
    }

    /// Run the server until a shutdown signal arrives
    pub async fn run(self) -> DaemonResult<()> {
        let addr = self.config.server.listen_addr;
        let app = create_router(AppState::new(self.service), self.config.server.enable_cors);

        let listener = TcpListener::bind(addr).await?;
        tracing::info!(%addr, "Progression daemon listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| DaemonError::Server(e.to_string()))?;

        tracing::info!("Progression daemon shut down");
        Ok(())
    }
}

fn load_directory(path: &str) -> DaemonResult<InMemoryDirectory> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| DaemonError::Seed(format!("cannot read {path}: {e}")))?;
    let seed: DirectorySeed = serde_json::from_str(&raw)
        .map_err(|e| DaemonError::Seed(format!("invalid seed file {path}: {e}")))?;
    let directory =
        InMemoryDirectory::from_seed(seed).map_err(|e| DaemonError::Seed(e.to_string()))?;
    tracing::info!(path, "Loaded directory seed");
    Ok(directory)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        }
    }
}
