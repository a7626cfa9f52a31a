use anyhow::Result;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use stream_session_core::bootstrap::Services;
use stream_session_core::Config;

/// Stream session server
///
/// Owns the gRPC listener and the reconciliation loop for the process lifetime.
pub struct StreamSessionServer {
    config: Config,
    services: Services,
    shutdown: CancellationToken,
}

impl StreamSessionServer {
    pub fn new(config: Config, services: Services) -> Self {
        Self {
            config,
            services,
            shutdown: CancellationToken::new(),
        }
    }

    /// Start all components and block until a server exits or a signal arrives.
    pub async fn start(self) -> Result<()> {
        let grpc_handle = self.start_grpc_server();

        let reconciler_handle = if self.config.reconciler.enabled {
            Some(self.services.reconciler.start())
        } else {
            info!("Reconciler: disabled");
            None
        };

        info!("All servers started successfully");

        let outcome = tokio::select! {
            res = grpc_handle => match res {
                Ok(Ok(())) => Err(anyhow::anyhow!("gRPC server stopped unexpectedly")),
                Ok(Err(e)) => Err(e),
                Err(e) => Err(anyhow::anyhow!("gRPC server task failed: {e}")),
            },
            () = shutdown_signal() => {
                info!("Shutdown signal received, shutting down...");
                Ok(())
            }
        };

        self.shutdown.cancel();
        self.services.reconciler.shutdown();
        if let Some(handle) = reconciler_handle {
            if let Err(e) = handle.await {
                error!("Reconciler task failed: {e}");
            }
        }

        if let Err(e) = &outcome {
            error!("{e:#}");
        }
        info!("Stream session server stopped");
        outcome
    }

    fn start_grpc_server(&self) -> JoinHandle<Result<()>> {
        let config = self.config.clone();
        let sessions = self.services.sessions.clone();
        let shutdown = self.shutdown.clone();

        tokio::spawn(async move { stream_session_api::serve(&config, sessions, shutdown).await })
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received Ctrl+C signal");
            }
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {}", e);
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
                info!("Received SIGTERM signal");
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
