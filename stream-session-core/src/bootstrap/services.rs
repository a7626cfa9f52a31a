//! Service initialization and dependency injection

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::{
    gateway::{MediaGateway, MediaMtxClient},
    repository::StreamRepository,
    service::{SessionReconciler, StreamSessionService},
    Config,
};

/// Container for all initialized services
#[derive(Clone)]
pub struct Services {
    /// Start/stop lifecycle
    pub sessions: Arc<StreamSessionService>,
    /// Periodic eviction of stale records
    pub reconciler: Arc<SessionReconciler>,
}

/// Build the relay client and the services on top of `repository`.
pub fn init_services(
    config: &Config,
    repository: Arc<dyn StreamRepository>,
) -> Result<Services, anyhow::Error> {
    let gateway: Arc<dyn MediaGateway> = Arc::new(MediaMtxClient::from_config(&config.relay)?);
    info!(url = %config.relay.control_url(), "Media relay client initialized");

    let sessions = Arc::new(StreamSessionService::new(
        config.relay.clone(),
        gateway.clone(),
        repository.clone(),
    ));
    let reconciler = Arc::new(SessionReconciler::new(
        gateway,
        repository,
        Duration::from_secs(config.reconciler.interval_seconds),
    ));

    Ok(Services {
        sessions,
        reconciler,
    })
}
