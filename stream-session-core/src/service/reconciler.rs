//! Periodic reconciliation of recorded sessions against relay activity
//!
//! Each tick lists what the relay is serving and what the store has on
//! record, then tears down every record with no reader. Relay paths with no
//! record are never touched.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::teardown::teardown;
use crate::gateway::MediaGateway;
use crate::repository::StreamRepository;
use crate::{Error, Result};

/// Outcome of one reconciliation tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Records found in the store
    pub recorded: usize,
    /// Sessions the relay reported
    pub active: usize,
    /// Records with at least one active session on their path
    pub matched: usize,
    /// Stale records torn down
    pub evicted: usize,
    /// Stale records whose teardown failed; retried next tick
    pub failed: usize,
}

/// Session reconciler
///
/// Runs [`run_once`](Self::run_once) on a fixed period until shut down.
pub struct SessionReconciler {
    gateway: Arc<dyn MediaGateway>,
    repository: Arc<dyn StreamRepository>,
    interval: Duration,
    cancel_token: CancellationToken,
}

impl SessionReconciler {
    #[must_use]
    pub fn new(
        gateway: Arc<dyn MediaGateway>,
        repository: Arc<dyn StreamRepository>,
        interval: Duration,
    ) -> Self {
        Self {
            gateway,
            repository,
            interval,
            cancel_token: CancellationToken::new(),
        }
    }

    /// Tie the loop to an externally owned token (e.g. process shutdown).
    #[must_use]
    pub fn with_cancel_token(mut self, cancel_token: CancellationToken) -> Self {
        self.cancel_token = cancel_token;
        self
    }

    /// Start the reconciliation loop
    ///
    /// The first tick fires one full interval after this call. Returns the
    /// `JoinHandle` so the caller can detect panics or task completion.
    pub fn start(&self) -> JoinHandle<()> {
        let gateway = self.gateway.clone();
        let repository = self.repository.clone();
        let cancel_token = self.cancel_token.clone();
        let period = self.interval;

        let mut timer = interval_at(Instant::now() + period, period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tokio::spawn(async move {
            info!(interval_secs = period.as_secs(), "Session reconciler started");
            loop {
                tokio::select! {
                    () = cancel_token.cancelled() => {
                        info!("Session reconciler shutting down");
                        return;
                    }
                    _ = timer.tick() => {
                        if let Err(e) = reconcile(gateway.as_ref(), repository.as_ref()).await {
                            error!(error = %e, "Reconciliation tick aborted");
                        }
                    }
                }
            }
        })
    }

    /// Stop the loop between ticks.
    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }

    /// Run a single reconciliation pass.
    pub async fn run_once(&self) -> Result<ReconcileReport> {
        reconcile(self.gateway.as_ref(), self.repository.as_ref()).await
    }
}

async fn reconcile(
    gateway: &dyn MediaGateway,
    repository: &dyn StreamRepository,
) -> Result<ReconcileReport> {
    let active = gateway
        .list_active_sessions()
        .await
        .map_err(|e| Error::ProcessFailure(format!("listing relay sessions: {e}")))?;
    let recorded = repository
        .list()
        .await
        .map_err(|e| Error::ProcessFailure(format!("listing stream records: {e}")))?;

    let active_paths: HashSet<&str> = active.iter().map(|s| s.path.as_str()).collect();
    let mut report = ReconcileReport {
        recorded: recorded.len(),
        active: active.len(),
        ..ReconcileReport::default()
    };

    for stream in &recorded {
        if active_paths.contains(stream.uuid.as_str()) {
            report.matched += 1;
            continue;
        }

        match teardown(gateway, repository, stream).await {
            Ok(()) => {
                report.evicted += 1;
                info!(uuid = %stream.uuid, stream_id = %stream.id, "Evicted stale stream");
            }
            Err(e) => {
                report.failed += 1;
                warn!(uuid = %stream.uuid, stream_id = %stream.id, error = %e, "Failed to evict stale stream");
            }
        }
    }

    let recorded_uuids: HashSet<&str> = recorded.iter().map(|s| s.uuid.as_str()).collect();
    let unrecorded = active_paths.difference(&recorded_uuids).count();
    if unrecorded > 0 {
        debug!(paths = unrecorded, "Relay serving paths with no stream record");
    }

    info!(
        recorded = report.recorded,
        active = report.active,
        matched = report.matched,
        evicted = report.evicted,
        failed = report.failed,
        "Reconciliation complete"
    );

    Ok(report)
}
