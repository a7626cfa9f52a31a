//! Media relay gateway
//!
//! Typed access to the relay's control API. Only path provisioning and the
//! WebRTC session listing are used.

pub mod error;
pub mod mediamtx;
pub mod types;

use async_trait::async_trait;

pub use error::GatewayError;
pub use mediamtx::MediaMtxClient;
pub use types::{ActiveSession, ActiveSessionList, PathConfig};

/// Control-plane operations on the media relay
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaGateway: Send + Sync {
    /// Expose a new path `name` pulling from `source`.
    async fn add_path(&self, name: &str, source: &str) -> Result<(), GatewayError>;

    /// Remove path `name`. A missing path yields [`GatewayError::NotFound`].
    async fn delete_path(&self, name: &str) -> Result<(), GatewayError>;

    /// Every session the relay currently reports, across all pages.
    async fn list_active_sessions(&self) -> Result<Vec<ActiveSession>, GatewayError>;
}
