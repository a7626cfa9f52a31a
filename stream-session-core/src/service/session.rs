//! Stream session lifecycle
//!
//! Start provisions the relay path before writing the record, so a record
//! never outlives a failed provisioning. Stop tears down in the reverse order.

use std::sync::Arc;

use tracing::{error, info, warn};

use super::sub_path::{IdentitySubPath, SubPathResolver};
use super::teardown::teardown;
use crate::config::RelayConfig;
use crate::gateway::MediaGateway;
use crate::models::Stream;
use crate::repository::StreamRepository;
use crate::validation::{uuid_from_stream_url, validate_stream_id};
use crate::{Error, Result};

/// A session accepted by [`StreamSessionService::start`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartedStream {
    pub stream: Stream,
    /// Published playback URL, `http://{webrtc}/{uuid}`
    pub url: String,
}

/// Stream session service
///
/// Coordinates relay provisioning with the session record store.
#[derive(Clone)]
pub struct StreamSessionService {
    relay: RelayConfig,
    gateway: Arc<dyn MediaGateway>,
    repository: Arc<dyn StreamRepository>,
    sub_paths: Arc<dyn SubPathResolver>,
}

impl std::fmt::Debug for StreamSessionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamSessionService")
            .field("relay", &self.relay)
            .finish_non_exhaustive()
    }
}

impl StreamSessionService {
    #[must_use]
    pub fn new(
        relay: RelayConfig,
        gateway: Arc<dyn MediaGateway>,
        repository: Arc<dyn StreamRepository>,
    ) -> Self {
        Self {
            relay,
            gateway,
            repository,
            sub_paths: Arc::new(IdentitySubPath),
        }
    }

    /// Replace the default identity sub-path mapping.
    #[must_use]
    pub fn with_sub_path_resolver(mut self, resolver: Arc<dyn SubPathResolver>) -> Self {
        self.sub_paths = resolver;
        self
    }

    /// Start a session for `stream_id` and return its published URL.
    pub async fn start(&self, stream_id: &str, caller: &str) -> Result<StartedStream> {
        let stream_id = validate_stream_id(stream_id)?;
        let stream = Stream::new(stream_id);
        let source = self.relay.rtsp_source(&self.sub_paths.resolve(stream_id));

        if let Err(e) = self.gateway.add_path(&stream.uuid, &source).await {
            warn!(
                stream_id = %stream_id,
                uuid = %stream.uuid,
                caller = %caller,
                error = %e,
                "Relay refused to provision stream"
            );
            return Err(e.into());
        }

        if let Err(e) = self.repository.insert(&stream).await {
            self.roll_back(&stream).await;
            return Err(e);
        }

        let url = self.relay.stream_url(&stream.uuid);
        info!(
            stream_id = %stream.id,
            uuid = %stream.uuid,
            caller = %caller,
            source = %source,
            "Stream started"
        );

        Ok(StartedStream { stream, url })
    }

    /// Stop the session published at `stream_url`.
    pub async fn stop(&self, stream_url: &str, caller: &str) -> Result<()> {
        let uuid = uuid_from_stream_url(stream_url)?;

        let stream = self
            .repository
            .find(&uuid)
            .await?
            .ok_or_else(|| Error::NotFound(format!("stream {uuid} not found")))?;

        teardown(self.gateway.as_ref(), self.repository.as_ref(), &stream)
            .await
            .inspect_err(|e| {
                warn!(uuid = %uuid, caller = %caller, error = %e, "Stream teardown failed");
            })?;

        info!(stream_id = %stream.id, uuid = %uuid, caller = %caller, "Stream stopped");
        Ok(())
    }

    /// Undo a provisioned path whose record could not be written.
    async fn roll_back(&self, stream: &Stream) {
        match self.gateway.delete_path(&stream.uuid).await {
            Ok(()) => {
                warn!(uuid = %stream.uuid, "Rolled back relay path after record write failure");
            }
            Err(e) if e.is_not_found() => {}
            Err(e) => {
                error!(
                    uuid = %stream.uuid,
                    stream_id = %stream.id,
                    error = %e,
                    "Relay path orphaned: rollback after record write failure failed"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RtspConfig, WebRtcEndpointConfig};
    use crate::gateway::{GatewayError, MockMediaGateway};
    use crate::repository::{MemoryStreamRepository, MockStreamRepository};
    use mockall::predicate::eq;
    use parking_lot::Mutex;
    use reqwest::StatusCode;

    fn relay() -> RelayConfig {
        RelayConfig {
            rtsp: RtspConfig {
                host: "10.0.0.5".to_string(),
                port: 8554,
                path: "/live".to_string(),
            },
            webrtc: WebRtcEndpointConfig {
                host: "media.example.com".to_string(),
                port: 8889,
            },
            ..RelayConfig::default()
        }
    }

    fn service(
        gateway: MockMediaGateway,
        repository: Arc<dyn StreamRepository>,
    ) -> StreamSessionService {
        StreamSessionService::new(relay(), Arc::new(gateway), repository)
    }

    fn uuid_of(url: &str) -> &str {
        url.trim_start_matches("http://media.example.com:8889/")
    }

    #[tokio::test]
    async fn test_start_provisions_then_records() {
        let mut gateway = MockMediaGateway::new();
        gateway
            .expect_add_path()
            .withf(|name: &str, source: &str| {
                !name.is_empty() && source == "rtsp://10.0.0.5:8554/live/cam1"
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let repo = Arc::new(MemoryStreamRepository::new());
        let started = service(gateway, repo.clone())
            .start(" cam1 ", "alice")
            .await
            .unwrap();

        assert!(started.url.starts_with("http://media.example.com:8889/"));
        let uuid = uuid_of(&started.url);
        assert_eq!(uuid, started.stream.uuid);
        assert_ne!(uuid, "cam1");
        assert_eq!(
            repo.find(uuid).await.unwrap(),
            Some(Stream::with_uuid("cam1", uuid))
        );
    }

    #[tokio::test]
    async fn test_start_issues_fresh_tokens() {
        let mut gateway = MockMediaGateway::new();
        gateway.expect_add_path().times(2).returning(|_, _| Ok(()));

        let repo = Arc::new(MemoryStreamRepository::new());
        let service = service(gateway, repo.clone());
        let first = service.start("cam1", "alice").await.unwrap();
        let second = service.start("cam1", "alice").await.unwrap();

        assert_ne!(first.stream.uuid, second.stream.uuid);
        assert_eq!(repo.len(), 2);
    }

    #[tokio::test]
    async fn test_start_rejects_invalid_stream_id() {
        // no expectations: any relay call fails the test
        let gateway = MockMediaGateway::new();
        let repo = Arc::new(MemoryStreamRepository::new());

        let err = service(gateway, repo.clone())
            .start("cam 1/../x", "alice")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::InvalidArgument(_)));
        assert!(repo.is_empty());
    }

    #[tokio::test]
    async fn test_start_relay_failure_writes_no_record() {
        let mut gateway = MockMediaGateway::new();
        gateway.expect_add_path().times(1).returning(|_, _| {
            Err(GatewayError::BadConfig {
                message: "invalid source".to_string(),
            })
        });
        gateway.expect_delete_path().never();

        let repo = Arc::new(MemoryStreamRepository::new());
        let err = service(gateway, repo.clone())
            .start("cam1", "alice")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::RelayRejected { status: 400, .. }));
        assert!(repo.is_empty());
    }

    #[tokio::test]
    async fn test_start_relay_unreachable_is_unavailable() {
        let mut gateway = MockMediaGateway::new();
        gateway
            .expect_add_path()
            .returning(|_, _| Err(GatewayError::Network("connection refused".to_string())));

        let repo = Arc::new(MemoryStreamRepository::new());
        let err = service(gateway, repo.clone())
            .start("cam1", "alice")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Unavailable(_)));
        assert!(repo.is_empty());
    }

    #[tokio::test]
    async fn test_start_store_failure_rolls_back_path() {
        let provisioned = Arc::new(Mutex::new(None::<String>));
        let rolled_back = Arc::new(Mutex::new(None::<String>));

        let mut gateway = MockMediaGateway::new();
        let added = provisioned.clone();
        gateway
            .expect_add_path()
            .times(1)
            .returning(move |name, _| {
                *added.lock() = Some(name.to_string());
                Ok(())
            });
        let removed = rolled_back.clone();
        gateway
            .expect_delete_path()
            .times(1)
            .returning(move |name| {
                *removed.lock() = Some(name.to_string());
                Ok(())
            });

        let mut repo = MockStreamRepository::new();
        repo.expect_insert()
            .times(1)
            .returning(|_| Err(Error::Store("Redis SET timed out".to_string())));

        let err = service(gateway, Arc::new(repo))
            .start("cam1", "alice")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Store(_)));
        assert!(provisioned.lock().is_some());
        assert_eq!(*provisioned.lock(), *rolled_back.lock());
    }

    #[tokio::test]
    async fn test_start_store_failure_reports_store_error_when_rollback_fails() {
        let mut gateway = MockMediaGateway::new();
        gateway.expect_add_path().returning(|_, _| Ok(()));
        gateway
            .expect_delete_path()
            .times(1)
            .returning(|_| Err(GatewayError::Network("connection reset".to_string())));

        let mut repo = MockStreamRepository::new();
        repo.expect_insert()
            .returning(|_| Err(Error::Store("connection refused".to_string())));

        let err = service(gateway, Arc::new(repo))
            .start("cam1", "alice")
            .await
            .unwrap_err();

        assert!(err.is_store_failure());
    }

    #[tokio::test]
    async fn test_stop_removes_path_and_record() {
        let mut gateway = MockMediaGateway::new();
        gateway
            .expect_delete_path()
            .with(eq("u1"))
            .times(1)
            .returning(|_| Ok(()));

        let repo = Arc::new(MemoryStreamRepository::new());
        repo.insert(&Stream::with_uuid("cam1", "u1")).await.unwrap();

        service(gateway, repo.clone())
            .stop("http://media.example.com:8889/u1", "alice")
            .await
            .unwrap();

        assert!(repo.is_empty());
    }

    #[tokio::test]
    async fn test_stop_unknown_uuid_is_not_found_without_mutation() {
        let mut gateway = MockMediaGateway::new();
        gateway.expect_delete_path().never();

        let mut repo = MockStreamRepository::new();
        repo.expect_find().with(eq("missing")).returning(|_| Ok(None));
        repo.expect_delete().never();
        repo.expect_insert().never();

        let err = service(gateway, Arc::new(repo))
            .stop("http://media.example.com:8889/missing", "alice")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_stop_relay_failure_keeps_record() {
        let mut gateway = MockMediaGateway::new();
        gateway.expect_delete_path().times(1).returning(|_| {
            Err(GatewayError::RelayInternal {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: "boom".to_string(),
            })
        });

        let repo = Arc::new(MemoryStreamRepository::new());
        repo.insert(&Stream::with_uuid("cam1", "u1")).await.unwrap();

        let err = service(gateway, repo.clone())
            .stop("http://media.example.com:8889/u1", "alice")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::RelayInternal { status: 500, .. }));
        assert!(repo.contains("u1"));
    }

    #[tokio::test]
    async fn test_stop_relay_not_found_still_deletes_record() {
        let mut gateway = MockMediaGateway::new();
        gateway.expect_delete_path().times(1).returning(|_| {
            Err(GatewayError::NotFound {
                message: "path not found".to_string(),
            })
        });

        let repo = Arc::new(MemoryStreamRepository::new());
        repo.insert(&Stream::with_uuid("cam1", "u1")).await.unwrap();

        service(gateway, repo.clone())
            .stop("http://media.example.com:8889/u1", "alice")
            .await
            .unwrap();

        assert!(repo.is_empty());
    }

    #[tokio::test]
    async fn test_stop_rejects_malformed_url() {
        let gateway = MockMediaGateway::new();
        let mut repo = MockStreamRepository::new();
        repo.expect_find().never();

        let service = service(gateway, Arc::new(repo));
        for url in ["", "u1", "http://media.example.com:8889/"] {
            let err = service.stop(url, "alice").await.unwrap_err();
            assert!(matches!(err, Error::InvalidArgument(_)), "{url:?}");
        }
    }

    #[tokio::test]
    async fn test_custom_sub_path_resolver() {
        struct Prefixed;
        impl SubPathResolver for Prefixed {
            fn resolve(&self, stream_id: &str) -> String {
                format!("/cams/{stream_id}")
            }
        }

        let mut gateway = MockMediaGateway::new();
        gateway
            .expect_add_path()
            .withf(|_, source: &str| source == "rtsp://10.0.0.5:8554/live/cams/cam1")
            .times(1)
            .returning(|_, _| Ok(()));

        let service = service(gateway, Arc::new(MemoryStreamRepository::new()))
            .with_sub_path_resolver(Arc::new(Prefixed));
        service.start("cam1", "alice").await.unwrap();
    }
}
