pub mod stream_service;

pub use stream_session_proto::stream as proto;
pub use stream_service::StreamServiceImpl;

use std::sync::Arc;

use proto::stream_service_server::StreamServiceServer;
use stream_session_core::service::StreamSessionService;
use stream_session_core::Config;
use tokio_util::sync::CancellationToken;
use tonic::transport::Server;
use tonic_reflection::server::Builder as ReflectionBuilder;

/// Build and start the gRPC server
///
/// Serves until `shutdown` is cancelled. In-flight calls are not drained.
pub async fn serve(
    config: &Config,
    sessions: Arc<StreamSessionService>,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let addr = config.grpc_address().parse()?;

    tracing::info!("Starting gRPC server on {}", addr);

    let (health_reporter, health_service) = tonic_health::server::health_reporter();
    health_reporter
        .set_serving::<StreamServiceServer<StreamServiceImpl>>()
        .await;

    // Add reflection if enabled
    let reflection_service = if config.server.enable_reflection {
        let reflection = ReflectionBuilder::configure()
            .register_encoded_file_descriptor_set(stream_session_proto::FILE_DESCRIPTOR_SET)
            .build_v1()
            .map_err(|e| anyhow::anyhow!("Failed to build reflection service: {}", e))?;

        tracing::info!("gRPC reflection enabled");
        Some(reflection)
    } else {
        None
    };

    let mut router = Server::builder()
        .add_service(health_service)
        .add_service(StreamServiceServer::new(StreamServiceImpl::new(sessions)));

    if let Some(reflection) = reflection_service {
        router = router.add_service(reflection);
    }

    router
        .serve_with_shutdown(addr, shutdown.cancelled_owned())
        .await
        .map_err(|e| anyhow::anyhow!("gRPC server error: {}", e))?;

    tracing::info!("gRPC server stopped");
    Ok(())
}
