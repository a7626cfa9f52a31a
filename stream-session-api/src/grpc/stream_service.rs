use std::sync::Arc;

use tonic::{Request, Response, Status};

use super::proto::stream_service_server::StreamService;
use super::proto::{StartStreamRequest, StartStreamResponse, StopStreamRequest};
use stream_session_core::service::StreamSessionService;

/// `StreamService` gRPC implementation
#[derive(Clone)]
pub struct StreamServiceImpl {
    sessions: Arc<StreamSessionService>,
}

impl StreamServiceImpl {
    #[must_use]
    pub const fn new(sessions: Arc<StreamSessionService>) -> Self {
        Self { sessions }
    }
}

/// Peer address for logs, `-` when the transport does not expose one.
fn peer_of<T>(request: &Request<T>) -> String {
    request
        .remote_addr()
        .map_or_else(|| "-".to_string(), |addr| addr.to_string())
}

#[tonic::async_trait]
impl StreamService for StreamServiceImpl {
    async fn start_stream(
        &self,
        request: Request<StartStreamRequest>,
    ) -> Result<Response<StartStreamResponse>, Status> {
        let peer = peer_of(&request);
        let req = request.into_inner();

        tracing::info!(
            stream_id = %req.stream_id,
            caller = %req.username,
            peer = %peer,
            "StartStream"
        );

        let started = self.sessions.start(&req.stream_id, &req.username).await?;

        Ok(Response::new(StartStreamResponse {
            stream_url: started.url,
        }))
    }

    async fn stop_stream(
        &self,
        request: Request<StopStreamRequest>,
    ) -> Result<Response<()>, Status> {
        let peer = peer_of(&request);
        let req = request.into_inner();

        tracing::info!(
            stream_url = %req.stream_url,
            caller = %req.username,
            peer = %peer,
            "StopStream"
        );

        self.sessions.stop(&req.stream_url, &req.username).await?;

        Ok(Response::new(()))
    }
}
