/// Maps a logical stream id to the relay's RTSP sub-path
///
/// The returned sub-path is appended to `relay.rtsp.path` when building the
/// ingest source URL and must start with `/`.
pub trait SubPathResolver: Send + Sync {
    fn resolve(&self, stream_id: &str) -> String;
}

/// Publishes each stream under its own id (`cam1` -> `/cam1`).
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentitySubPath;

impl SubPathResolver for IdentitySubPath {
    fn resolve(&self, stream_id: &str) -> String {
        format!("/{stream_id}")
    }
}
