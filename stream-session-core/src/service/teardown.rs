use tracing::debug;

use crate::gateway::MediaGateway;
use crate::models::Stream;
use crate::repository::StreamRepository;
use crate::Result;

/// Remove a session from the relay, then drop its record.
///
/// A relay 404 means the path is already gone and counts as success. Any
/// other relay failure returns early and leaves the record in place.
pub async fn teardown(
    gateway: &dyn MediaGateway,
    repository: &dyn StreamRepository,
    stream: &Stream,
) -> Result<()> {
    match gateway.delete_path(&stream.uuid).await {
        Ok(()) => {}
        Err(e) if e.is_not_found() => {
            debug!(uuid = %stream.uuid, "Relay path already absent");
        }
        Err(e) => return Err(e.into()),
    }

    repository.delete(&stream.uuid).await
}
