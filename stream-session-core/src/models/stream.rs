use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A recorded stream session
///
/// `id` is the caller's logical stream name and may repeat across sessions.
/// `uuid` is minted on every start and keys the store record, the relay path
/// and the published URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Stream {
    pub id: String,
    pub uuid: String,
}

impl Stream {
    /// New session for `id` with a freshly generated token.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            uuid: Uuid::new_v4().to_string(),
        }
    }

    #[must_use]
    pub fn with_uuid(id: impl Into<String>, uuid: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            uuid: uuid.into(),
        }
    }
}
