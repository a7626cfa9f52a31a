use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::StreamRepository;
use crate::models::Stream;
use crate::Result;

/// Process-local record store
///
/// Used when no Redis URL is configured and as the store fake in tests.
#[derive(Debug, Default)]
pub struct MemoryStreamRepository {
    streams: RwLock<HashMap<String, Stream>>,
}

impl MemoryStreamRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.streams.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.streams.read().is_empty()
    }

    #[must_use]
    pub fn contains(&self, uuid: &str) -> bool {
        self.streams.read().contains_key(uuid)
    }
}

#[async_trait]
impl StreamRepository for MemoryStreamRepository {
    async fn list(&self) -> Result<Vec<Stream>> {
        Ok(self.streams.read().values().cloned().collect())
    }

    async fn find(&self, uuid: &str) -> Result<Option<Stream>> {
        Ok(self.streams.read().get(uuid).cloned())
    }

    async fn insert(&self, stream: &Stream) -> Result<()> {
        self.streams
            .write()
            .insert(stream.uuid.clone(), stream.clone());
        Ok(())
    }

    async fn delete(&self, uuid: &str) -> Result<()> {
        self.streams.write().remove(uuid);
        Ok(())
    }
}
