//! Session record store
//!
//! One record per live session, keyed by its `uuid`. Only single-key
//! atomicity is assumed from the backing store.

pub mod memory;
pub mod redis;

use async_trait::async_trait;

use crate::models::Stream;
use crate::Result;

pub use memory::MemoryStreamRepository;
pub use self::redis::RedisStreamRepository;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StreamRepository: Send + Sync {
    /// Every recorded session, in no particular order.
    async fn list(&self) -> Result<Vec<Stream>>;

    /// Look up the record for `uuid`; `None` when absent.
    async fn find(&self, uuid: &str) -> Result<Option<Stream>>;

    /// Create or overwrite the record keyed by `stream.uuid`.
    async fn insert(&self, stream: &Stream) -> Result<()>;

    /// Remove the record for `uuid`. Removing an absent record succeeds.
    async fn delete(&self, uuid: &str) -> Result<()>;
}
