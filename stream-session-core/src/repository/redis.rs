use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;

use ::redis::aio::ConnectionManager;
use ::redis::RedisResult;
use async_trait::async_trait;
use tokio::time::timeout;
use tracing::{debug, warn};

use super::StreamRepository;
use crate::models::Stream;
use crate::{Error, Result};

/// Keys scanned per SCAN round trip
const SCAN_COUNT: usize = 100;

/// Redis-backed record store
///
/// Records are JSON `{"id", "uuid"}` values under `{key_prefix}{uuid}`, with no TTL.
#[derive(Clone)]
pub struct RedisStreamRepository {
    redis: ConnectionManager,
    key_prefix: String,
    operation_timeout: Duration,
}

impl RedisStreamRepository {
    #[must_use]
    pub fn new(
        redis: ConnectionManager,
        key_prefix: impl Into<String>,
        operation_timeout: Duration,
    ) -> Self {
        Self {
            redis,
            key_prefix: key_prefix.into(),
            operation_timeout,
        }
    }

    fn key(&self, uuid: &str) -> String {
        format!("{}{uuid}", self.key_prefix)
    }

    /// Run one Redis round trip under the operation timeout.
    async fn bounded<T>(
        &self,
        op: &'static str,
        fut: impl Future<Output = RedisResult<T>> + Send,
    ) -> Result<T> {
        timeout(self.operation_timeout, fut)
            .await
            .map_err(|_| Error::Store(format!("Redis {op} timed out")))?
            .map_err(Error::from)
    }

    async fn scan_keys(&self) -> Result<Vec<String>> {
        let mut conn = self.redis.clone();
        let pattern = format!("{}*", self.key_prefix);
        let mut seen = HashSet::new();
        let mut keys = Vec::new();
        let mut cursor: u64 = 0;

        loop {
            let (next, batch): (u64, Vec<String>) = self
                .bounded(
                    "SCAN",
                    ::redis::cmd("SCAN")
                        .arg(cursor)
                        .arg("MATCH")
                        .arg(&pattern)
                        .arg("COUNT")
                        .arg(SCAN_COUNT)
                        .query_async(&mut conn),
                )
                .await?;

            // SCAN may return a key more than once
            for key in batch {
                if seen.insert(key.clone()) {
                    keys.push(key);
                }
            }

            cursor = next;
            if cursor == 0 {
                break;
            }
        }

        Ok(keys)
    }
}

/// Decode the record stored under `key`.
///
/// Unreadable values and records whose uuid is not the one in their key are
/// treated as absent. Deleting by the stored uuid would miss such a record,
/// so it is never handed to callers.
fn decode_record(key_prefix: &str, key: &str, value: &str) -> Option<Stream> {
    let stream: Stream = match serde_json::from_str(value) {
        Ok(stream) => stream,
        Err(e) => {
            warn!(key = %key, error = %e, "Skipping unreadable stream record");
            return None;
        }
    };

    if key.strip_prefix(key_prefix) != Some(stream.uuid.as_str()) {
        warn!(key = %key, stored = %stream.uuid, "Stream record keyed under a different uuid");
        return None;
    }

    Some(stream)
}

#[async_trait]
impl StreamRepository for RedisStreamRepository {
    async fn list(&self) -> Result<Vec<Stream>> {
        let keys = self.scan_keys().await?;
        let mut conn = self.redis.clone();
        let mut streams = Vec::with_capacity(keys.len());

        for key in keys {
            let value: Option<String> = self
                .bounded("GET", ::redis::cmd("GET").arg(&key).query_async(&mut conn))
                .await?;

            // Deleted between SCAN and GET
            let Some(value) = value else {
                continue;
            };

            if let Some(stream) = decode_record(&self.key_prefix, &key, &value) {
                streams.push(stream);
            }
        }

        debug!(count = streams.len(), "Listed stream records");
        Ok(streams)
    }

    async fn find(&self, uuid: &str) -> Result<Option<Stream>> {
        let mut conn = self.redis.clone();
        let key = self.key(uuid);
        let value: Option<String> = self
            .bounded("GET", ::redis::cmd("GET").arg(&key).query_async(&mut conn))
            .await?;

        Ok(value.and_then(|value| decode_record(&self.key_prefix, &key, &value)))
    }

    async fn insert(&self, stream: &Stream) -> Result<()> {
        let mut conn = self.redis.clone();
        let value = serde_json::to_string(stream)?;

        let _: () = self
            .bounded(
                "SET",
                ::redis::cmd("SET")
                    .arg(self.key(&stream.uuid))
                    .arg(value)
                    .query_async(&mut conn),
            )
            .await?;

        Ok(())
    }

    async fn delete(&self, uuid: &str) -> Result<()> {
        let mut conn = self.redis.clone();
        let _: i64 = self
            .bounded(
                "DEL",
                ::redis::cmd("DEL").arg(self.key(uuid)).query_async(&mut conn),
            )
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREFIX: &str = "log:stream:";

    #[test]
    fn test_decode_record_accepts_matching_key() {
        let stream = decode_record(PREFIX, "log:stream:u1", r#"{"id":"cam1","uuid":"u1"}"#);
        assert_eq!(stream, Some(Stream::with_uuid("cam1", "u1")));
    }

    #[test]
    fn test_decode_record_treats_unreadable_value_as_absent() {
        assert_eq!(decode_record(PREFIX, "log:stream:u1", "not json"), None);
        assert_eq!(decode_record(PREFIX, "log:stream:u1", r#"{"id":"cam1"}"#), None);
    }

    #[test]
    fn test_decode_record_skips_uuid_not_matching_key() {
        assert_eq!(
            decode_record(PREFIX, "log:stream:u1", r#"{"id":"cam1","uuid":"u2"}"#),
            None
        );
        assert_eq!(
            decode_record(PREFIX, "other:u1", r#"{"id":"cam1","uuid":"u1"}"#),
            None
        );
    }

    async fn repository(prefix: &str) -> RedisStreamRepository {
        let client = ::redis::Client::open("redis://127.0.0.1:6379/15").unwrap();
        let conn = ConnectionManager::new(client).await.unwrap();
        RedisStreamRepository::new(conn, prefix, Duration::from_secs(5))
    }

    #[tokio::test]
    #[ignore = "Requires Redis server"]
    async fn test_insert_find_delete() {
        let repo = repository("test:stream:crud:").await;
        let stream = Stream::new("cam1");

        repo.insert(&stream).await.unwrap();
        assert_eq!(repo.find(&stream.uuid).await.unwrap(), Some(stream.clone()));

        repo.delete(&stream.uuid).await.unwrap();
        assert!(repo.find(&stream.uuid).await.unwrap().is_none());

        // deleting again is not an error
        repo.delete(&stream.uuid).await.unwrap();
    }

    #[tokio::test]
    #[ignore = "Requires Redis server"]
    async fn test_list_skips_corrupt_records() {
        let repo = repository("test:stream:list:").await;
        let a = Stream::new("a");
        let b = Stream::new("b");
        repo.insert(&a).await.unwrap();
        repo.insert(&b).await.unwrap();

        let mut conn = repo.redis.clone();
        let _: () = ::redis::cmd("SET")
            .arg("test:stream:list:garbage")
            .arg("not json")
            .query_async(&mut conn)
            .await
            .unwrap();

        let mut listed: Vec<_> = repo.list().await.unwrap().into_iter().map(|s| s.id).collect();
        listed.sort();
        assert_eq!(listed, vec!["a", "b"]);

        repo.delete(&a.uuid).await.unwrap();
        repo.delete(&b.uuid).await.unwrap();
        repo.delete("garbage").await.unwrap();
    }

    #[tokio::test]
    #[ignore = "Requires Redis server"]
    async fn test_find_rejects_mismatched_uuid() {
        let repo = repository("test:stream:mismatch:").await;
        let mut conn = repo.redis.clone();
        let _: () = ::redis::cmd("SET")
            .arg("test:stream:mismatch:u1")
            .arg(r#"{"id":"cam1","uuid":"u2"}"#)
            .query_async(&mut conn)
            .await
            .unwrap();

        assert!(repo.find("u1").await.unwrap().is_none());
        assert!(repo.list().await.unwrap().is_empty());
        repo.delete("u1").await.unwrap();
    }

    #[tokio::test]
    #[ignore = "Requires Redis server"]
    async fn test_find_treats_corrupt_record_as_absent() {
        let repo = repository("test:stream:corrupt:").await;
        let mut conn = repo.redis.clone();
        let _: () = ::redis::cmd("SET")
            .arg("test:stream:corrupt:u1")
            .arg("not json")
            .query_async(&mut conn)
            .await
            .unwrap();

        assert!(repo.find("u1").await.unwrap().is_none());
        repo.delete("u1").await.unwrap();
    }
}
