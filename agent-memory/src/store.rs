//! Key-value storage seam provided by the plugin host.

use async_trait::async_trait;
use bytes::Bytes;

use crate::MemoryResult;

/// Byte-valued key-value store with per-key atomic operations.
///
/// No transactions and no listing; concurrent writers to one key race and the
/// last write wins.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Returns the value stored under `key`, if any.
    async fn get(&self, key: &str) -> MemoryResult<Option<Bytes>>;

    /// Stores `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: Bytes) -> MemoryResult<()>;

    /// Removes `key`. Removing an absent key succeeds.
    async fn delete(&self, key: &str) -> MemoryResult<()>;
}
