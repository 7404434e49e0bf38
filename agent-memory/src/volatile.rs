//! In-process volatile key-value store.

use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::RwLock;

use crate::{KvStore, MemoryResult};

#[derive(Debug, Default)]
struct VolatileInner {
    entries: HashMap<String, Bytes>,
    total_bytes: usize,
}

/// [`KvStore`] kept in process memory; contents vanish with the process.
#[derive(Debug, Default)]
pub struct VolatileStore {
    inner: RwLock<VolatileInner>,
}

impl VolatileStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns statistics about the store utilisation.
    #[must_use]
    pub async fn stats(&self) -> VolatileStats {
        let guard = self.inner.read().await;
        VolatileStats {
            entries: guard.entries.len(),
            total_bytes: guard.total_bytes,
        }
    }
}

#[async_trait]
impl KvStore for VolatileStore {
    async fn get(&self, key: &str) -> MemoryResult<Option<Bytes>> {
        Ok(self.inner.read().await.entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Bytes) -> MemoryResult<()> {
        let mut guard = self.inner.write().await;
        guard.total_bytes += value.len();
        if let Some(previous) = guard.entries.insert(key.to_owned(), value) {
            guard.total_bytes = guard.total_bytes.saturating_sub(previous.len());
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> MemoryResult<()> {
        let mut guard = self.inner.write().await;
        if let Some(previous) = guard.entries.remove(key) {
            guard.total_bytes = guard.total_bytes.saturating_sub(previous.len());
        }
        Ok(())
    }
}

/// Snapshot describing utilisation of the volatile store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolatileStats {
    /// Keys currently stored.
    pub entries: usize,
    /// Accumulated value bytes currently retained.
    pub total_bytes: usize,
}
