//! Mapping from A2A context ids to host conversation ids.

use std::sync::Arc;

use bytes::Bytes;
use tracing::warn;

use crate::{KvStore, MemoryResult};

/// Persists which host conversation an A2A context belongs to.
///
/// Keys are `conv:{app_id}:{context_id}`; values are the UTF-8 conversation id.
/// Writes are last-write-wins.
#[derive(Clone)]
pub struct ConversationStore {
    store: Arc<dyn KvStore>,
    app_id: String,
}

impl std::fmt::Debug for ConversationStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationStore")
            .field("app_id", &self.app_id)
            .finish_non_exhaustive()
    }
}

impl ConversationStore {
    /// Creates a store scoped to one host application.
    #[must_use]
    pub fn new(store: Arc<dyn KvStore>, app_id: impl Into<String>) -> Self {
        Self {
            store,
            app_id: app_id.into(),
        }
    }

    fn key(&self, context_id: &str) -> String {
        format!("conv:{}:{context_id}", self.app_id)
    }

    /// Returns the conversation mapped to `context_id`.
    ///
    /// Absent, empty, undecodable, and unreadable values all yield `None`.
    pub async fn get(&self, context_id: &str) -> Option<String> {
        if context_id.is_empty() {
            return None;
        }
        match self.read(context_id).await {
            Ok(value) => value.filter(|id| !id.is_empty()),
            Err(err) => {
                warn!(%context_id, %err, "failed to read conversation mapping");
                None
            }
        }
    }

    async fn read(&self, context_id: &str) -> MemoryResult<Option<String>> {
        let raw = self.store.get(&self.key(context_id)).await?;
        Ok(raw.map(|bytes| String::from_utf8_lossy(&bytes).into_owned()))
    }

    /// Maps `context_id` to `conversation_id`.
    ///
    /// Returns `false` without touching storage when either id is empty, and
    /// when the write fails.
    pub async fn save(&self, context_id: &str, conversation_id: &str) -> bool {
        if context_id.is_empty() || conversation_id.is_empty() {
            return false;
        }
        let value = Bytes::copy_from_slice(conversation_id.as_bytes());
        match self.store.set(&self.key(context_id), value).await {
            Ok(()) => true,
            Err(err) => {
                warn!(%context_id, %err, "failed to save conversation mapping");
                false
            }
        }
    }

    /// Removes the mapping for `context_id`.
    pub async fn delete(&self, context_id: &str) -> bool {
        if context_id.is_empty() {
            return false;
        }
        match self.store.delete(&self.key(context_id)).await {
            Ok(()) => true,
            Err(err) => {
                warn!(%context_id, %err, "failed to delete conversation mapping");
                false
            }
        }
    }
}
