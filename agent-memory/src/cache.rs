//! Read-through Agent Card cache with a fixed time-to-live.
//!
//! Entries live in the external [`KvStore`] as JSON
//! `{ "cached_time": <epoch seconds>, "agent_card": { .. } }`. Expiry is
//! checked lazily on read; there is no eviction and no negative caching. Any
//! storage or decoding failure degrades to a miss, and a failed refresh yields
//! `None` rather than an error.

use std::fmt::Display;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use agent_primitives::AgentCard;
use bytes::Bytes;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{KvStore, MemoryError, MemoryResult};

const KEY_PREFIX: &str = "agentcard";

/// Source of the current wall-clock time in fractional epoch seconds.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> f64;
}

/// [`Clock`] backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[allow(clippy::cast_precision_loss)]
    fn now(&self) -> f64 {
        Utc::now().timestamp_micros() as f64 / 1_000_000.0
    }
}

/// Manually advanced [`Clock`] for deterministic expiry.
#[derive(Debug, Default)]
pub struct ManualClock {
    micros: AtomicU64,
}

impl ManualClock {
    /// Creates a clock frozen at `start_secs`.
    #[must_use]
    pub fn new(start_secs: u64) -> Self {
        Self {
            micros: AtomicU64::new(start_secs.saturating_mul(1_000_000)),
        }
    }

    /// Moves the clock forward.
    pub fn advance(&self, by: Duration) {
        let micros = u64::try_from(by.as_micros()).unwrap_or(u64::MAX);
        self.micros.fetch_add(micros, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    #[allow(clippy::cast_precision_loss)]
    fn now(&self) -> f64 {
        self.micros.load(Ordering::SeqCst) as f64 / 1_000_000.0
    }
}

/// Identity of a cached card: registry, namespace, agent name, and version.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    registry_address: String,
    namespace_id: String,
    agent_name: String,
    version: String,
}

impl CacheKey {
    /// Creates a key from its four components.
    #[must_use]
    pub fn new(
        registry_address: impl Into<String>,
        namespace_id: impl Into<String>,
        agent_name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            registry_address: registry_address.into(),
            namespace_id: namespace_id.into(),
            agent_name: agent_name.into(),
            version: version.into(),
        }
    }

    /// Creates the key under which `card` is stored.
    #[must_use]
    pub fn for_card(
        registry_address: impl Into<String>,
        namespace_id: impl Into<String>,
        card: &AgentCard,
    ) -> Self {
        Self::new(registry_address, namespace_id, &card.name, &card.version)
    }

    /// Returns the agent name component.
    #[must_use]
    pub fn agent_name(&self) -> &str {
        &self.agent_name
    }

    /// Returns the version component.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Returns the flat storage key.
    ///
    /// `:` and `/` in the registry address become `_` so the address forms a
    /// single key segment.
    #[must_use]
    pub fn storage_key(&self) -> String {
        let address = self.registry_address.replace([':', '/'], "_");
        format!(
            "{KEY_PREFIX}:{address}:{}:{}:{}",
            self.namespace_id, self.agent_name, self.version
        )
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    cached_time: f64,
    agent_card: AgentCard,
}

enum Lookup {
    Hit(AgentCard),
    Expired,
    Miss,
}

/// Read-through TTL cache for Agent Cards.
pub struct AgentCardCache {
    store: Arc<dyn KvStore>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl std::fmt::Debug for AgentCardCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentCardCache")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl AgentCardCache {
    /// Creates a cache over `store` using the system clock.
    #[must_use]
    pub fn new(store: Arc<dyn KvStore>, ttl: Duration) -> Self {
        Self::with_clock(store, ttl, Arc::new(SystemClock))
    }

    /// Creates a cache with an explicit clock.
    #[must_use]
    pub fn with_clock(store: Arc<dyn KvStore>, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock, ttl }
    }

    /// Returns the fresh cached card for `key`, or fetches and stores a new one.
    ///
    /// An entry is fresh while `now - cached_time <= ttl`. Storage and decoding
    /// failures are treated as a miss. A failed fetch returns `None` and is not
    /// cached, so the next call retries. A failed write after a successful
    /// fetch is logged and the fetched card is still returned.
    pub async fn get_or_fetch<F, Fut, E>(&self, key: &CacheKey, fetch: F) -> Option<AgentCard>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<AgentCard, E>> + Send,
        E: Display,
    {
        let agent_name = key.agent_name();
        match self.lookup(key).await {
            Ok(Lookup::Hit(card)) => {
                debug!(%agent_name, "agent card cache hit");
                return Some(card);
            }
            Ok(Lookup::Expired) => debug!(%agent_name, "agent card cache expired"),
            Ok(Lookup::Miss) => debug!(%agent_name, "agent card cache miss"),
            Err(err) => warn!(%agent_name, %err, "agent card cache unreadable, refetching"),
        }

        let card = match fetch().await {
            Ok(card) => card,
            Err(err) => {
                warn!(%agent_name, %err, "agent card refresh failed");
                return None;
            }
        };

        if let Err(err) = self.write(key, &card).await {
            warn!(%agent_name, %err, "failed to store refreshed agent card");
        } else {
            debug!(%agent_name, "agent card cache refreshed");
        }
        Some(card)
    }

    /// Stores `card` under the key derived from its own name and version.
    ///
    /// Returns `false` when the write failed; the failure is logged.
    pub async fn set_cached_agent_card(
        &self,
        registry_address: &str,
        namespace_id: &str,
        card: &AgentCard,
    ) -> bool {
        let key = CacheKey::for_card(registry_address, namespace_id, card);
        match self.write(&key, card).await {
            Ok(()) => {
                debug!(agent_name = %card.name, "agent card cached");
                true
            }
            Err(err) => {
                warn!(agent_name = %card.name, %err, "failed to cache agent card");
                false
            }
        }
    }

    async fn lookup(&self, key: &CacheKey) -> MemoryResult<Lookup> {
        let Some(raw) = self.store.get(&key.storage_key()).await? else {
            return Ok(Lookup::Miss);
        };
        if raw.is_empty() {
            return Ok(Lookup::Miss);
        }

        let entry: CacheEntry = serde_json::from_slice(&raw)?;
        if self.clock.now() - entry.cached_time > self.ttl.as_secs_f64() {
            return Ok(Lookup::Expired);
        }
        entry
            .agent_card
            .validate()
            .map_err(|err| MemoryError::InvalidEntry {
                reason: err.to_string(),
            })?;
        Ok(Lookup::Hit(entry.agent_card))
    }

    async fn write(&self, key: &CacheKey, card: &AgentCard) -> MemoryResult<()> {
        let entry = CacheEntry {
            cached_time: self.clock.now(),
            agent_card: card.clone(),
        };
        let bytes = serde_json::to_vec(&entry)?;
        self.store.set(&key.storage_key(), Bytes::from(bytes)).await
    }
}
