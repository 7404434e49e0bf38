//! Storage-backed state for the bridge.
//!
//! Everything here sits on the [`KvStore`] seam: the Agent Card read-through
//! cache and the A2A context to host conversation mapping. [`VolatileStore`]
//! provides an in-process implementation for tests and single-process hosts.

#![warn(missing_docs, clippy::pedantic)]

pub mod cache;
pub mod conversation;
mod error;
pub mod store;
pub mod volatile;

pub use cache::{AgentCardCache, CacheKey, Clock, ManualClock, SystemClock};
pub use conversation::ConversationStore;
pub use error::{MemoryError, MemoryResult};
pub use store::KvStore;
pub use volatile::{VolatileStats, VolatileStore};
