//! Concurrency-limited task spawning for outbound calls.

use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::debug;

/// Calls allowed in flight when no limit is configured.
pub const DEFAULT_MAX_CONCURRENCY: NonZeroUsize = match NonZeroUsize::new(16) {
    Some(limit) => limit,
    None => NonZeroUsize::MIN,
};

/// Spawns bridge calls onto the current runtime, at most `limit` at a time.
///
/// Clones share the same permits.
#[derive(Debug, Clone)]
pub struct TaskScheduler {
    permits: Arc<Semaphore>,
    limit: NonZeroUsize,
}

impl TaskScheduler {
    /// Creates a scheduler admitting `limit` concurrent calls.
    #[must_use]
    pub fn new(limit: NonZeroUsize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(limit.get())),
            limit,
        }
    }

    /// Returns the concurrency limit.
    #[must_use]
    pub const fn limit(&self) -> NonZeroUsize {
        self.limit
    }

    /// Number of calls currently holding a permit.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.limit.get().saturating_sub(self.permits.available_permits())
    }

    /// Returns `true` once [`TaskScheduler::close`] has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.permits.is_closed()
    }

    /// Rejects new calls and fails those still waiting for a permit.
    ///
    /// Calls already running are left to finish.
    pub fn close(&self) {
        self.permits.close();
    }

    /// Spawns `future` once a permit is free.
    ///
    /// The returned task resolves to [`SchedulerError::Closed`] if the
    /// scheduler closes while the call is still queued.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::Closed`] when the scheduler is already closed.
    pub fn spawn<F, T>(&self, future: F) -> SchedulerResult<JoinHandle<SchedulerResult<T>>>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        if self.is_closed() {
            return Err(SchedulerError::Closed);
        }
        debug!(in_flight = self.in_flight(), limit = self.limit.get(), "queueing bridge call");

        let permits = Arc::clone(&self.permits);
        Ok(tokio::spawn(async move {
            let _permit = permits
                .acquire_owned()
                .await
                .map_err(|_| SchedulerError::Closed)?;
            Ok(future.await)
        }))
    }
}

impl Default for TaskScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONCURRENCY)
    }
}

/// Errors produced by the scheduler.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchedulerError {
    /// The scheduler no longer accepts calls.
    #[error("scheduler closed")]
    Closed,
}

/// Result alias for scheduler operations.
pub type SchedulerResult<T> = Result<T, SchedulerError>;
