//! Synchronous entry point for async bridge operations.

use std::future::Future;
use std::num::NonZeroUsize;

use agent_config::BridgeConfig;
use thiserror::Error;
use tokio::runtime::{Builder, Handle, Runtime};
use tracing::error;

use crate::scheduler::{SchedulerError, TaskScheduler};

/// Errors produced by [`CallExecutor`].
#[derive(Debug, Error)]
pub enum ExecutorError {
    /// `run_blocking` was called from inside an async runtime.
    #[error("run_blocking cannot be called from within an async runtime")]
    NestedRuntime,
    /// The concurrency limit must be at least one.
    #[error("max concurrent calls must be greater than zero")]
    InvalidConcurrency,
    /// The managed runtime could not be started.
    #[error("failed to start runtime: {0}")]
    Runtime(#[from] std::io::Error),
    /// The executor was closed.
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
    /// The task panicked or was aborted.
    #[error("call task failed: {reason}")]
    Join {
        /// Join failure description.
        reason: String,
    },
}

/// Result alias for executor operations.
pub type ExecutorResult<T> = Result<T, ExecutorError>;

/// Owns a multi-thread runtime and runs bridge calls to completion from sync code.
///
/// Each call is spawned as a task on the managed runtime and joined, so
/// concurrent callers share the runtime's worker threads and the limit set by
/// `max_concurrency`. Dropping the executor shuts the runtime down, which must
/// not happen inside another runtime.
#[derive(Debug)]
pub struct CallExecutor {
    runtime: Runtime,
    scheduler: TaskScheduler,
}

impl CallExecutor {
    /// Starts an executor allowing `max_concurrency` calls in flight.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutorError::InvalidConcurrency`] for a zero limit and
    /// [`ExecutorError::Runtime`] when the runtime cannot be built.
    pub fn new(max_concurrency: usize) -> ExecutorResult<Self> {
        let limit = NonZeroUsize::new(max_concurrency).ok_or(ExecutorError::InvalidConcurrency)?;
        let runtime = Builder::new_multi_thread()
            .enable_all()
            .thread_name("a2a-bridge-call")
            .build()?;
        Ok(Self {
            runtime,
            scheduler: TaskScheduler::new(limit),
        })
    }

    /// Starts an executor sized by `config.max_concurrent_calls`.
    ///
    /// # Errors
    ///
    /// See [`CallExecutor::new`].
    pub fn from_config(config: &BridgeConfig) -> ExecutorResult<Self> {
        Self::new(config.max_concurrent_calls)
    }

    /// Runs `future` on the managed runtime and blocks until it completes.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutorError::NestedRuntime`] when called from async code,
    /// [`ExecutorError::Scheduler`] once the executor is closed, and
    /// [`ExecutorError::Join`] when the task panics.
    pub fn run_blocking<F, T>(&self, future: F) -> ExecutorResult<T>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        if Handle::try_current().is_ok() {
            return Err(ExecutorError::NestedRuntime);
        }

        self.runtime.block_on(async {
            let handle = self.scheduler.spawn(future)?;
            match handle.await {
                Ok(output) => Ok(output?),
                Err(join) => {
                    error!(%join, "bridge call task failed");
                    Err(ExecutorError::Join {
                        reason: join.to_string(),
                    })
                }
            }
        })
    }

    /// Returns a handle for spawning work onto the managed runtime.
    #[must_use]
    pub fn handle(&self) -> &Handle {
        self.runtime.handle()
    }

    /// Rejects all further calls.
    pub fn close(&self) {
        self.scheduler.close();
    }
}
