//! Error types for the storage subsystem.

use serde_json::Error as SerdeError;
use thiserror::Error;

/// Errors emitted by storage components.
#[derive(Debug, Error)]
pub enum MemoryError {
    /// The backing key-value store failed.
    #[error("storage error: {reason}")]
    Storage {
        /// Human-readable reason describing the failure.
        reason: String,
    },
    /// Serialization or deserialization error.
    #[error("serialization error: {source}")]
    Serialization {
        /// Source [`serde_json::Error`].
        #[from]
        source: SerdeError,
    },
    /// Stored value failed validation.
    #[error("invalid cache entry: {reason}")]
    InvalidEntry {
        /// Validation diagnostic.
        reason: String,
    },
}

impl MemoryError {
    /// Helper to construct storage errors from string-like values.
    #[must_use]
    pub fn storage(reason: impl Into<String>) -> Self {
        Self::Storage {
            reason: reason.into(),
        }
    }
}

/// Result type alias for storage operations.
pub type MemoryResult<T> = Result<T, MemoryError>;
