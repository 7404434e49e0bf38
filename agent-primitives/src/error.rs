//! Shared error definitions for bridge primitives.

use thiserror::Error;

/// Result alias used throughout the bridge.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or validating primitive types.
#[derive(Debug, Error)]
pub enum Error {
    /// Required configuration was missing or malformed.
    #[error("configuration error: {reason}")]
    Config {
        /// Human-readable reason for rejection.
        reason: String,
    },

    /// An agent card failed structural validation.
    #[error("invalid agent card: {reason}")]
    InvalidAgentCard {
        /// Validation diagnostic.
        reason: String,
    },

    /// JSON encoding or decoding failed.
    #[error("json error: {source}")]
    Json {
        /// Source error from `serde_json`.
        #[from]
        source: serde_json::Error,
    },
}

impl Error {
    /// Convenience constructor for configuration errors.
    #[must_use]
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }

    /// Convenience constructor for agent card validation errors.
    #[must_use]
    pub fn invalid_card(reason: impl Into<String>) -> Self {
        Self::InvalidAgentCard {
            reason: reason.into(),
        }
    }

    /// Returns `true` when the error is a configuration error.
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config { .. })
    }
}
