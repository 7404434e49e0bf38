//! Errors produced while resolving agents and tool servers.

use std::fmt;

use agent_adapters::AdapterError;
use thiserror::Error;

use crate::registry::RegistryError;

/// Result alias for resolution operations.
pub type ResolveResult<T> = Result<T, ResolveError>;

/// Step of a single tool-server call at which a failure occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum McpStage {
    /// Parsing the `name::version` reference.
    ParseSpec,
    /// Fetching the server detail from the registry.
    FetchDetail,
    /// Checking the transport protocol.
    ValidateProtocol,
    /// Picking a backend endpoint.
    SelectEndpoint,
    /// Opening the transport session and handshaking.
    OpenSession,
    /// Listing or calling tools.
    ListOrCall,
    /// Applying registry overrides to the tool list.
    OverlayMetadata,
}

impl McpStage {
    /// Stable label for logs and error messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ParseSpec => "parse_spec",
            Self::FetchDetail => "fetch_detail",
            Self::ValidateProtocol => "validate_protocol",
            Self::SelectEndpoint => "select_endpoint",
            Self::OpenSession => "open_session",
            Self::ListOrCall => "list_or_call",
            Self::OverlayMetadata => "overlay_metadata",
        }
    }
}

impl fmt::Display for McpStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors surfaced by agent and tool-server resolution.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Missing or malformed caller input. Never retried.
    #[error("configuration error: {reason}")]
    Config {
        /// Description of the problem.
        reason: String,
    },
    /// Direct Agent Card fetch failed (HTTP status, parse, or network).
    #[error("failed to fetch agent card: {0}")]
    Fetch(#[source] AdapterError),
    /// The registry rejected or failed the lookup.
    #[error(transparent)]
    Backend(#[from] RegistryError),
    /// The tool server uses a transport the bridge cannot open.
    #[error("unsupported protocol for mcp server {server}: {reason}")]
    Protocol {
        /// Server reference as supplied.
        server: String,
        /// Description of the violation.
        reason: String,
    },
    /// A tool-server step after protocol validation failed.
    #[error("mcp {stage} failed: {reason}")]
    Transport {
        /// Step that failed.
        stage: McpStage,
        /// Underlying failure.
        reason: String,
    },
    /// Sending a message to a resolved agent failed.
    #[error("agent invocation failed: {0}")]
    Invocation(#[source] AdapterError),
    /// Registering an Agent Card failed.
    #[error("failed to register agent {agent}: {reason}")]
    Registration {
        /// Agent name.
        agent: String,
        /// Underlying failure.
        reason: String,
    },
}

impl ResolveError {
    /// Convenience constructor for configuration errors.
    #[must_use]
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }

    /// Convenience constructor for staged tool-server failures.
    #[must_use]
    pub fn transport(stage: McpStage, reason: impl Into<String>) -> Self {
        Self::Transport {
            stage,
            reason: reason.into(),
        }
    }

    /// Returns `true` for caller-input errors.
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config { .. })
    }
}

impl From<agent_primitives::Error> for ResolveError {
    fn from(err: agent_primitives::Error) -> Self {
        match err {
            agent_primitives::Error::Config { reason } => Self::Config { reason },
            other => Self::Config {
                reason: other.to_string(),
            },
        }
    }
}
