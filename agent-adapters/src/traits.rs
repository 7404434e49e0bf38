//! Transport seams consumed by the resolution core, and the shared adapter error.

use std::pin::Pin;
use std::sync::Arc;

use agent_primitives::{AgentCard, McpProtocol, Message, Task, ToolDescriptor, UpdateEvent};
use async_trait::async_trait;
use futures::Stream;
use serde_json::{Map, Value};
use thiserror::Error;

/// Result alias used by transport adapters.
pub type AdapterResult<T> = Result<T, AdapterError>;

/// Stream of responses produced by [`AgentClient::send_message`].
pub type AgentResponseStream = Pin<Box<dyn Stream<Item = AdapterResult<AgentResponse>> + Send>>;

/// Status reported for network-level failures while fetching an Agent Card.
pub const SERVICE_UNAVAILABLE: u16 = 503;

/// Error type shared by adapter implementations.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// Adapter is misconfigured, e.g. an unparsable URL.
    #[error("adapter not configured: {reason}")]
    Configuration {
        /// Additional context for the failure.
        reason: String,
    },

    /// The remote answered with a non-success HTTP status, or could not be
    /// reached at all (reported as 503).
    #[error("http error {status} from {url}: {reason}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Requested URL.
        url: String,
        /// Additional context.
        reason: String,
    },

    /// The response body was not valid JSON or failed schema validation.
    #[error("failed to parse response from {url}: {reason}")]
    Parse {
        /// Requested URL.
        url: String,
        /// Parser or validation diagnostic.
        reason: String,
    },

    /// Transport-level failures (connection, TLS, body read).
    #[error("adapter transport error: {reason}")]
    Transport {
        /// Additional context about the error.
        reason: String,
    },

    /// The operation exceeded its deadline.
    #[error("{operation} timed out")]
    Timeout {
        /// Operation that timed out.
        operation: String,
    },

    /// The remote violated the expected protocol.
    #[error("protocol error: {reason}")]
    Protocol {
        /// Description of the violation.
        reason: String,
    },

    /// The remote returned a JSON-RPC error object.
    #[error("rpc error {code}: {message}")]
    Rpc {
        /// JSON-RPC error code.
        code: i64,
        /// JSON-RPC error message.
        message: String,
    },
}

impl AdapterError {
    /// Convenience constructor for configuration issues.
    #[must_use]
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }

    /// Convenience constructor for transport failures.
    #[must_use]
    pub fn transport(reason: impl Into<String>) -> Self {
        Self::Transport {
            reason: reason.into(),
        }
    }

    /// Convenience constructor for timeouts.
    #[must_use]
    pub fn timeout(operation: impl Into<String>) -> Self {
        Self::Timeout {
            operation: operation.into(),
        }
    }

    /// Convenience constructor for protocol violations.
    #[must_use]
    pub fn protocol(reason: impl Into<String>) -> Self {
        Self::Protocol {
            reason: reason.into(),
        }
    }

    /// Convenience constructor for parse failures.
    #[must_use]
    pub fn parse(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Parse {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Returns `true` when the remote could not be reached or did not answer in time.
    #[must_use]
    pub const fn is_network(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Timeout { .. })
    }
}

/// Fetches an Agent Card published at a URL.
#[async_trait]
pub trait AgentCardFetcher: Send + Sync {
    /// Fetches, parses, and validates the card.
    async fn fetch_card(&self, url: &str) -> AdapterResult<AgentCard>;
}

/// One item of an agent's response stream.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentResponse {
    /// The agent answered with a message.
    DirectMessage(Message),
    /// The agent answered with a task, optionally with the update that produced it.
    TaskUpdate {
        /// Current task snapshot.
        task: Task,
        /// Update event carried alongside the snapshot.
        update: Option<UpdateEvent>,
    },
}

/// Client bound to one remote agent.
#[async_trait]
pub trait AgentClient: Send + Sync {
    /// Sends a message and returns the stream of responses.
    async fn send_message(&self, message: Message) -> AdapterResult<AgentResponseStream>;
}

/// Creates [`AgentClient`]s from Agent Cards.
pub trait AgentClientFactory: Send + Sync {
    /// Creates a client speaking to `card.url`.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Configuration`] when the card url is unusable.
    fn create_client(&self, card: &AgentCard) -> AdapterResult<Arc<dyn AgentClient>>;
}

/// Open session with an MCP tool server.
#[async_trait]
pub trait McpSession: Send + Sync {
    /// Performs the protocol handshake.
    async fn initialize(&self) -> AdapterResult<()>;

    /// Lists every tool the server exposes.
    async fn list_tools(&self) -> AdapterResult<Vec<ToolDescriptor>>;

    /// Invokes a tool and returns the raw call result.
    async fn call_tool(&self, name: &str, arguments: Map<String, Value>) -> AdapterResult<Value>;
}

/// Opens MCP sessions over the transport named by the server's protocol.
#[async_trait]
pub trait McpTransport: Send + Sync {
    /// Opens a session against `url`.
    async fn open(&self, protocol: &McpProtocol, url: &str) -> AdapterResult<Box<dyn McpSession>>;
}
