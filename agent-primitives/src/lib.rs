//! Core shared types for the A2A registry bridge.

#![warn(missing_docs, clippy::pedantic)]

mod addressing;
mod agent_card;
mod error;
mod mcp;
mod message;

/// Registry address canonicalization and endpoint URL derivation.
pub use addressing::{DEFAULT_REGISTRY_PORT, build_endpoint_url, normalize_registry_address};
/// Agent descriptor exchanged for discovery.
pub use agent_card::{AgentCapabilities, AgentCard, AgentCardBuilder, AgentProvider, AgentSkill};
/// Error type and result alias shared across the bridge.
pub use error::{Error, Result};
/// MCP server and tool models as published by the registry.
pub use mcp::{
    BackendEndpoint, McpProtocol, McpServerDetail, McpToolMeta, McpToolSpec, ServerPage,
    ServerSpec, ServerSummary, ToolDescriptor,
};
/// Agent-to-agent protocol message and task model.
pub use message::{
    Artifact, Message, Part, Role, Task, TaskArtifactUpdateEvent, TaskState, TaskStatus,
    TaskStatusUpdateEvent, UpdateEvent,
};
