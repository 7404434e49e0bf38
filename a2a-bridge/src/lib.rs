//! Registry bridge for A2A agents and MCP tool servers.
//!
//! Depend on this crate via `cargo add a2a-bridge`. It re-exports the
//! workspace crates and adds [`Bridge`], the single entry point a plugin host
//! drives: tool invocations, credential validation, and the A2A endpoint.

#![warn(missing_docs, clippy::pedantic)]

mod bridge;

pub use bridge::Bridge;

/// Agent Card, message, and tool-server model.
pub use agent_primitives as primitives;

/// Tunables, registry credentials, and endpoint settings.
pub use agent_config as config;

/// Registry client, resolvers, invocation, and the call executor.
pub use agent_kernel as kernel;

/// Key-value storage, card cache, and conversation mapping.
pub use agent_memory as memory;

/// Tool registry, built-in tools, and the A2A endpoint.
pub use agent_tools as tools;

/// Outbound HTTP transports (enabled by `adapters` feature).
#[cfg(feature = "adapters")]
pub use agent_adapters as adapters;

/// Subscriber setup and structured events (enabled by `telemetry` feature).
#[cfg(feature = "telemetry")]
pub use agent_telemetry as telemetry;
