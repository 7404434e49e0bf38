//! Bridge tools and the A2A server endpoint.
//!
//! Every tool is a JSON-in, JSON-out [`Tool`] registered in a
//! [`ToolRegistry`]. [`Toolbox`] bundles the eight built-in tools with the
//! runtime that drives them from synchronous host callbacks, and
//! [`A2aEndpoint`] exposes a host application as an A2A agent.

#![warn(missing_docs, clippy::pedantic)]

pub mod a2a_tools;
pub mod config_tools;
pub mod context;
pub mod endpoint;
pub mod mcp_tools;
mod params;
pub mod registry;
pub mod toolbox;

#[cfg(test)]
mod test_support;

pub use context::{BridgeContext, Collaborators};
pub use endpoint::{A2aEndpoint, AppError, AppInvoker, ChatReply, EndpointResponse};
pub use registry::{Tool, ToolError, ToolHandle, ToolMetadata, ToolParameter, ToolRegistry, ToolResult};
pub use toolbox::{Toolbox, register_all};
