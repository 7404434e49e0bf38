//! Outbound transports used by the bridge.
//!
//! Each module implements one collaborator seam from [`traits`] on top of the
//! shared [`HttpClient`]: direct Agent Card retrieval, the agent-to-agent
//! JSON-RPC client, and MCP sessions over streamable HTTP or SSE.

#![warn(missing_docs, clippy::pedantic)]

pub mod a2a;
pub mod card_fetch;
pub mod http_client;
pub mod jsonrpc;
pub mod mcp;
pub mod sse;
pub mod traits;

#[cfg(test)]
mod test_support;

pub use a2a::JsonRpcAgentClientFactory;
pub use card_fetch::HttpAgentCardFetcher;
pub use http_client::{HttpClient, HttpResponse};
pub use mcp::HttpMcpTransport;
pub use traits::{
    AdapterError, AdapterResult, AgentCardFetcher, AgentClient, AgentClientFactory,
    AgentResponse, AgentResponseStream, McpSession, McpTransport,
};
