//! Resolution core of the bridge.
//!
//! This crate turns agent and tool-server references into live endpoints: it
//! talks to the registry, caches and publishes Agent Cards, resolves MCP
//! servers with registry overrides, sends messages to agents, and runs all of
//! it from synchronous callers through a managed runtime.

#![warn(missing_docs, clippy::pedantic)]

mod error;
mod executor;
mod invoke;
mod mcp;
mod nacos;
mod registration;
mod registry;
mod registry_wire;
mod resolver;
mod scheduler;

#[cfg(test)]
mod test_support;

pub use error::{McpStage, ResolveError, ResolveResult};
pub use executor::{CallExecutor, ExecutorError, ExecutorResult};
pub use invoke::AgentInvoker;
pub use mcp::{McpToolResolver, ServerTools, overlay_registry_metadata};
pub use nacos::NacosConnector;
pub use registration::{AgentCardPublisher, needs_registration};
pub use registry::{
    RegistryConnector, RegistryError, RegistryResult, RegistrySession, RegistryTarget,
};
pub use resolver::{
    AgentBatchSpec, AgentReference, AgentResolver, BatchOutcome, DISCOVERY_REGISTRY, DISCOVERY_URL,
};
pub use scheduler::{DEFAULT_MAX_CONCURRENCY, SchedulerError, SchedulerResult, TaskScheduler};
