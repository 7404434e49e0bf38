//! The bridge's built-in tools behind a synchronous entry point.

use std::sync::Arc;

use agent_kernel::CallExecutor;
use serde_json::Value;
use tracing::debug;

use crate::a2a_tools::{CallAgent, GetAgentInformation, GetAgentsInformation};
use crate::config_tools::{PublishConfig, ReadConfig};
use crate::context::BridgeContext;
use crate::mcp_tools::{CallServerTool, ListServerTools, ListServers};
use crate::registry::{ToolError, ToolMetadata, ToolRegistry, ToolResult};

/// Registers all eight built-in tools against `ctx`.
///
/// # Errors
///
/// Returns [`ToolError::DuplicateTool`] if `registry` already holds one of them.
pub fn register_all(registry: &ToolRegistry, ctx: &Arc<BridgeContext>) -> ToolResult<()> {
    registry.register_tool(GetAgentInformation::metadata()?, GetAgentInformation::new(Arc::clone(ctx)))?;
    registry.register_tool(GetAgentsInformation::metadata()?, GetAgentsInformation::new(Arc::clone(ctx)))?;
    registry.register_tool(CallAgent::metadata()?, CallAgent::new(Arc::clone(ctx)))?;
    registry.register_tool(ListServers::metadata()?, ListServers::new(Arc::clone(ctx)))?;
    registry.register_tool(ListServerTools::metadata()?, ListServerTools::new(Arc::clone(ctx)))?;
    registry.register_tool(CallServerTool::metadata()?, CallServerTool::new(Arc::clone(ctx)))?;
    registry.register_tool(ReadConfig::metadata()?, ReadConfig::new(Arc::clone(ctx)))?;
    registry.register_tool(PublishConfig::metadata()?, PublishConfig::new(Arc::clone(ctx)))?;
    Ok(())
}

/// Tool registry paired with the runtime that drives invocations from
/// synchronous host callbacks.
#[derive(Debug)]
pub struct Toolbox {
    registry: ToolRegistry,
    executor: CallExecutor,
}

impl Toolbox {
    /// Builds a toolbox with every built-in tool, sized from the context's configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::Execution`] when the runtime cannot be created.
    pub fn new(ctx: &Arc<BridgeContext>) -> ToolResult<Self> {
        let executor = CallExecutor::from_config(ctx.config())
            .map_err(|err| ToolError::execution(err.to_string()))?;
        let registry = ToolRegistry::new();
        register_all(&registry, ctx)?;
        Ok(Self { registry, executor })
    }

    /// Returns the underlying registry.
    #[must_use]
    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Lists the registered tools.
    #[must_use]
    pub fn list(&self) -> Vec<ToolMetadata> {
        self.registry.list()
    }

    /// Invokes `name` and blocks until it completes.
    ///
    /// Must not be called from inside an async runtime.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::UnknownTool`] for unregistered names, the tool's
    /// own error, or [`ToolError::Execution`] when the runtime rejects the call.
    pub fn invoke_blocking(&self, name: &str, input: Value) -> ToolResult<Value> {
        let handle = self.registry.get(name).ok_or_else(|| ToolError::UnknownTool {
            name: name.to_owned(),
        })?;
        debug!(tool = name, "blocking tool invocation");
        self.run(async move { handle.invoke(input).await })
    }

    /// Drives `future` on the toolbox runtime and blocks until it completes.
    ///
    /// # Errors
    ///
    /// Returns the future's own error, or [`ToolError::Execution`] when the
    /// runtime rejects the call.
    pub fn run<F, T>(&self, future: F) -> ToolResult<T>
    where
        F: Future<Output = ToolResult<T>> + Send + 'static,
        T: Send + 'static,
    {
        self.executor
            .run_blocking(future)
            .map_err(|err| ToolError::execution(err.to_string()))?
    }

    /// Stops accepting new invocations.
    pub fn close(&self) {
        self.executor.close();
    }
}
