use std::sync::Arc;

use agent_config::{BridgeConfig, EndpointSettings, RegistryCredentials};
use agent_memory::KvStore;
use agent_tools::{
    A2aEndpoint, AppInvoker, BridgeContext, Collaborators, EndpointResponse, ToolMetadata,
    ToolResult, Toolbox,
};
use serde_json::Value;
use tracing::{info, warn};

/// One plugin installation: shared context plus the runtime driving it.
///
/// Every method blocks and must be called from synchronous host code.
#[derive(Debug)]
pub struct Bridge {
    ctx: Arc<BridgeContext>,
    toolbox: Toolbox,
}

impl Bridge {
    /// Wraps an assembled context.
    ///
    /// # Errors
    ///
    /// Returns [`agent_tools::ToolError::Execution`] when the runtime cannot be created.
    pub fn new(ctx: BridgeContext) -> ToolResult<Self> {
        let ctx = Arc::new(ctx);
        let toolbox = Toolbox::new(&ctx)?;
        Ok(Self { ctx, toolbox })
    }

    /// Builds a bridge from the host's credential map using the HTTP transports.
    ///
    /// # Errors
    ///
    /// Returns [`agent_tools::ToolError::InvalidParameters`] for malformed
    /// credentials or configuration.
    pub fn from_credentials(
        config: BridgeConfig,
        credentials: Value,
        store: Arc<dyn KvStore>,
    ) -> ToolResult<Self> {
        let credentials = RegistryCredentials::from_value(credentials)?;
        Self::new(BridgeContext::http(config, credentials, store)?)
    }

    /// Builds a bridge over explicit collaborators.
    ///
    /// # Errors
    ///
    /// See [`Bridge::new`].
    pub fn with_collaborators(
        config: BridgeConfig,
        credentials: RegistryCredentials,
        store: Arc<dyn KvStore>,
        collaborators: Collaborators,
    ) -> ToolResult<Self> {
        Self::new(BridgeContext::new(config, credentials, store, collaborators))
    }

    /// Returns the shared context.
    #[must_use]
    pub fn context(&self) -> &Arc<BridgeContext> {
        &self.ctx
    }

    /// Lists the exposed tools.
    #[must_use]
    pub fn tools(&self) -> Vec<ToolMetadata> {
        self.toolbox.list()
    }

    /// Invokes a tool by name.
    ///
    /// # Errors
    ///
    /// See [`Toolbox::invoke_blocking`].
    pub fn invoke(&self, tool: &str, params: Value) -> ToolResult<Value> {
        self.toolbox.invoke_blocking(tool, params)
    }

    /// Checks that the configured registry is reachable and accepts the credentials.
    ///
    /// # Errors
    ///
    /// Returns [`agent_tools::ToolError::InvalidParameters`] when no address is
    /// configured and [`agent_tools::ToolError::Execution`] when the probe fails.
    pub fn validate_credentials(&self) -> ToolResult<()> {
        let resolver = self.ctx.mcp(self.ctx.target(None)?);
        self.toolbox.run(async move {
            resolver.validate_credentials().await?;
            Ok(())
        })?;
        info!("registry credentials validated");
        Ok(())
    }

    /// Builds the A2A endpoint for a host application.
    ///
    /// With a registry address configured, the served card is also published
    /// to the default namespace.
    #[must_use]
    pub fn endpoint(&self, settings: EndpointSettings, app: Arc<dyn AppInvoker>) -> Arc<A2aEndpoint> {
        let endpoint = A2aEndpoint::new(settings, app, Arc::clone(self.ctx.store()));
        let endpoint = match self.ctx.target(None) {
            Ok(target) => endpoint.with_registration(self.ctx.publisher(), target),
            Err(err) => {
                warn!(%err, "agent card will not be published");
                endpoint
            }
        };
        Arc::new(endpoint)
    }

    /// Routes one HTTP request through `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns [`agent_tools::ToolError::Execution`] when the runtime rejects the call.
    pub fn handle_request(
        &self,
        endpoint: &Arc<A2aEndpoint>,
        method: &str,
        path: &str,
        body: Vec<u8>,
    ) -> ToolResult<EndpointResponse> {
        let endpoint = Arc::clone(endpoint);
        let method = method.to_owned();
        let path = path.to_owned();
        self.toolbox
            .run(async move { Ok(endpoint.handle(&method, &path, &body).await) })
    }

    /// Stops accepting new work.
    pub fn close(&self) {
        self.toolbox.close();
    }
}
