//! Shared collaborators handed to every tool.

use std::sync::Arc;

use agent_adapters::{
    AgentCardFetcher, AgentClientFactory, HttpAgentCardFetcher, HttpClient, HttpMcpTransport,
    JsonRpcAgentClientFactory, McpTransport,
};
use agent_config::{BridgeConfig, RegistryCredentials};
use agent_kernel::{
    AgentCardPublisher, AgentInvoker, AgentResolver, McpToolResolver, NacosConnector,
    RegistryConnector, RegistryTarget,
};
use agent_memory::{AgentCardCache, KvStore};

use crate::registry::{ToolError, ToolResult};

/// Outbound seams used by the tools.
#[derive(Clone)]
pub struct Collaborators {
    /// Registry connections.
    pub connector: Arc<dyn RegistryConnector>,
    /// Direct Agent Card retrieval.
    pub fetcher: Arc<dyn AgentCardFetcher>,
    /// Agent-to-agent clients.
    pub clients: Arc<dyn AgentClientFactory>,
    /// MCP sessions.
    pub transport: Arc<dyn McpTransport>,
}

impl Collaborators {
    /// Builds the HTTP implementations of every seam, sharing one client.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::InvalidParameters`] when the configured user agent
    /// is not a valid header value.
    pub fn http(config: &BridgeConfig) -> ToolResult<Self> {
        let client = HttpClient::new(&config.http_user_agent)
            .map_err(|err| ToolError::invalid(err.to_string()))?;
        Ok(Self {
            connector: Arc::new(NacosConnector::new(client.clone(), config.registry_timeout())),
            fetcher: Arc::new(HttpAgentCardFetcher::new(
                client.clone(),
                config.card_fetch_timeout(),
            )),
            clients: Arc::new(JsonRpcAgentClientFactory::new(
                client.clone(),
                config.agent_call_timeout(),
            )),
            transport: Arc::new(HttpMcpTransport::new(client, config.mcp_timeout())),
        })
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}

/// Configuration, credentials, storage, and collaborators of one plugin installation.
pub struct BridgeContext {
    config: BridgeConfig,
    credentials: RegistryCredentials,
    store: Arc<dyn KvStore>,
    collaborators: Collaborators,
    resolver: Arc<AgentResolver>,
}

impl std::fmt::Debug for BridgeContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeContext")
            .field("config", &self.config)
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}

impl BridgeContext {
    /// Assembles a context from explicit collaborators.
    #[must_use]
    pub fn new(
        config: BridgeConfig,
        credentials: RegistryCredentials,
        store: Arc<dyn KvStore>,
        collaborators: Collaborators,
    ) -> Self {
        let resolver = Arc::new(AgentResolver::new(
            Arc::clone(&collaborators.fetcher),
            Arc::clone(&collaborators.connector),
        ));
        Self {
            config,
            credentials,
            store,
            collaborators,
            resolver,
        }
    }

    /// Assembles a context backed by the HTTP transports.
    ///
    /// # Errors
    ///
    /// See [`Collaborators::http`].
    pub fn http(
        config: BridgeConfig,
        credentials: RegistryCredentials,
        store: Arc<dyn KvStore>,
    ) -> ToolResult<Self> {
        let collaborators = Collaborators::http(&config)?;
        Ok(Self::new(config, credentials, store, collaborators))
    }

    /// Returns the bridge tunables.
    #[must_use]
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Returns the host key-value store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn KvStore> {
        &self.store
    }

    /// Builds the registry target for `namespace`, defaulting blank namespaces.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::InvalidParameters`] when no registry address is configured.
    pub fn target(&self, namespace: Option<&str>) -> ToolResult<RegistryTarget> {
        let namespace = self.config.namespace_or_default(namespace.unwrap_or_default());
        Ok(RegistryTarget::new(self.credentials.clone(), namespace)?)
    }

    /// Returns the shared agent resolver.
    #[must_use]
    pub fn resolver(&self) -> Arc<AgentResolver> {
        Arc::clone(&self.resolver)
    }

    /// Builds an invoker using the configured call timeout.
    #[must_use]
    pub fn invoker(&self) -> AgentInvoker {
        AgentInvoker::new(
            self.resolver(),
            Arc::clone(&self.collaborators.clients),
            self.config.agent_call_timeout(),
        )
    }

    /// Builds a tool-server resolver bound to `target`.
    #[must_use]
    pub fn mcp(&self, target: RegistryTarget) -> McpToolResolver {
        McpToolResolver::new(
            Arc::clone(&self.collaborators.connector),
            Arc::clone(&self.collaborators.transport),
            target,
            self.config.mcp_timeout(),
        )
    }

    /// Returns the registry connector.
    #[must_use]
    pub fn connector(&self) -> Arc<dyn RegistryConnector> {
        Arc::clone(&self.collaborators.connector)
    }

    /// Builds a card publisher over a cache in the host store.
    #[must_use]
    pub fn publisher(&self) -> AgentCardPublisher {
        let cache = AgentCardCache::new(Arc::clone(&self.store), self.config.cache_ttl());
        AgentCardPublisher::new(self.connector(), Arc::new(cache))
    }
}
