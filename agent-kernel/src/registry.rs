//! Registry seam: connection targets, sessions, and the shared registry error.

use std::sync::Arc;

use agent_config::RegistryCredentials;
use agent_primitives::{AgentCard, McpServerDetail, ServerPage};
use async_trait::async_trait;
use thiserror::Error;

/// Result alias for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Errors surfaced by registry integration.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Connection parameters were invalid.
    #[error("invalid registry configuration: {reason}")]
    InvalidConfig {
        /// Description of the problem.
        reason: String,
    },
    /// The registry could not be reached.
    #[error("registry transport error: {reason}")]
    Transport {
        /// Underlying failure.
        reason: String,
    },
    /// Registry backend failure.
    #[error("registry backend error: {reason}")]
    Backend {
        /// Human-readable context provided by the backend.
        reason: String,
    },
    /// The requested resource does not exist.
    #[error("{resource} not found in registry")]
    NotFound {
        /// Resource that was looked up.
        resource: String,
    },
    /// The RPC exceeded its deadline.
    #[error("registry call {operation} timed out")]
    Timeout {
        /// Operation that timed out.
        operation: String,
    },
}

impl RegistryError {
    /// Convenience helper to construct backend errors.
    #[must_use]
    pub fn backend(reason: impl Into<String>) -> Self {
        Self::Backend {
            reason: reason.into(),
        }
    }

    /// Convenience helper to construct configuration errors.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Convenience helper to construct not-found errors.
    #[must_use]
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }
}

/// Where and as whom to connect to a registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryTarget {
    address: String,
    namespace_id: String,
    credentials: RegistryCredentials,
}

impl RegistryTarget {
    /// Builds a target from host credentials and a namespace.
    ///
    /// # Errors
    ///
    /// Returns [`agent_primitives::Error::Config`] when the credentials carry
    /// no registry address.
    pub fn new(
        credentials: RegistryCredentials,
        namespace_id: impl Into<String>,
    ) -> agent_primitives::Result<Self> {
        Ok(Self {
            address: credentials.require_address()?,
            namespace_id: namespace_id.into(),
            credentials,
        })
    }

    /// Normalized registry address (always carries a port).
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Namespace the target operates in.
    #[must_use]
    pub fn namespace_id(&self) -> &str {
        &self.namespace_id
    }

    /// Login credentials.
    #[must_use]
    pub fn credentials(&self) -> &RegistryCredentials {
        &self.credentials
    }

    /// Returns a copy of the target bound to another namespace.
    #[must_use]
    pub fn with_namespace(&self, namespace_id: impl Into<String>) -> Self {
        Self {
            namespace_id: namespace_id.into(),
            ..self.clone()
        }
    }
}

/// Open, authenticated session with a registry.
#[async_trait]
pub trait RegistrySession: Send + Sync {
    /// Looks up the Agent Card registered under `agent_name`.
    ///
    /// `version` of `None` selects the latest version.
    async fn get_agent_card(
        &self,
        namespace_id: &str,
        agent_name: &str,
        version: Option<&str>,
    ) -> RegistryResult<AgentCard>;

    /// Registers or updates an Agent Card.
    async fn register_agent(&self, card: &AgentCard, namespace_id: &str) -> RegistryResult<()>;

    /// Fetches the detail of a tool server.
    async fn get_server_detail(
        &self,
        namespace_id: &str,
        name: &str,
        version: Option<&str>,
    ) -> RegistryResult<McpServerDetail>;

    /// Lists one page of tool servers.
    async fn list_servers(
        &self,
        namespace_id: &str,
        page_no: u32,
        page_size: u32,
    ) -> RegistryResult<ServerPage>;

    /// Reads a configuration entry.
    async fn get_config(
        &self,
        namespace_id: &str,
        data_id: &str,
        group: &str,
    ) -> RegistryResult<String>;

    /// Publishes a configuration entry, returning the registry's acknowledgement.
    async fn publish_config(
        &self,
        namespace_id: &str,
        data_id: &str,
        group: &str,
        content: &str,
    ) -> RegistryResult<bool>;
}

/// Opens registry sessions.
#[async_trait]
pub trait RegistryConnector: Send + Sync {
    /// Connects and authenticates against `target`.
    async fn connect(&self, target: &RegistryTarget) -> RegistryResult<Arc<dyn RegistrySession>>;
}

#[cfg(test)]
pub(crate) mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scriptable registry recording every call.
    #[derive(Default)]
    pub(crate) struct MockRegistry {
        pub connects: AtomicUsize,
        pub card_lookups: AtomicUsize,
        pub registrations: AtomicUsize,
        pub fail_connect: bool,
        pub fail_register: bool,
        pub cards: Mutex<HashMap<String, AgentCard>>,
        pub servers: HashMap<String, McpServerDetail>,
        pub page: ServerPage,
        pub configs: Mutex<HashMap<String, String>>,
    }

    impl MockRegistry {
        pub(crate) fn with_card(self, card: AgentCard) -> Self {
            self.cards
                .lock()
                .unwrap()
                .insert(card.name.clone(), card);
            self
        }
    }

    pub(crate) struct MockConnector(pub Arc<MockRegistry>);

    #[async_trait]
    impl RegistryConnector for MockConnector {
        async fn connect(
            &self,
            _target: &RegistryTarget,
        ) -> RegistryResult<Arc<dyn RegistrySession>> {
            self.0.connects.fetch_add(1, Ordering::SeqCst);
            if self.0.fail_connect {
                return Err(RegistryError::Transport {
                    reason: "connection refused".into(),
                });
            }
            Ok(Arc::clone(&self.0) as Arc<dyn RegistrySession>)
        }
    }

    #[async_trait]
    impl RegistrySession for MockRegistry {
        async fn get_agent_card(
            &self,
            _namespace_id: &str,
            agent_name: &str,
            _version: Option<&str>,
        ) -> RegistryResult<AgentCard> {
            self.card_lookups.fetch_add(1, Ordering::SeqCst);
            self.cards
                .lock()
                .unwrap()
                .get(agent_name)
                .cloned()
                .ok_or_else(|| RegistryError::not_found(format!("agent {agent_name}")))
        }

        async fn register_agent(&self, card: &AgentCard, _namespace_id: &str) -> RegistryResult<()> {
            self.registrations.fetch_add(1, Ordering::SeqCst);
            if self.fail_register {
                return Err(RegistryError::backend("register rejected"));
            }
            self.cards
                .lock()
                .unwrap()
                .insert(card.name.clone(), card.clone());
            Ok(())
        }

        async fn get_server_detail(
            &self,
            _namespace_id: &str,
            name: &str,
            _version: Option<&str>,
        ) -> RegistryResult<McpServerDetail> {
            self.servers
                .get(name)
                .cloned()
                .ok_or_else(|| RegistryError::not_found(format!("mcp server {name}")))
        }

        async fn list_servers(
            &self,
            _namespace_id: &str,
            _page_no: u32,
            _page_size: u32,
        ) -> RegistryResult<ServerPage> {
            Ok(self.page.clone())
        }

        async fn get_config(
            &self,
            _namespace_id: &str,
            data_id: &str,
            group: &str,
        ) -> RegistryResult<String> {
            self.configs
                .lock()
                .unwrap()
                .get(&format!("{group}/{data_id}"))
                .cloned()
                .ok_or_else(|| RegistryError::not_found(format!("config {data_id}")))
        }

        async fn publish_config(
            &self,
            _namespace_id: &str,
            data_id: &str,
            group: &str,
            content: &str,
        ) -> RegistryResult<bool> {
            self.configs
                .lock()
                .unwrap()
                .insert(format!("{group}/{data_id}"), content.to_owned());
            Ok(true)
        }
    }
}
