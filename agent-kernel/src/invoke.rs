//! Sending a user query to a resolved agent.

use std::sync::Arc;
use std::time::Duration;

use agent_adapters::{AdapterError, AgentClientFactory, AgentResponse};
use agent_primitives::Message;
use futures::StreamExt;
use tokio::time::timeout;
use tracing::debug;
use uuid::Uuid;

use crate::error::{ResolveError, ResolveResult};
use crate::resolver::{AgentReference, AgentResolver};

/// Resolves an agent and exchanges one message with it.
pub struct AgentInvoker {
    resolver: Arc<AgentResolver>,
    clients: Arc<dyn AgentClientFactory>,
    timeout: Duration,
}

impl std::fmt::Debug for AgentInvoker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentInvoker")
            .field("resolver", &self.resolver)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl AgentInvoker {
    /// Creates an invoker whose calls are bounded by `timeout`.
    #[must_use]
    pub fn new(
        resolver: Arc<AgentResolver>,
        clients: Arc<dyn AgentClientFactory>,
        timeout: Duration,
    ) -> Self {
        Self {
            resolver,
            clients,
            timeout,
        }
    }

    /// Sends `query` to the referenced agent and returns its final response.
    ///
    /// `context_id` continues an existing conversation; a fresh one is minted
    /// when absent.
    ///
    /// # Errors
    ///
    /// Returns the resolution error when the card cannot be obtained, and
    /// [`ResolveError::Invocation`] when sending fails, times out, or the agent
    /// answers with an empty stream.
    pub async fn call(
        &self,
        reference: &AgentReference,
        query: &str,
        context_id: Option<String>,
    ) -> ResolveResult<AgentResponse> {
        let card = self.resolver.resolve_single(reference).await?;
        let client = self
            .clients
            .create_client(&card)
            .map_err(ResolveError::Invocation)?;

        let context_id = context_id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let message = Message::user_text(query, Some(context_id));
        debug!(agent_name = %card.name, url = %card.url, "sending message to agent");

        let exchange = async {
            let mut stream = client.send_message(message).await?;
            let mut last = None;
            while let Some(item) = stream.next().await {
                last = Some(item?);
            }
            last.ok_or_else(|| AdapterError::protocol("agent returned an empty response"))
        };

        timeout(self.timeout, exchange)
            .await
            .map_err(|_| ResolveError::Invocation(AdapterError::timeout("message/send")))?
            .map_err(ResolveError::Invocation)
    }
}
