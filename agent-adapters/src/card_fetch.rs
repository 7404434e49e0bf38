//! Direct Agent Card retrieval over HTTP.

use std::time::Duration;

use agent_primitives::AgentCard;
use async_trait::async_trait;
use tracing::debug;

use crate::http_client::HttpClient;
use crate::traits::{AdapterError, AdapterResult, AgentCardFetcher, SERVICE_UNAVAILABLE};

/// Fetches Agent Cards with a plain `GET`.
///
/// Failures map onto the fetch taxonomy: non-2xx statuses keep their code,
/// unreachable hosts and timeouts report 503, and bodies that are not JSON or
/// not a valid card become [`AdapterError::Parse`].
#[derive(Debug, Clone)]
pub struct HttpAgentCardFetcher {
    client: HttpClient,
    timeout: Duration,
}

impl HttpAgentCardFetcher {
    /// Creates a fetcher with the supplied client and deadline.
    #[must_use]
    pub const fn new(client: HttpClient, timeout: Duration) -> Self {
        Self { client, timeout }
    }
}

#[async_trait]
impl AgentCardFetcher for HttpAgentCardFetcher {
    async fn fetch_card(&self, url: &str) -> AdapterResult<AgentCard> {
        debug!(%url, "fetching agent card");
        let response = self
            .client
            .get(url, self.timeout)
            .await
            .map_err(|err| match err {
                AdapterError::Transport { reason } => AdapterError::Http {
                    status: SERVICE_UNAVAILABLE,
                    url: url.to_owned(),
                    reason: format!("network communication error: {reason}"),
                },
                AdapterError::Timeout { operation } => AdapterError::Http {
                    status: SERVICE_UNAVAILABLE,
                    url: url.to_owned(),
                    reason: format!("{operation} timed out"),
                },
                other => other,
            })?;

        if !response.status.is_success() {
            return Err(AdapterError::Http {
                status: response.status.as_u16(),
                url: url.to_owned(),
                reason: format!("failed to fetch agent card: {}", response.text()),
            });
        }

        let value: serde_json::Value = serde_json::from_slice(&response.body)
            .map_err(|err| AdapterError::parse(url, format!("invalid JSON: {err}")))?;

        AgentCard::from_value(value)
            .map_err(|err| AdapterError::parse(url, format!("invalid agent card: {err}")))
    }
}
