//! Agent-to-agent client speaking JSON-RPC `message/send` over HTTP.

use std::sync::Arc;
use std::time::Duration;

use agent_primitives::{AgentCard, Message, Task};
use async_trait::async_trait;
use futures::stream;
use hyper::header::{ACCEPT, CONTENT_TYPE};
use hyper::{Body, Request, Uri};
use serde_json::{Value, json};
use tracing::debug;
use uuid::Uuid;

use crate::http_client::{HttpClient, parse_uri};
use crate::jsonrpc::{JsonRpcRequest, JsonRpcResponse};
use crate::traits::{
    AdapterError, AdapterResult, AgentClient, AgentClientFactory, AgentResponse,
    AgentResponseStream,
};

const SEND_MESSAGE: &str = "message/send";

/// Creates [`JsonRpcAgentClient`]s sharing one HTTP client and deadline.
#[derive(Debug, Clone)]
pub struct JsonRpcAgentClientFactory {
    client: HttpClient,
    timeout: Duration,
}

impl JsonRpcAgentClientFactory {
    /// Creates a factory; `timeout` bounds each message exchange.
    #[must_use]
    pub const fn new(client: HttpClient, timeout: Duration) -> Self {
        Self { client, timeout }
    }
}

impl AgentClientFactory for JsonRpcAgentClientFactory {
    fn create_client(&self, card: &AgentCard) -> AdapterResult<Arc<dyn AgentClient>> {
        let endpoint = parse_uri(&card.url)?;
        Ok(Arc::new(JsonRpcAgentClient {
            client: self.client.clone(),
            endpoint,
            timeout: self.timeout,
        }))
    }
}

/// Non-streaming A2A client bound to one agent endpoint.
#[derive(Debug)]
pub struct JsonRpcAgentClient {
    client: HttpClient,
    endpoint: Uri,
    timeout: Duration,
}

#[async_trait]
impl AgentClient for JsonRpcAgentClient {
    async fn send_message(&self, message: Message) -> AdapterResult<AgentResponseStream> {
        let params = json!({
            "message": message,
            "configuration": { "blocking": true },
        });
        let request_id = Uuid::new_v4().to_string();
        let payload = JsonRpcRequest::new(request_id.clone(), SEND_MESSAGE, Some(params));
        let body = serde_json::to_vec(&payload).map_err(|err| {
            AdapterError::transport(format!("failed to encode A2A request: {err}"))
        })?;

        let request = Request::post(self.endpoint.clone())
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .body(Body::from(body))
            .map_err(|err| AdapterError::transport(format!("failed to build A2A request: {err}")))?;

        debug!(endpoint = %self.endpoint, %request_id, "sending A2A message");
        let response = self.client.send_buffered(request, self.timeout).await?;
        let url = self.endpoint.to_string();
        if !response.status.is_success() {
            return Err(AdapterError::Http {
                status: response.status.as_u16(),
                url,
                reason: response.text(),
            });
        }

        let envelope: JsonRpcResponse = serde_json::from_slice(&response.body)
            .map_err(|err| AdapterError::parse(&url, format!("invalid JSON-RPC response: {err}")))?;
        let item = decode_send_result(envelope.into_result()?)?;
        Ok(Box::pin(stream::once(async move { Ok(item) })))
    }
}

/// Classifies a `message/send` result by its `kind` discriminator.
///
/// # Errors
///
/// Returns [`AdapterError::Protocol`] when the result is neither a message nor a task.
pub fn decode_send_result(result: Value) -> AdapterResult<AgentResponse> {
    let kind = result.get("kind").and_then(Value::as_str).map(str::to_owned);
    match kind.as_deref() {
        Some("message") => serde_json::from_value::<Message>(result)
            .map(AgentResponse::DirectMessage)
            .map_err(|err| AdapterError::protocol(format!("malformed message result: {err}"))),
        Some("task") => serde_json::from_value::<Task>(result)
            .map(|task| AgentResponse::TaskUpdate { task, update: None })
            .map_err(|err| AdapterError::protocol(format!("malformed task result: {err}"))),
        other => Err(AdapterError::protocol(format!(
            "unexpected message/send result kind: {}",
            other.unwrap_or("<missing>")
        ))),
    }
}
