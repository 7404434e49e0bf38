//! A2A server endpoint exposing a host application as an agent.
//!
//! The host transport hands each request to [`A2aEndpoint::handle`] as
//! method, path, and raw body. `GET …/.well-known/agent.json` serves the
//! Agent Card and any `POST` is treated as a JSON-RPC call; only
//! `message/send` is supported.

use std::sync::Arc;

use agent_config::EndpointSettings;
use agent_kernel::{AgentCardPublisher, RegistryTarget};
use agent_memory::{ConversationStore, KvStore};
use agent_primitives::Message;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Path suffix serving the Agent Card.
pub const AGENT_CARD_PATH: &str = "/.well-known/agent.json";

const SEND_MESSAGE: &str = "message/send";
const PARSE_ERROR: i64 = -32700;
const INVALID_PARAMS: i64 = -32602;
const METHOD_NOT_FOUND: i64 = -32601;
const INTERNAL_ERROR: i64 = -32603;
const NO_RESPONSE: &str = "No response";

/// Failure reported by the host application.
#[derive(Debug, Error)]
#[error("{reason}")]
pub struct AppError {
    /// Host-provided description.
    pub reason: String,
}

impl AppError {
    /// Creates an error with the supplied reason.
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Aggregated reply of a conversational app.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatReply {
    /// Concatenated answer text.
    pub answer: String,
    /// Conversation the host filed the exchange under.
    pub conversation_id: Option<String>,
}

/// Host application the endpoint forwards messages to.
#[async_trait]
pub trait AppInvoker: Send + Sync {
    /// Sends `query` to a conversational app, continuing `conversation_id` when set.
    async fn chat(
        &self,
        app_id: &str,
        query: &str,
        conversation_id: Option<&str>,
    ) -> Result<ChatReply, AppError>;

    /// Runs a workflow app with `query` as its only input.
    async fn workflow(&self, app_id: &str, query: &str) -> Result<Value, AppError>;
}

/// HTTP response produced by the endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointResponse {
    /// HTTP status code.
    pub status: u16,
    /// JSON body.
    pub body: Value,
}

impl EndpointResponse {
    fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    fn rpc_error(id: Value, code: i64, message: &str, data: Option<String>) -> Self {
        let mut error = json!({ "code": code, "message": message });
        if let Some(data) = data {
            error["data"] = Value::String(data);
        }
        Self::ok(json!({ "jsonrpc": "2.0", "error": error, "id": id }))
    }
}

#[derive(Debug, Deserialize)]
struct RpcRequest {
    #[serde(default)]
    id: Value,
    method: String,
    #[serde(default)]
    params: Value,
}

#[derive(Debug, Deserialize)]
struct SendParams {
    message: Message,
}

/// Serves the Agent Card and answers `message/send` through an [`AppInvoker`].
pub struct A2aEndpoint {
    settings: EndpointSettings,
    app: Arc<dyn AppInvoker>,
    conversations: ConversationStore,
    publisher: Option<(AgentCardPublisher, RegistryTarget)>,
}

impl std::fmt::Debug for A2aEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("A2aEndpoint")
            .field("settings", &self.settings)
            .field("conversations", &self.conversations)
            .finish_non_exhaustive()
    }
}

impl A2aEndpoint {
    /// Creates an endpoint storing conversation mappings in `store`.
    #[must_use]
    pub fn new(settings: EndpointSettings, app: Arc<dyn AppInvoker>, store: Arc<dyn KvStore>) -> Self {
        let conversations = ConversationStore::new(store, settings.app.app_id.clone());
        Self {
            settings,
            app,
            conversations,
            publisher: None,
        }
    }

    /// Publishes the served card to `target` whenever it is requested.
    #[must_use]
    pub fn with_registration(mut self, publisher: AgentCardPublisher, target: RegistryTarget) -> Self {
        self.publisher = Some((publisher, target));
        self
    }

    /// Routes one request.
    pub async fn handle(&self, method: &str, path: &str, body: &[u8]) -> EndpointResponse {
        let method = method.to_ascii_uppercase();
        info!(%method, %path, "a2a endpoint request");

        if method == "GET" && path.ends_with(AGENT_CARD_PATH) {
            self.agent_card().await
        } else if method == "POST" {
            self.json_rpc(body).await
        } else {
            EndpointResponse {
                status: 404,
                body: json!({
                    "error": "Not Found",
                    "message": format!("Unknown endpoint: {method} {path}"),
                }),
            }
        }
    }

    async fn agent_card(&self) -> EndpointResponse {
        let card = match self.settings.agent_card() {
            Ok(card) => card,
            Err(err) => {
                error!(%err, "failed to build agent card");
                return EndpointResponse {
                    status: 500,
                    body: json!({ "error": "Internal error", "message": err.to_string() }),
                };
            }
        };
        let card = match &self.publisher {
            Some((publisher, target)) => publisher.sync(target, card).await,
            None => card,
        };
        match card.to_value() {
            Ok(body) => EndpointResponse::ok(body),
            Err(err) => EndpointResponse {
                status: 500,
                body: json!({ "error": "Internal error", "message": err.to_string() }),
            },
        }
    }

    async fn json_rpc(&self, body: &[u8]) -> EndpointResponse {
        let request: RpcRequest = match serde_json::from_slice(body) {
            Ok(request) => request,
            Err(err) => {
                return EndpointResponse::rpc_error(
                    Value::Null,
                    PARSE_ERROR,
                    "Parse error",
                    Some(err.to_string()),
                );
            }
        };
        debug!(method = %request.method, "json-rpc request");

        if request.method != SEND_MESSAGE {
            return EndpointResponse::rpc_error(
                request.id,
                METHOD_NOT_FOUND,
                "Method not found",
                Some(request.method),
            );
        }
        let params: SendParams = match serde_json::from_value(request.params) {
            Ok(params) => params,
            Err(err) => {
                return EndpointResponse::rpc_error(
                    request.id,
                    INVALID_PARAMS,
                    "Invalid params",
                    Some(err.to_string()),
                );
            }
        };

        let context_id = params
            .message
            .context_id
            .clone()
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let text = match self.execute(&params.message.text_content(), &context_id).await {
            Ok(text) => text,
            Err(err) => {
                error!(app_id = %self.settings.app.app_id, %err, "app invocation failed");
                format!("Error: {err}")
            }
        };

        let reply = Message::agent_text(text, Some(context_id));
        match serde_json::to_value(&reply) {
            Ok(result) => EndpointResponse::ok(json!({ "jsonrpc": "2.0", "id": request.id, "result": result })),
            Err(err) => EndpointResponse::rpc_error(
                request.id,
                INTERNAL_ERROR,
                "Internal error",
                Some(err.to_string()),
            ),
        }
    }

    async fn execute(&self, query: &str, context_id: &str) -> Result<String, AppError> {
        let app_id = self.settings.app.app_id.as_str();
        let mapped = self.conversations.get(context_id).await;

        match self.app.chat(app_id, query, mapped.as_deref()).await {
            Ok(reply) => {
                if let Some(conversation_id) = reply.conversation_id.as_deref()
                    && mapped.as_deref() != Some(conversation_id)
                {
                    self.conversations.save(context_id, conversation_id).await;
                }
                if reply.answer.is_empty() {
                    Ok(NO_RESPONSE.to_owned())
                } else {
                    Ok(reply.answer)
                }
            }
            Err(chat_err) => {
                warn!(%app_id, err = %chat_err, "chat invocation failed, trying workflow");
                match self.app.workflow(app_id, query).await {
                    Ok(response) => Ok(workflow_text(&response)),
                    Err(workflow_err) => {
                        error!(%app_id, err = %workflow_err, "workflow invocation also failed");
                        Err(chat_err)
                    }
                }
            }
        }
    }
}

/// Extracts the answer from a workflow response's `data.outputs`.
///
/// Prefers a non-empty `text` output, then `result`, then the whole outputs object.
#[must_use]
pub fn workflow_text(response: &Value) -> String {
    let outputs = response
        .get("data")
        .and_then(|data| data.get("outputs"))
        .cloned()
        .unwrap_or_else(|| json!({}));
    ["text", "result"]
        .iter()
        .filter_map(|key| outputs.get(key))
        .find_map(|value| match value {
            Value::String(text) if !text.is_empty() => Some(text.clone()),
            Value::String(_) | Value::Null => None,
            other => Some(other.to_string()),
        })
        .unwrap_or_else(|| outputs.to_string())
}
