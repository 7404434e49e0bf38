//! MCP client sessions over streamable HTTP and server-sent events.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use agent_primitives::{McpProtocol, ToolDescriptor};
use async_trait::async_trait;
use hyper::header::{ACCEPT, CONTENT_TYPE, HeaderValue};
use hyper::{Body, Request, Uri};
use futures::{Stream, StreamExt};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::http_client::{HttpClient, HttpResponse, parse_uri};
use crate::jsonrpc::{JsonRpcRequest, JsonRpcResponse};
use crate::sse::{self, SseEvent};
use crate::traits::{AdapterError, AdapterResult, McpSession, McpTransport};

/// Protocol revision announced during `initialize`.
pub const MCP_PROTOCOL_VERSION: &str = "2025-03-26";

const SESSION_HEADER: &str = "mcp-session-id";
const EVENT_STREAM: &str = "text/event-stream";
const ENDPOINT_EVENT: &str = "endpoint";

/// Opens MCP sessions over HTTP.
#[derive(Debug, Clone)]
pub struct HttpMcpTransport {
    client: HttpClient,
    timeout: Duration,
}

impl HttpMcpTransport {
    /// Creates a transport; `timeout` bounds the handshake and every request.
    #[must_use]
    pub const fn new(client: HttpClient, timeout: Duration) -> Self {
        Self { client, timeout }
    }
}

#[async_trait]
impl McpTransport for HttpMcpTransport {
    async fn open(&self, protocol: &McpProtocol, url: &str) -> AdapterResult<Box<dyn McpSession>> {
        debug!(%protocol, %url, "opening MCP session");
        match protocol {
            McpProtocol::Streamable => Ok(Box::new(RpcSession(StreamableSession::new(
                self.client.clone(),
                parse_uri(url)?,
                self.timeout,
            )))),
            McpProtocol::Sse => Ok(Box::new(RpcSession(
                SseSession::connect(self.client.clone(), url, self.timeout).await?,
            ))),
            McpProtocol::Other(other) => Err(AdapterError::protocol(format!(
                "unsupported MCP transport `{other}`"
            ))),
        }
    }
}

/// Request/notification channel underlying an MCP session.
#[async_trait]
trait RpcChannel: Send + Sync {
    async fn request(&self, method: &str, params: Option<Value>) -> AdapterResult<Value>;

    async fn notify(&self, method: &str, params: Option<Value>) -> AdapterResult<()>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListToolsPage {
    #[serde(default)]
    tools: Vec<ToolDescriptor>,
    #[serde(default)]
    next_cursor: Option<String>,
}

/// MCP operations layered over any [`RpcChannel`].
struct RpcSession<C>(C);

#[async_trait]
impl<C: RpcChannel> McpSession for RpcSession<C> {
    async fn initialize(&self) -> AdapterResult<()> {
        let params = json!({
            "protocolVersion": MCP_PROTOCOL_VERSION,
            "capabilities": {},
            "clientInfo": { "name": "a2a-bridge", "version": env!("CARGO_PKG_VERSION") },
        });
        let result = self.0.request("initialize", Some(params)).await?;
        debug!(server = ?result.get("serverInfo"), "MCP session initialized");
        self.0.notify("notifications/initialized", None).await
    }

    async fn list_tools(&self) -> AdapterResult<Vec<ToolDescriptor>> {
        let mut tools = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let params = cursor.as_ref().map(|cursor| json!({ "cursor": cursor }));
            let result = self.0.request("tools/list", params).await?;
            let page: ListToolsPage = serde_json::from_value(result)
                .map_err(|err| AdapterError::protocol(format!("malformed tools/list result: {err}")))?;
            tools.extend(page.tools);
            match page.next_cursor {
                Some(next) if !next.is_empty() => cursor = Some(next),
                _ => return Ok(tools),
            }
        }
    }

    async fn call_tool(&self, name: &str, arguments: Map<String, Value>) -> AdapterResult<Value> {
        self.0.request(
            "tools/call",
            Some(json!({ "name": name, "arguments": arguments })),
        )
        .await
    }
}

/// Session over the streamable HTTP transport: every message is a `POST`
/// answered with JSON or a short SSE stream.
struct StreamableSession {
    client: HttpClient,
    endpoint: Uri,
    timeout: Duration,
    session_id: Mutex<Option<HeaderValue>>,
    next_id: AtomicU64,
}

impl StreamableSession {
    fn new(client: HttpClient, endpoint: Uri, timeout: Duration) -> Self {
        Self {
            client,
            endpoint,
            timeout,
            session_id: Mutex::new(None),
            next_id: AtomicU64::new(1),
        }
    }

    async fn post(&self, payload: &JsonRpcRequest) -> AdapterResult<HttpResponse> {
        let body = serde_json::to_vec(payload)
            .map_err(|err| AdapterError::transport(format!("failed to encode MCP request: {err}")))?;

        let mut builder = Request::post(self.endpoint.clone())
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json, text/event-stream");
        let session_id = self
            .session_id
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(session_id) = session_id {
            builder = builder.header(SESSION_HEADER, session_id);
        }
        let request = builder
            .body(Body::from(body))
            .map_err(|err| AdapterError::transport(format!("failed to build MCP request: {err}")))?;

        let response = self.client.send_buffered(request, self.timeout).await?;
        if let Some(session_id) = response.headers.get(SESSION_HEADER) {
            *self
                .session_id
                .lock()
                .unwrap_or_else(PoisonError::into_inner) = Some(session_id.clone());
        }
        if !response.status.is_success() {
            return Err(AdapterError::Http {
                status: response.status.as_u16(),
                url: self.endpoint.to_string(),
                reason: response.text(),
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl RpcChannel for StreamableSession {
    async fn request(&self, method: &str, params: Option<Value>) -> AdapterResult<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let response = self.post(&JsonRpcRequest::new(id, method, params)).await?;

        let is_stream = response
            .headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with(EVENT_STREAM));

        let envelope = if is_stream {
            sse::decode_buffered(&response.body)
                .await?
                .iter()
                .filter_map(|event| serde_json::from_str::<JsonRpcResponse>(&event.data).ok())
                .find(|candidate| candidate.id == Some(Value::from(id)))
                .ok_or_else(|| {
                    AdapterError::protocol(format!("no response to `{method}` in event stream"))
                })?
        } else {
            serde_json::from_slice::<JsonRpcResponse>(&response.body).map_err(|err| {
                AdapterError::parse(self.endpoint.to_string(), format!("invalid JSON-RPC: {err}"))
            })?
        };
        envelope.into_result()
    }

    async fn notify(&self, method: &str, params: Option<Value>) -> AdapterResult<()> {
        self.post(&JsonRpcRequest::notification(method, params))
            .await
            .map(|_| ())
    }
}

type Pending = Arc<Mutex<HashMap<u64, oneshot::Sender<JsonRpcResponse>>>>;

/// Session over the SSE transport: responses arrive on a long-lived `GET`
/// stream, requests are `POST`ed to the endpoint the server announces.
struct SseSession {
    client: HttpClient,
    post_endpoint: Uri,
    timeout: Duration,
    pending: Pending,
    next_id: AtomicU64,
    reader: JoinHandle<()>,
}

impl SseSession {
    async fn connect(client: HttpClient, url: &str, deadline: Duration) -> AdapterResult<Self> {
        let request = Request::get(parse_uri(url)?)
            .header(ACCEPT, EVENT_STREAM)
            .body(Body::empty())
            .map_err(|err| AdapterError::transport(format!("failed to build SSE request: {err}")))?;
        let response = client.send(request, deadline).await?;
        if !response.status().is_success() {
            return Err(AdapterError::Http {
                status: response.status().as_u16(),
                url: url.to_owned(),
                reason: "SSE connection rejected".to_owned(),
            });
        }

        let mut events = Box::pin(sse::decode(response.into_body()));
        let announced = timeout(deadline, wait_for_endpoint(&mut events))
            .await
            .map_err(|_| AdapterError::timeout("waiting for MCP endpoint event"))??;
        let post_endpoint = resolve_endpoint(url, &announced)?;
        debug!(%post_endpoint, "MCP SSE endpoint announced");

        let pending: Pending = Arc::new(Mutex::new(HashMap::new()));
        let reader = tokio::spawn(read_responses(events, Arc::clone(&pending)));

        Ok(Self {
            client,
            post_endpoint,
            timeout: deadline,
            pending,
            next_id: AtomicU64::new(1),
            reader,
        })
    }

    async fn post(&self, payload: &JsonRpcRequest) -> AdapterResult<()> {
        let body = serde_json::to_vec(payload)
            .map_err(|err| AdapterError::transport(format!("failed to encode MCP request: {err}")))?;
        let request = Request::post(self.post_endpoint.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .map_err(|err| AdapterError::transport(format!("failed to build MCP request: {err}")))?;
        let response = self.client.send_buffered(request, self.timeout).await?;
        if response.status.is_success() {
            Ok(())
        } else {
            Err(AdapterError::Http {
                status: response.status.as_u16(),
                url: self.post_endpoint.to_string(),
                reason: response.text(),
            })
        }
    }

    fn forget(&self, id: u64) {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);
    }
}

impl Drop for SseSession {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

#[async_trait]
impl RpcChannel for SseSession {
    async fn request(&self, method: &str, params: Option<Value>) -> AdapterResult<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, tx);

        if let Err(err) = self.post(&JsonRpcRequest::new(id, method, params)).await {
            self.forget(id);
            return Err(err);
        }

        match timeout(self.timeout, rx).await {
            Ok(Ok(response)) => response.into_result(),
            Ok(Err(_)) => Err(AdapterError::transport(
                "MCP event stream closed before the response arrived",
            )),
            Err(_) => {
                self.forget(id);
                Err(AdapterError::timeout(format!("MCP `{method}`")))
            }
        }
    }

    async fn notify(&self, method: &str, params: Option<Value>) -> AdapterResult<()> {
        self.post(&JsonRpcRequest::notification(method, params)).await
    }
}

async fn wait_for_endpoint<S>(events: &mut S) -> AdapterResult<String>
where
    S: Stream<Item = AdapterResult<SseEvent>> + Unpin,
{
    while let Some(event) = events.next().await {
        let event = event?;
        if event.event == ENDPOINT_EVENT {
            return Ok(event.data);
        }
    }
    Err(AdapterError::protocol(
        "MCP event stream ended before announcing an endpoint",
    ))
}

async fn read_responses<S>(mut events: S, pending: Pending)
where
    S: Stream<Item = AdapterResult<SseEvent>> + Unpin,
{
    while let Some(event) = events.next().await {
        let event = match event {
            Ok(event) => event,
            Err(err) => {
                warn!(?err, "MCP event stream failed");
                break;
            }
        };
        if !sse::is_message(&event) {
            continue;
        }
        let Ok(response) = serde_json::from_str::<JsonRpcResponse>(&event.data) else {
            debug!(data = %event.data, "ignoring non-response MCP event");
            continue;
        };
        let Some(id) = response.id.as_ref().and_then(Value::as_u64) else {
            continue;
        };
        let waiter = pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);
        if let Some(waiter) = waiter {
            let _ = waiter.send(response);
        }
    }
    // dropping the senders wakes every waiter with a closed-channel error
    pending
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clear();
}

fn resolve_endpoint(base: &str, announced: &str) -> AdapterResult<Uri> {
    let base = url::Url::parse(base)
        .map_err(|err| AdapterError::configuration(format!("invalid url `{base}`: {err}")))?;
    let joined = base.join(announced.trim()).map_err(|err| {
        AdapterError::protocol(format!("invalid MCP endpoint `{announced}`: {err}"))
    })?;
    parse_uri(joined.as_str())
}
