//! Tool-server resolution: registry detail, endpoint selection, live listing, and overlay.

use std::sync::Arc;
use std::time::Duration;

use agent_adapters::{McpSession, McpTransport};
use agent_config::DEFAULT_NAMESPACE;
use agent_primitives::{
    BackendEndpoint, McpServerDetail, ServerPage, ServerSpec, ToolDescriptor, build_endpoint_url,
};
use rand::seq::SliceRandom;
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::error::{McpStage, ResolveError, ResolveResult};
use crate::registry::{RegistryConnector, RegistrySession, RegistryTarget};

const SPEC_LIST_SEPARATOR: char = ';';
const VALIDATION_PAGE_SIZE: u32 = 10;

/// Tools exposed by one server, keyed by the reference the caller supplied.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerTools {
    /// Server reference as supplied (`name` or `name::version`).
    pub name: String,
    /// Enabled tools with registry overrides applied.
    pub tools: Vec<ToolDescriptor>,
}

/// Resolved, reachable tool server.
struct LiveServer {
    detail: McpServerDetail,
    url: String,
}

/// Resolves registry-registered tool servers to live endpoints.
pub struct McpToolResolver {
    connector: Arc<dyn RegistryConnector>,
    transport: Arc<dyn McpTransport>,
    target: RegistryTarget,
    timeout: Duration,
}

impl std::fmt::Debug for McpToolResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("McpToolResolver")
            .field("target", &self.target)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl McpToolResolver {
    /// Creates a resolver operating in `target`'s namespace.
    ///
    /// `timeout` bounds the session handshake and each list or call.
    #[must_use]
    pub fn new(
        connector: Arc<dyn RegistryConnector>,
        transport: Arc<dyn McpTransport>,
        target: RegistryTarget,
        timeout: Duration,
    ) -> Self {
        Self {
            connector,
            transport,
            target,
            timeout,
        }
    }

    /// Lists the enabled tools of one server, raising on any failure.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Config`] for a malformed reference,
    /// [`ResolveError::Backend`] when the registry lookup fails,
    /// [`ResolveError::Protocol`] for unsupported transports, and
    /// [`ResolveError::Transport`] when the live server cannot be listed.
    pub async fn resolve_tools(&self, server_spec: &str) -> ResolveResult<Vec<ToolDescriptor>> {
        let spec = ServerSpec::parse(server_spec)?;
        let registry = self.connector.connect(&self.target).await?;
        self.list_live_tools(registry.as_ref(), &spec).await
    }

    /// Lists tools of every server in a `;`-separated reference list.
    ///
    /// Entries are trimmed and blank entries ignored. Servers failing after the reference is parsed are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Config`] when any reference is malformed and
    /// [`ResolveError::Backend`] when the registry cannot be reached at all.
    pub async fn resolve_many(&self, server_specs: &str) -> ResolveResult<Vec<ServerTools>> {
        let specs = server_specs
            .split(SPEC_LIST_SEPARATOR)
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
            .map(ServerSpec::parse)
            .collect::<Result<Vec<_>, _>>()?;
        let registry = self.connector.connect(&self.target).await?;

        let mut result = Vec::with_capacity(specs.len());
        for spec in specs {
            match self.list_live_tools(registry.as_ref(), &spec).await {
                Ok(tools) => result.push(ServerTools {
                    name: spec.raw().to_owned(),
                    tools,
                }),
                Err(err) => info!(server = %spec, %err, "skipping mcp server"),
            }
        }
        Ok(result)
    }

    /// Invokes `tool_name` on one server with JSON-encoded arguments.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Config`] when the arguments are not a JSON
    /// object, plus every error of [`McpToolResolver::resolve_tools`].
    pub async fn call_tool(
        &self,
        server_spec: &str,
        tool_name: &str,
        arguments_json: &str,
    ) -> ResolveResult<Value> {
        let arguments = parse_arguments(arguments_json)?;
        let spec = ServerSpec::parse(server_spec)?;
        let registry = self.connector.connect(&self.target).await?;
        let server = self.locate(registry.as_ref(), &spec).await?;

        let session = self.open(&server).await?;
        debug!(server = %spec, tool = tool_name, "calling mcp tool");
        timeout(self.timeout, session.call_tool(tool_name, arguments))
            .await
            .map_err(|_| ResolveError::transport(McpStage::ListOrCall, "tool call timed out"))?
            .map_err(|err| ResolveError::transport(McpStage::ListOrCall, err.to_string()))
    }

    /// Lists one page of servers, keeping only supported transports.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Backend`] when the registry call fails.
    pub async fn list_servers(&self, page_no: u32, page_size: u32) -> ResolveResult<ServerPage> {
        let registry = self.connector.connect(&self.target).await?;
        let mut page = registry
            .list_servers(self.target.namespace_id(), page_no, page_size)
            .await?;
        page.servers.retain(|server| server.protocol.is_supported());
        Ok(page)
    }

    /// Checks the credentials by listing the first page of the default namespace.
    ///
    /// # Errors
    ///
    /// Returns the registry failure when the credentials are rejected.
    pub async fn validate_credentials(&self) -> ResolveResult<()> {
        let registry = self.connector.connect(&self.target).await?;
        registry
            .list_servers(DEFAULT_NAMESPACE, 1, VALIDATION_PAGE_SIZE)
            .await?;
        Ok(())
    }

    async fn list_live_tools(
        &self,
        registry: &dyn RegistrySession,
        spec: &ServerSpec,
    ) -> ResolveResult<Vec<ToolDescriptor>> {
        let server = self.locate(registry, spec).await?;
        let session = self.open(&server).await?;
        let tools = timeout(self.timeout, session.list_tools())
            .await
            .map_err(|_| ResolveError::transport(McpStage::ListOrCall, "tool listing timed out"))?
            .map_err(|err| ResolveError::transport(McpStage::ListOrCall, err.to_string()))?;
        Ok(overlay_registry_metadata(tools, &server.detail))
    }

    async fn locate(
        &self,
        registry: &dyn RegistrySession,
        spec: &ServerSpec,
    ) -> ResolveResult<LiveServer> {
        let detail = registry
            .get_server_detail(self.target.namespace_id(), spec.name(), spec.version())
            .await?;

        if !detail.protocol.is_supported() {
            return Err(ResolveError::Protocol {
                server: spec.raw().to_owned(),
                reason: format!(
                    "protocol must be mcp-sse or mcp-streamable, got {}",
                    detail.protocol
                ),
            });
        }

        let endpoint = pick_endpoint(&detail.backend_endpoints).ok_or_else(|| {
            ResolveError::transport(
                McpStage::SelectEndpoint,
                format!("mcp server {spec} has no backend endpoints"),
            )
        })?;
        let url = build_endpoint_url(&endpoint.address, endpoint.port, &detail.export_path);
        debug!(server = %spec, %url, protocol = %detail.protocol, "selected mcp endpoint");
        Ok(LiveServer { detail, url })
    }

    async fn open(&self, server: &LiveServer) -> ResolveResult<Box<dyn McpSession>> {
        let handshake = async {
            let session = self.transport.open(&server.detail.protocol, &server.url).await?;
            session.initialize().await?;
            Ok::<_, agent_adapters::AdapterError>(session)
        };
        timeout(self.timeout, handshake)
            .await
            .map_err(|_| ResolveError::transport(McpStage::OpenSession, "handshake timed out"))?
            .map_err(|err| ResolveError::transport(McpStage::OpenSession, err.to_string()))
    }
}

/// Picks one endpoint uniformly at random.
fn pick_endpoint(endpoints: &[BackendEndpoint]) -> Option<&BackendEndpoint> {
    endpoints.choose(&mut rand::thread_rng())
}

fn parse_arguments(arguments_json: &str) -> ResolveResult<Map<String, Value>> {
    match serde_json::from_str::<Value>(arguments_json) {
        Ok(Value::Object(arguments)) => Ok(arguments),
        Ok(_) => Err(ResolveError::config("arguments must be a JSON object")),
        Err(err) => Err(ResolveError::config(format!(
            "arguments must be a valid JSON string: {err}"
        ))),
    }
}

/// Applies registry overrides to the tools reported by a live server.
///
/// Tools disabled in the registry are dropped. Tools the registry also lists
/// take its description when set, and each argument present on both sides
/// takes the registry's argument description; every other schema field comes
/// from the live server. A tool whose override fails is kept unmodified.
#[must_use]
pub fn overlay_registry_metadata(
    tools: Vec<ToolDescriptor>,
    detail: &McpServerDetail,
) -> Vec<ToolDescriptor> {
    let Some(spec) = &detail.tool_spec else {
        return tools;
    };

    tools
        .into_iter()
        .filter(|tool| spec.is_enabled(&tool.name))
        .map(|tool| match spec.tool(&tool.name) {
            None => tool,
            Some(registered) => match overlay_tool(&tool, registered) {
                Ok(merged) => merged,
                Err(reason) => {
                    warn!(tool = %tool.name, %reason, stage = %McpStage::OverlayMetadata, "tool override skipped");
                    tool
                }
            },
        })
        .collect()
}

fn overlay_tool(live: &ToolDescriptor, registered: &ToolDescriptor) -> Result<ToolDescriptor, String> {
    let mut merged = live.clone();
    if let Some(description) = &registered.description {
        merged.description = Some(description.clone());
    }

    let Some(registered_props) = registered.input_schema.get("properties") else {
        return Ok(merged);
    };
    let registered_props = registered_props
        .as_object()
        .ok_or("registry properties are not an object")?;
    let Some(live_props) = merged.input_schema.get_mut("properties") else {
        return Ok(merged);
    };
    let live_props = live_props
        .as_object_mut()
        .ok_or("server properties are not an object")?;

    for (name, live_prop) in live_props.iter_mut() {
        let Some(description) = registered_props
            .get(name)
            .and_then(|prop| prop.get("description"))
        else {
            continue;
        };
        live_prop
            .as_object_mut()
            .ok_or_else(|| format!("property `{name}` is not an object"))?
            .insert("description".to_owned(), description.clone());
    }
    Ok(merged)
}
