//! Tool-server listing and invocation tools.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::error;

use crate::context::BridgeContext;
use crate::params::Params;
use crate::registry::{Tool, ToolMetadata, ToolParameter, ToolResult};

/// Tool id of [`ListServers`].
pub const LIST_SERVERS: &str = "list_mcp_servers";
/// Tool id of [`ListServerTools`].
pub const LIST_SERVER_TOOLS: &str = "list_mcp_server_tools";
/// Tool id of [`CallServerTool`].
pub const CALL_SERVER_TOOL: &str = "call_mcp_tool";

const DEFAULT_PAGE_NO: u32 = 1;
const DEFAULT_PAGE_SIZE: u32 = 20;

fn namespace_parameter() -> ToolParameter {
    ToolParameter::optional("namespace_id", "registry namespace, defaults to public")
}

/// Lists one page of registered tool servers reachable over HTTP.
#[derive(Debug)]
pub struct ListServers {
    ctx: Arc<BridgeContext>,
}

impl ListServers {
    /// Creates the tool.
    #[must_use]
    pub fn new(ctx: Arc<BridgeContext>) -> Self {
        Self { ctx }
    }

    /// Returns the tool metadata.
    ///
    /// # Errors
    ///
    /// Never fails for the built-in name.
    pub fn metadata() -> ToolResult<ToolMetadata> {
        Ok(ToolMetadata::new(LIST_SERVERS)?
            .with_description("List MCP servers registered in the registry")
            .with_parameters(vec![
                namespace_parameter(),
                ToolParameter::optional("page_no", "page to return, starting at 1"),
                ToolParameter::optional("page_size", "servers per page"),
            ]))
    }
}

#[async_trait]
impl Tool for ListServers {
    async fn invoke(&self, input: Value) -> ToolResult<Value> {
        let params = Params::new(&input)?;
        let page_no = params.u32_or("page_no", DEFAULT_PAGE_NO)?;
        let page_size = params.u32_or("page_size", DEFAULT_PAGE_SIZE)?;
        let target = self.ctx.target(params.str("namespace_id"))?;

        let page = self
            .ctx
            .mcp(target)
            .list_servers(page_no, page_size)
            .await
            .inspect_err(|err| error!(tool = LIST_SERVERS, %err, "server listing failed"))?;

        let servers: Vec<Value> = page
            .servers
            .iter()
            .map(|server| json!({ "name": server.name, "description": server.description }))
            .collect();
        Ok(json!({
            "result": {
                "totalCount": page.total_count,
                "pageNumber": page.page_number,
                "pagesAvailable": page.pages_available,
                "mcp_server_list": servers,
            }
        }))
    }
}

/// Lists the tools of one or more servers given as `a;b::1.0`.
#[derive(Debug)]
pub struct ListServerTools {
    ctx: Arc<BridgeContext>,
}

impl ListServerTools {
    /// Creates the tool.
    #[must_use]
    pub fn new(ctx: Arc<BridgeContext>) -> Self {
        Self { ctx }
    }

    /// Returns the tool metadata.
    ///
    /// # Errors
    ///
    /// Never fails for the built-in name.
    pub fn metadata() -> ToolResult<ToolMetadata> {
        Ok(ToolMetadata::new(LIST_SERVER_TOOLS)?
            .with_description("List the tools of MCP servers registered in the registry")
            .with_parameters(vec![
                namespace_parameter(),
                ToolParameter::required(
                    "mcp_server_name",
                    "`;`-separated servers, each `name` or `name::version`",
                ),
            ]))
    }
}

#[async_trait]
impl Tool for ListServerTools {
    async fn invoke(&self, input: Value) -> ToolResult<Value> {
        let params = Params::new(&input)?;
        let servers = params.required_str("mcp_server_name")?;
        let target = self.ctx.target(params.str("namespace_id"))?;

        let result = self
            .ctx
            .mcp(target)
            .resolve_many(servers)
            .await
            .inspect_err(|err| error!(tool = LIST_SERVER_TOOLS, %err, "tool listing failed"))?;
        Ok(json!({ "result": result }))
    }
}

/// Invokes one tool on a registered server.
#[derive(Debug)]
pub struct CallServerTool {
    ctx: Arc<BridgeContext>,
}

impl CallServerTool {
    /// Creates the tool.
    #[must_use]
    pub fn new(ctx: Arc<BridgeContext>) -> Self {
        Self { ctx }
    }

    /// Returns the tool metadata.
    ///
    /// # Errors
    ///
    /// Never fails for the built-in name.
    pub fn metadata() -> ToolResult<ToolMetadata> {
        Ok(ToolMetadata::new(CALL_SERVER_TOOL)?
            .with_description("Call a tool on an MCP server registered in the registry")
            .with_parameters(vec![
                namespace_parameter(),
                ToolParameter::required("mcp_server_name", "server, `name` or `name::version`"),
                ToolParameter::required("tool_name", "tool to call"),
                ToolParameter::required("arguments", "tool arguments as a JSON object string"),
            ]))
    }
}

#[async_trait]
impl Tool for CallServerTool {
    async fn invoke(&self, input: Value) -> ToolResult<Value> {
        let params = Params::new(&input)?;
        let server = params.required_str("mcp_server_name")?;
        let tool = params.required_str("tool_name")?;
        let arguments = params.raw_str("arguments")?;
        let target = self.ctx.target(params.str("namespace_id"))?;

        let result = self
            .ctx
            .mcp(target)
            .call_tool(server, tool, arguments)
            .await
            .inspect_err(|err| error!(tool = CALL_SERVER_TOOL, %err, "tool call failed"))?;
        Ok(json!({ "result": result }))
    }
}
