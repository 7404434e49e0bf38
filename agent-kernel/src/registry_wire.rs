//! Wire-level structures of the registry HTTP admin API.

use std::collections::HashMap;

use agent_primitives::{
    BackendEndpoint, McpProtocol, McpServerDetail, McpToolMeta, ServerPage, ServerSummary,
    ToolDescriptor,
};
use serde::Deserialize;

/// Status code the admin API uses for success.
pub(crate) const SUCCESS_CODE: i64 = 0;

/// Envelope wrapping every admin API response.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    /// Zero on success.
    pub code: i64,
    /// Diagnostic message.
    #[serde(default)]
    pub message: Option<String>,
    /// Payload.
    pub data: Option<T>,
}

/// Login response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LoginResponse {
    /// Token attached to later requests.
    pub access_token: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RemoteServerConfig {
    #[serde(default)]
    pub export_path: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct VersionDetail {
    #[serde(default)]
    pub version: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ToolSpecWire {
    #[serde(default)]
    pub tools: Option<Vec<ToolDescriptor>>,
    #[serde(default)]
    pub tools_meta: Option<HashMap<String, McpToolMeta>>,
}

/// Tool server detail as returned by the registry.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct McpServerDetailWire {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub protocol: McpProtocol,
    #[serde(default)]
    pub version_detail: Option<VersionDetail>,
    #[serde(default)]
    pub remote_server_config: Option<RemoteServerConfig>,
    #[serde(default)]
    pub backend_endpoints: Option<Vec<BackendEndpoint>>,
    #[serde(default)]
    pub tool_spec: Option<ToolSpecWire>,
}

impl From<McpServerDetailWire> for McpServerDetail {
    fn from(wire: McpServerDetailWire) -> Self {
        // a spec without a tool list carries no overrides at all
        let tool_spec = wire.tool_spec.and_then(|spec| {
            spec.tools.map(|tools| agent_primitives::McpToolSpec {
                tools,
                tools_meta: spec.tools_meta.unwrap_or_default(),
            })
        });
        Self {
            name: wire.name,
            description: wire.description.unwrap_or_default(),
            version: wire.version_detail.and_then(|detail| detail.version),
            protocol: wire.protocol,
            backend_endpoints: wire.backend_endpoints.unwrap_or_default(),
            export_path: wire
                .remote_server_config
                .map(|config| config.export_path)
                .unwrap_or_default(),
            tool_spec,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ServerSummaryWire {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub protocol: McpProtocol,
}

/// Page of the server listing.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ServerPageWire {
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub page_number: u64,
    #[serde(default)]
    pub pages_available: u64,
    #[serde(default)]
    pub page_items: Vec<ServerSummaryWire>,
}

impl From<ServerPageWire> for ServerPage {
    fn from(wire: ServerPageWire) -> Self {
        Self {
            total_count: wire.total_count,
            page_number: wire.page_number,
            pages_available: wire.pages_available,
            servers: wire
                .page_items
                .into_iter()
                .map(|item| ServerSummary {
                    name: item.name,
                    description: item.description.unwrap_or_default(),
                    protocol: item.protocol,
                })
                .collect(),
        }
    }
}
