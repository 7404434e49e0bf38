//! MCP tool-server models as published by the registry.

use std::collections::HashMap;
use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Error, Result};

const VERSION_SEPARATOR: &str = "::";

/// Transport protocol a tool server is reachable over.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum McpProtocol {
    /// Server-sent events transport (`mcp-sse`).
    Sse,
    /// Streamable HTTP transport (`mcp-streamable`).
    Streamable,
    /// Any other protocol; rejected by the resolver.
    Other(String),
}

impl McpProtocol {
    /// Returns `true` for transports the bridge can open.
    #[must_use]
    pub const fn is_supported(&self) -> bool {
        matches!(self, Self::Sse | Self::Streamable)
    }

    /// Returns the registry identifier of the protocol.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Sse => "mcp-sse",
            Self::Streamable => "mcp-streamable",
            Self::Other(other) => other,
        }
    }
}

impl From<String> for McpProtocol {
    fn from(value: String) -> Self {
        match value.as_str() {
            "mcp-sse" => Self::Sse,
            "mcp-streamable" => Self::Streamable,
            _ => Self::Other(value),
        }
    }
}

impl From<&str> for McpProtocol {
    fn from(value: &str) -> Self {
        Self::from(value.to_owned())
    }
}

impl From<McpProtocol> for String {
    fn from(value: McpProtocol) -> Self {
        match value {
            McpProtocol::Other(other) => other,
            supported => supported.as_str().to_owned(),
        }
    }
}

impl Display for McpProtocol {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tool metadata as reported by a live server or the registry.
///
/// Fields other than name, description, and input schema are preserved verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    /// Tool name, unique within a server.
    pub name: String,
    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// JSON schema of the tool arguments.
    #[serde(default = "empty_object")]
    pub input_schema: Value,
    /// Any additional fields (annotations, output schema, title).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ToolDescriptor {
    /// Creates a descriptor with the supplied name and schema.
    #[must_use]
    pub fn new(name: impl Into<String>, description: Option<String>, input_schema: Value) -> Self {
        Self {
            name: name.into(),
            description,
            input_schema,
            extra: Map::new(),
        }
    }
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

/// Registry-side switch for a single tool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct McpToolMeta {
    /// `Some(false)` disables the tool.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

/// Tool overrides published in the registry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct McpToolSpec {
    /// Registry copies of tool descriptors.
    #[serde(default)]
    pub tools: Vec<ToolDescriptor>,
    /// Per-tool metadata keyed by tool name.
    #[serde(default)]
    pub tools_meta: HashMap<String, McpToolMeta>,
}

impl McpToolSpec {
    /// Returns `false` only when the registry explicitly disabled the tool.
    #[must_use]
    pub fn is_enabled(&self, tool_name: &str) -> bool {
        self.tools_meta
            .get(tool_name)
            .and_then(|meta| meta.enabled)
            .unwrap_or(true)
    }

    /// Looks up the registry copy of a tool by name.
    #[must_use]
    pub fn tool(&self, tool_name: &str) -> Option<&ToolDescriptor> {
        self.tools.iter().find(|tool| tool.name == tool_name)
    }
}

/// Live backend instance of a tool server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendEndpoint {
    /// Host name or IP address.
    pub address: String,
    /// TCP port.
    pub port: u16,
}

/// Registry detail of a tool server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct McpServerDetail {
    /// Server name.
    pub name: String,
    /// Server description.
    #[serde(default)]
    pub description: String,
    /// Published version, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Transport protocol.
    pub protocol: McpProtocol,
    /// Live endpoints.
    #[serde(default)]
    pub backend_endpoints: Vec<BackendEndpoint>,
    /// Path the server is exported under.
    #[serde(default)]
    pub export_path: String,
    /// Registry overrides for tools.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_spec: Option<McpToolSpec>,
}

/// Summary entry of a server listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerSummary {
    /// Server name.
    pub name: String,
    /// Server description.
    #[serde(default)]
    pub description: String,
    /// Transport protocol.
    pub protocol: McpProtocol,
}

/// One page of a server listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerPage {
    /// Total number of servers matching the query.
    pub total_count: u64,
    /// Page number returned.
    pub page_number: u64,
    /// Number of pages available.
    pub pages_available: u64,
    /// Servers on this page.
    pub servers: Vec<ServerSummary>,
}

/// Server reference of the form `name` or `name::version`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSpec {
    raw: String,
    name: String,
    version: Option<String>,
}

impl ServerSpec {
    /// Parses a server reference.
    ///
    /// A blank version (`name::`) selects the latest release.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the name is blank or the reference holds
    /// more than one `::` separator.
    pub fn parse(raw: &str) -> Result<Self> {
        let segments: Vec<&str> = raw.split(VERSION_SEPARATOR).collect();
        let (name, version) = match segments.as_slice() {
            [name] => (*name, None),
            [name, version] => {
                let version = version.trim();
                (*name, (!version.is_empty()).then(|| version.to_owned()))
            }
            _ => {
                return Err(Error::config(format!(
                    "malformed server reference `{raw}`: expected `name` or `name::version`"
                )));
            }
        };

        if name.trim().is_empty() {
            return Err(Error::config("server name is required"));
        }

        Ok(Self {
            raw: raw.to_owned(),
            name: name.to_owned(),
            version,
        })
    }

    /// Returns the reference as supplied by the caller.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Returns the server name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the requested version, if any.
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }
}

impl Display for ServerSpec {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_server_spec() {
        let plain = ServerSpec::parse("weather").unwrap();
        assert_eq!(plain.name(), "weather");
        assert_eq!(plain.version(), None);

        let versioned = ServerSpec::parse("weather::1.0.2").unwrap();
        assert_eq!(versioned.name(), "weather");
        assert_eq!(versioned.version(), Some("1.0.2"));
        assert_eq!(versioned.to_string(), "weather::1.0.2");
    }

    #[test]
    fn blank_version_means_latest() {
        let spec = ServerSpec::parse("weather::").unwrap();
        assert_eq!(spec.name(), "weather");
        assert_eq!(spec.version(), None);
        assert_eq!(ServerSpec::parse("weather:: ").unwrap().version(), None);
        assert_eq!(spec.to_string(), "weather::");
    }

    #[test]
    fn rejects_extra_separators() {
        let err = ServerSpec::parse("a::1::2").unwrap_err();
        assert!(err.is_config());
        assert!(ServerSpec::parse("::1").unwrap_err().is_config());
    }

    #[test]
    fn protocol_round_trips_through_strings() {
        assert_eq!(McpProtocol::from("mcp-sse"), McpProtocol::Sse);
        assert!(McpProtocol::from("mcp-streamable").is_supported());
        let other = McpProtocol::from("stdio");
        assert!(!other.is_supported());
        assert_eq!(serde_json::to_value(&other).unwrap(), json!("stdio"));
    }

    #[test]
    fn tool_descriptor_keeps_unknown_fields() {
        let tool: ToolDescriptor = serde_json::from_value(json!({
            "name": "search",
            "inputSchema": { "type": "object" },
            "annotations": { "readOnlyHint": true }
        }))
        .unwrap();
        assert_eq!(tool.extra["annotations"]["readOnlyHint"], true);

        let value = serde_json::to_value(&tool).unwrap();
        assert_eq!(value["inputSchema"]["type"], "object");
        assert!(value.get("description").is_none());
    }

    #[test]
    fn tools_enabled_unless_disabled() {
        let mut spec = McpToolSpec::default();
        spec.tools_meta
            .insert("off".into(), McpToolMeta { enabled: Some(false) });
        spec.tools_meta
            .insert("unset".into(), McpToolMeta { enabled: None });
        assert!(!spec.is_enabled("off"));
        assert!(spec.is_enabled("unset"));
        assert!(spec.is_enabled("absent"));
    }
}
