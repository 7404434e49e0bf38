//! JSON-RPC 2.0 envelopes shared by the A2A and MCP transports.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::traits::{AdapterError, AdapterResult};

/// Protocol version string.
pub const JSONRPC_VERSION: &str = "2.0";

/// Outgoing request or notification.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcRequest {
    jsonrpc: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<Value>,
    method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    params: Option<Value>,
}

impl JsonRpcRequest {
    /// Creates a request expecting a response with the same `id`.
    #[must_use]
    pub fn new(id: impl Into<Value>, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id: Some(id.into()),
            method: method.into(),
            params,
        }
    }

    /// Creates a notification, which carries no `id` and gets no response.
    #[must_use]
    pub fn notification(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id: None,
            method: method.into(),
            params,
        }
    }

    /// Returns the request id.
    #[must_use]
    pub const fn id(&self) -> Option<&Value> {
        self.id.as_ref()
    }
}

/// Incoming response.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcResponse {
    /// Echoed request id.
    #[serde(default)]
    pub id: Option<Value>,
    /// Result on success.
    #[serde(default)]
    pub result: Option<Value>,
    /// Error on failure.
    #[serde(default)]
    pub error: Option<JsonRpcError>,
}

/// Error object of a failed call.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcError {
    /// Error code.
    pub code: i64,
    /// Short description.
    pub message: String,
    /// Optional details.
    #[serde(default)]
    pub data: Option<Value>,
}

impl JsonRpcResponse {
    /// Returns the result, converting an error object into [`AdapterError::Rpc`].
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Rpc`] for error responses and
    /// [`AdapterError::Protocol`] when neither result nor error is present.
    pub fn into_result(self) -> AdapterResult<Value> {
        if let Some(error) = self.error {
            return Err(AdapterError::Rpc {
                code: error.code,
                message: error.message,
            });
        }
        self.result
            .ok_or_else(|| AdapterError::protocol("JSON-RPC response carries neither result nor error"))
    }
}
