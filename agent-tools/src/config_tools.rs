//! Registry configuration read and publish tools.
//!
//! Unlike the lookup tools these never fail the invocation: registry errors
//! are reported in the `{success: false, error}` envelope.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::warn;

use crate::context::BridgeContext;
use crate::params::Params;
use crate::registry::{Tool, ToolError, ToolMetadata, ToolParameter, ToolResult};

/// Tool id of [`ReadConfig`].
pub const READ_CONFIG: &str = "read_config";
/// Tool id of [`PublishConfig`].
pub const PUBLISH_CONFIG: &str = "publish_config";

fn key_parameters() -> Vec<ToolParameter> {
    vec![
        ToolParameter::optional("namespace_id", "registry namespace, defaults to public"),
        ToolParameter::required("data_id", "configuration data id"),
        ToolParameter::required("group_name", "configuration group"),
    ]
}

fn failure(tool: &str, err: &ToolError) -> Value {
    warn!(tool, %err, "config operation failed");
    json!({ "success": false, "error": err.to_string() })
}

/// Reads one configuration entry.
#[derive(Debug)]
pub struct ReadConfig {
    ctx: Arc<BridgeContext>,
}

impl ReadConfig {
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
        Ok(ToolMetadata::new(READ_CONFIG)?
            .with_description("Read a configuration entry from the registry")
            .with_parameters(key_parameters()))
    }

    async fn read(&self, params: Params<'_>) -> ToolResult<String> {
        let target = self.ctx.target(params.str("namespace_id"))?;
        let data_id = params.required_str("data_id")?;
        let group = params.required_str("group_name")?;
        let session = self.ctx.connector().connect(&target).await?;
        Ok(session
            .get_config(target.namespace_id(), data_id, group)
            .await?)
    }
}

#[async_trait]
impl Tool for ReadConfig {
    async fn invoke(&self, input: Value) -> ToolResult<Value> {
        let params = Params::new(&input)?;
        Ok(match self.read(params).await {
            Ok(config) => json!({ "success": true, "config": config }),
            Err(err) => failure(READ_CONFIG, &err),
        })
    }
}

/// Publishes one configuration entry.
#[derive(Debug)]
pub struct PublishConfig {
    ctx: Arc<BridgeContext>,
}

impl PublishConfig {
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
        let mut parameters = key_parameters();
        parameters.push(ToolParameter::required("content", "configuration content"));
        Ok(ToolMetadata::new(PUBLISH_CONFIG)?
            .with_description("Publish a configuration entry to the registry")
            .with_parameters(parameters))
    }

    async fn publish(&self, params: Params<'_>) -> ToolResult<bool> {
        let target = self.ctx.target(params.str("namespace_id"))?;
        let data_id = params.required_str("data_id")?;
        let group = params.required_str("group_name")?;
        let content = params.raw_str("content")?;
        let session = self.ctx.connector().connect(&target).await?;
        Ok(session
            .publish_config(target.namespace_id(), data_id, group, content)
            .await?)
    }
}

#[async_trait]
impl Tool for PublishConfig {
    async fn invoke(&self, input: Value) -> ToolResult<Value> {
        let params = Params::new(&input)?;
        Ok(match self.publish(params).await {
            Ok(published) => json!({ "success": true, "result": published }),
            Err(err) => failure(PUBLISH_CONFIG, &err),
        })
    }
}
