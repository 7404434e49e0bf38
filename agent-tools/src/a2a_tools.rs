//! Agent discovery and invocation tools.

use std::sync::Arc;

use agent_adapters::AgentResponse;
use agent_kernel::{AgentBatchSpec, AgentReference, RegistryTarget};
use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::{error, info};

use crate::context::BridgeContext;
use crate::params::Params;
use crate::registry::{Tool, ToolError, ToolMetadata, ToolParameter, ToolResult};

/// Tool id of [`GetAgentInformation`].
pub const GET_AGENT_INFORMATION: &str = "get_a2a_agent_information";
/// Tool id of [`GetAgentsInformation`].
pub const GET_AGENTS_INFORMATION: &str = "get_a2a_agents_information";
/// Tool id of [`CallAgent`].
pub const CALL_AGENT: &str = "call_a2a_agent";

fn reference(ctx: &BridgeContext, params: Params<'_>) -> ToolResult<AgentReference> {
    let discovery = params.required_str("type")?;
    Ok(AgentReference::from_parts(
        discovery,
        params.str("a2a_agent_url"),
        params.str("a2a_agent_name"),
        || registry_target(ctx, params),
    )?)
}

fn registry_target(
    ctx: &BridgeContext,
    params: Params<'_>,
) -> agent_primitives::Result<RegistryTarget> {
    ctx.target(params.str("namespace_id"))
        .map_err(|err| agent_primitives::Error::config(err.to_string()))
}

fn reference_parameters() -> Vec<ToolParameter> {
    vec![
        ToolParameter::required("type", "discovery type: `url` or `registry`"),
        ToolParameter::optional("a2a_agent_url", "Agent Card url, when type is url"),
        ToolParameter::optional("a2a_agent_name", "registered agent name, when type is registry"),
        ToolParameter::optional("namespace_id", "registry namespace, defaults to public"),
    ]
}

/// Looks up one agent's card and reports its name, description, and skills.
#[derive(Debug)]
pub struct GetAgentInformation {
    ctx: Arc<BridgeContext>,
}

impl GetAgentInformation {
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
        Ok(ToolMetadata::new(GET_AGENT_INFORMATION)?
            .with_description("Fetch the Agent Card of one A2A agent")
            .with_parameters(reference_parameters()))
    }
}

#[async_trait]
impl Tool for GetAgentInformation {
    async fn invoke(&self, input: Value) -> ToolResult<Value> {
        let params = Params::new(&input)?;
        let reference = reference(&self.ctx, params)?;
        let card = self
            .ctx
            .resolver()
            .resolve_single(&reference)
            .await
            .inspect_err(|err| error!(tool = GET_AGENT_INFORMATION, %err, "agent lookup failed"))?;
        Ok(json!({
            "name": card.name,
            "description": card.description,
            "skills": card.skills,
        }))
    }
}

/// Looks up several agents from a declared set, isolating per-agent failures.
#[derive(Debug)]
pub struct GetAgentsInformation {
    ctx: Arc<BridgeContext>,
}

impl GetAgentsInformation {
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
        Ok(ToolMetadata::new(GET_AGENTS_INFORMATION)?
            .with_description("Fetch the Agent Cards of several A2A agents")
            .with_parameters(vec![
                ToolParameter::required("type", "discovery type: `url` or `registry`"),
                ToolParameter::required(
                    "available_agents",
                    "comma-separated registered names, or a JSON object of alias to Agent Card url",
                ),
                ToolParameter::required("target_agents", "comma-separated agents to look up"),
                ToolParameter::optional("namespace_id", "registry namespace, defaults to public"),
            ]))
    }

    fn spec(&self, params: Params<'_>) -> ToolResult<AgentBatchSpec> {
        Ok(AgentBatchSpec::from_parts(
            params.required_str("type")?,
            params.raw_str("available_agents")?,
            || registry_target(&self.ctx, params),
        )?)
    }
}

#[async_trait]
impl Tool for GetAgentsInformation {
    async fn invoke(&self, input: Value) -> ToolResult<Value> {
        let params = Params::new(&input)?;
        let spec = self.spec(params)?;
        let names: Vec<String> = params
            .raw_str("target_agents")?
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_owned)
            .collect();

        let outcome = self.ctx.resolver().resolve_batch(&spec, &names).await;
        info!(
            tool = GET_AGENTS_INFORMATION,
            requested = names.len(),
            "batch agent lookup finished"
        );
        Ok(json!({ "result": outcome.to_json() }))
    }
}

/// Sends a query to one agent and returns its final response.
#[derive(Debug)]
pub struct CallAgent {
    ctx: Arc<BridgeContext>,
}

impl CallAgent {
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
        let mut parameters = reference_parameters();
        parameters.push(ToolParameter::required("query", "message sent to the agent"));
        parameters.push(ToolParameter::optional(
            "conversation_id",
            "conversation to continue; a new one is started when absent",
        ));
        Ok(ToolMetadata::new(CALL_AGENT)?
            .with_description("Send a message to an A2A agent")
            .with_parameters(parameters))
    }
}

#[async_trait]
impl Tool for CallAgent {
    async fn invoke(&self, input: Value) -> ToolResult<Value> {
        let params = Params::new(&input)?;
        let reference = reference(&self.ctx, params)?;
        let query = params.raw_str("query")?;
        let conversation = params.str("conversation_id").map(str::to_owned);

        let response = self
            .ctx
            .invoker()
            .call(&reference, query, conversation)
            .await
            .inspect_err(|err| error!(tool = CALL_AGENT, %err, "agent call failed"))?;
        Ok(json!({ "result": response_json(&response)? }))
    }
}

/// Serializes the final item of an agent exchange.
///
/// Task updates report the task snapshot, which already reflects the update.
///
/// # Errors
///
/// Returns [`ToolError::Execution`] if serialization fails.
pub fn response_json(response: &AgentResponse) -> ToolResult<Value> {
    let value = match response {
        AgentResponse::DirectMessage(message) => serde_json::to_value(message),
        AgentResponse::TaskUpdate { task, .. } => serde_json::to_value(task),
    };
    value.map_err(|err| ToolError::execution(format!("failed to encode agent response: {err}")))
}
