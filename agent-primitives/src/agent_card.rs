//! Agent Card: the self-describing descriptor exchanged for agent discovery.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Error, Result};

/// Descriptor of an agent's identity, endpoint, and skills.
///
/// Cards are immutable once fetched; a refresh produces a new value. Optional
/// fields are omitted from the serialized form when absent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentCard {
    /// Display name of the agent.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Endpoint where the agent accepts A2A requests.
    pub url: String,
    /// Version of the agent.
    pub version: String,
    /// A2A protocol version advertised by the agent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol_version: Option<String>,
    /// Transport the agent prefers (for example `JSONRPC`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_transport: Option<String>,
    /// Media types accepted as input.
    #[serde(default)]
    pub default_input_modes: Vec<String>,
    /// Media types produced as output.
    #[serde(default)]
    pub default_output_modes: Vec<String>,
    /// Skills offered by the agent.
    #[serde(default)]
    pub skills: Vec<AgentSkill>,
    /// Optional capability flags.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capabilities: Option<AgentCapabilities>,
    /// Organization publishing the agent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<AgentProvider>,
    /// Link to human-readable documentation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation_url: Option<String>,
    /// Link to an icon.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
}

impl AgentCard {
    /// Starts building an [`AgentCard`].
    #[must_use]
    pub fn builder() -> AgentCardBuilder {
        AgentCardBuilder::default()
    }

    /// Parses and validates a card from a JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAgentCard`] carrying the diagnostic when the value
    /// does not match the card schema or fails validation.
    pub fn from_value(value: Value) -> Result<Self> {
        let card: Self =
            serde_json::from_value(value).map_err(|err| Error::invalid_card(err.to_string()))?;
        card.validate()?;
        Ok(card)
    }

    /// Checks the structural invariants of the card.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAgentCard`] when the name or url is blank.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::invalid_card("name cannot be empty"));
        }
        if self.url.trim().is_empty() {
            return Err(Error::invalid_card("url cannot be empty"));
        }
        Ok(())
    }

    /// Returns the `(name, version)` pair identifying this card.
    #[must_use]
    pub fn identity(&self) -> (&str, &str) {
        (&self.name, &self.version)
    }

    /// Serializes the card with absent optional fields omitted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if serialization fails.
    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Skill advertised by an agent.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentSkill {
    /// Unique skill identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Skill description.
    pub description: String,
    /// Keywords for discovery.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Example prompts.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<String>,
    /// Input media types overriding the card defaults.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_modes: Option<Vec<String>>,
    /// Output media types overriding the card defaults.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_modes: Option<Vec<String>>,
}

/// Optional protocol capability flags.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentCapabilities {
    /// Agent supports streaming responses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub streaming: Option<bool>,
    /// Agent supports push notifications.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub push_notifications: Option<bool>,
    /// Agent exposes task state transition history.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_transition_history: Option<bool>,
}

/// Organization publishing an agent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentProvider {
    /// Organization name.
    pub organization: String,
    /// Organization website.
    pub url: String,
}

/// Builder for [`AgentCard`].
#[derive(Debug, Default)]
pub struct AgentCardBuilder {
    name: Option<String>,
    description: String,
    url: Option<String>,
    version: Option<String>,
    input_modes: Vec<String>,
    output_modes: Vec<String>,
    skills: Vec<AgentSkill>,
    capabilities: Option<AgentCapabilities>,
}

impl AgentCardBuilder {
    /// Sets the agent name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAgentCard`] when the name is blank.
    pub fn name(mut self, name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(Error::invalid_card("name cannot be empty"));
        }
        self.name = Some(name);
        Ok(self)
    }

    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the endpoint url.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAgentCard`] when the url is blank.
    pub fn url(mut self, url: impl Into<String>) -> Result<Self> {
        let url = url.into();
        if url.trim().is_empty() {
            return Err(Error::invalid_card("url cannot be empty"));
        }
        self.url = Some(url);
        Ok(self)
    }

    /// Sets the version string.
    #[must_use]
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Sets both default input and output modes.
    #[must_use]
    pub fn modes(mut self, input: Vec<String>, output: Vec<String>) -> Self {
        self.input_modes = input;
        self.output_modes = output;
        self
    }

    /// Appends a skill.
    #[must_use]
    pub fn add_skill(mut self, skill: AgentSkill) -> Self {
        self.skills.push(skill);
        self
    }

    /// Sets the capability flags.
    #[must_use]
    pub fn capabilities(mut self, capabilities: AgentCapabilities) -> Self {
        self.capabilities = Some(capabilities);
        self
    }

    /// Consumes the builder and returns the card.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAgentCard`] if the name or url was never set.
    pub fn build(self) -> Result<AgentCard> {
        let name = self
            .name
            .ok_or_else(|| Error::invalid_card("name must be provided"))?;
        let url = self
            .url
            .ok_or_else(|| Error::invalid_card("url must be provided"))?;

        Ok(AgentCard {
            name,
            description: self.description,
            url,
            version: self.version.unwrap_or_else(|| "1.0.0".to_owned()),
            protocol_version: None,
            preferred_transport: None,
            default_input_modes: self.input_modes,
            default_output_modes: self.output_modes,
            skills: self.skills,
            capabilities: self.capabilities,
            provider: None,
            documentation_url: None,
            icon_url: None,
        })
    }
}
