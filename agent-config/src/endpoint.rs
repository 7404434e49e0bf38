use agent_primitives::{AgentCard, AgentSkill, Result};
use serde::Deserialize;

const DEFAULT_AGENT_NAME: &str = "Dify A2A Agent";
const DEFAULT_AGENT_DESCRIPTION: &str = "A2A Agent powered by Dify";
const DEFAULT_AGENT_URL: &str = "http://localhost/";
const DEFAULT_AGENT_VERSION: &str = "1.0.0";

/// Host application exposed through the A2A endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AppSelector {
    /// Identifier of the host application.
    #[serde(default)]
    pub app_id: String,
}

/// Settings of the A2A server endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EndpointSettings {
    /// Advertised agent name.
    #[serde(default = "default_name")]
    pub agent_name: String,
    /// Advertised agent description.
    #[serde(default = "default_description")]
    pub agent_description: String,
    /// Public URL of the endpoint.
    #[serde(default = "default_url")]
    pub agent_url: String,
    /// Advertised version.
    #[serde(default = "default_version")]
    pub agent_version: String,
    /// Application handling incoming messages.
    #[serde(default)]
    pub app: AppSelector,
}

fn default_name() -> String {
    DEFAULT_AGENT_NAME.to_owned()
}

fn default_description() -> String {
    DEFAULT_AGENT_DESCRIPTION.to_owned()
}

fn default_url() -> String {
    DEFAULT_AGENT_URL.to_owned()
}

fn default_version() -> String {
    DEFAULT_AGENT_VERSION.to_owned()
}

impl Default for EndpointSettings {
    fn default() -> Self {
        Self {
            agent_name: default_name(),
            agent_description: default_description(),
            agent_url: default_url(),
            agent_version: default_version(),
            app: AppSelector::default(),
        }
    }
}

impl EndpointSettings {
    /// Builds the Agent Card advertised by this endpoint.
    ///
    /// The card carries a single `dify_app` skill and text input/output modes.
    ///
    /// # Errors
    ///
    /// Returns [`agent_primitives::Error::InvalidAgentCard`] when the name or
    /// url is blank.
    pub fn agent_card(&self) -> Result<AgentCard> {
        let skill = AgentSkill {
            id: "dify_app".to_owned(),
            name: self.agent_name.clone(),
            description: self.agent_description.clone(),
            tags: vec!["dify".to_owned(), "chatbot".to_owned()],
            examples: vec!["Hello".to_owned(), "Help me with...".to_owned()],
            ..AgentSkill::default()
        };

        AgentCard::builder()
            .name(self.agent_name.clone())?
            .description(self.agent_description.clone())
            .url(self.agent_url.clone())?
            .version(self.agent_version.clone())
            .modes(vec!["text".to_owned()], vec!["text".to_owned()])
            .add_skill(skill)
            .build()
    }

    /// Returns the configured application id, if non-empty.
    #[must_use]
    pub fn app_id(&self) -> Option<&str> {
        Some(self.app.app_id.as_str()).filter(|id| !id.is_empty())
    }
}
