//! Strongly typed bridge tunables.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Namespace used when callers leave it empty.
pub const DEFAULT_NAMESPACE: &str = "public";

/// Runtime tunables shared by every bridge component.
///
/// Every field has a default so partial files and environment overrides are
/// merged onto a complete value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Namespace applied when a caller leaves it blank.
    pub default_namespace: String,
    /// Timeout for direct Agent Card fetches, in seconds.
    pub card_fetch_timeout_secs: u64,
    /// Timeout for a full agent-to-agent message exchange, in seconds.
    pub agent_call_timeout_secs: u64,
    /// Timeout applied to each registry RPC, in seconds.
    pub registry_timeout_secs: u64,
    /// Timeout for MCP handshake and list/call operations, in seconds.
    pub mcp_timeout_secs: u64,
    /// Validity window of cached Agent Cards, in seconds.
    pub cache_ttl_secs: u64,
    /// Maximum number of blocking calls executing at once.
    pub max_concurrent_calls: usize,
    /// `User-Agent` header sent on outbound HTTP requests.
    pub http_user_agent: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            default_namespace: DEFAULT_NAMESPACE.to_owned(),
            card_fetch_timeout_secs: 10,
            agent_call_timeout_secs: 600,
            registry_timeout_secs: 30,
            mcp_timeout_secs: 60,
            cache_ttl_secs: 15,
            max_concurrent_calls: 16,
            http_user_agent: concat!("a2a-bridge/", env!("CARGO_PKG_VERSION")).to_owned(),
        }
    }
}

impl BridgeConfig {
    /// Timeout for direct Agent Card fetches.
    #[must_use]
    pub const fn card_fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.card_fetch_timeout_secs)
    }

    /// Timeout for agent-to-agent message exchange.
    #[must_use]
    pub const fn agent_call_timeout(&self) -> Duration {
        Duration::from_secs(self.agent_call_timeout_secs)
    }

    /// Timeout for each registry RPC.
    #[must_use]
    pub const fn registry_timeout(&self) -> Duration {
        Duration::from_secs(self.registry_timeout_secs)
    }

    /// Timeout for MCP operations.
    #[must_use]
    pub const fn mcp_timeout(&self) -> Duration {
        Duration::from_secs(self.mcp_timeout_secs)
    }

    /// Agent Card cache TTL.
    #[must_use]
    pub const fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Returns `namespace` unless it is blank, in which case the default namespace.
    #[must_use]
    pub fn namespace_or_default<'a>(&'a self, namespace: &'a str) -> &'a str {
        if namespace.trim().is_empty() {
            &self.default_namespace
        } else {
            namespace
        }
    }

    /// Validates that all tunables are usable.
    ///
    /// # Errors
    ///
    /// Returns [`agent_primitives::Error::Config`] naming the first invalid field.
    pub fn validate(&self) -> agent_primitives::Result<()> {
        let durations = [
            ("card_fetch_timeout_secs", self.card_fetch_timeout_secs),
            ("agent_call_timeout_secs", self.agent_call_timeout_secs),
            ("registry_timeout_secs", self.registry_timeout_secs),
            ("mcp_timeout_secs", self.mcp_timeout_secs),
            ("cache_ttl_secs", self.cache_ttl_secs),
        ];
        if let Some((field, _)) = durations.iter().find(|(_, secs)| *secs == 0) {
            return Err(agent_primitives::Error::config(format!(
                "{field} must be greater than zero"
            )));
        }
        if self.max_concurrent_calls == 0 {
            return Err(agent_primitives::Error::config(
                "max_concurrent_calls must be greater than zero",
            ));
        }
        if self.default_namespace.trim().is_empty() {
            return Err(agent_primitives::Error::config(
                "default_namespace cannot be empty",
            ));
        }
        Ok(())
    }
}
