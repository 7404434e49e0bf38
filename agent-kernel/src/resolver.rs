//! Agent Card resolution by direct URL or registry name, singly or in batches.

use std::collections::BTreeMap;
use std::sync::Arc;

use agent_adapters::AgentCardFetcher;
use agent_primitives::AgentCard;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::error::{ResolveError, ResolveResult};
use crate::registry::{RegistryConnector, RegistryTarget};

/// Discovery type selecting a card fetched from a URL.
pub const DISCOVERY_URL: &str = "url";
/// Discovery type selecting a card registered in the registry.
pub const DISCOVERY_REGISTRY: &str = "registry";
const DISCOVERY_REGISTRY_ALIAS: &str = "nacos";

/// Reference to one agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentReference {
    /// Card published at a URL.
    Url {
        /// Card location.
        url: String,
    },
    /// Card registered under a name in a registry namespace.
    Registry {
        /// Registry and namespace to query.
        target: RegistryTarget,
        /// Registered agent name.
        agent_name: String,
        /// Version to select; latest when absent.
        version: Option<String>,
    },
}

impl AgentReference {
    /// Creates a URL reference.
    #[must_use]
    pub fn url(url: impl Into<String>) -> Self {
        Self::Url { url: url.into() }
    }

    /// Creates a registry reference to the latest version of `agent_name`.
    #[must_use]
    pub fn registry(target: RegistryTarget, agent_name: impl Into<String>) -> Self {
        Self::Registry {
            target,
            agent_name: agent_name.into(),
            version: None,
        }
    }

    /// Builds a reference from caller parameters.
    ///
    /// `discovery_type` is `url` or `registry` (`nacos` is accepted as an alias).
    /// The registry target is only built when it is needed.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Config`] when the type is unknown or the field it
    /// requires is missing.
    pub fn from_parts(
        discovery_type: &str,
        url: Option<&str>,
        agent_name: Option<&str>,
        target: impl FnOnce() -> agent_primitives::Result<RegistryTarget>,
    ) -> ResolveResult<Self> {
        match discovery_type {
            DISCOVERY_URL => {
                let url = non_blank(url).ok_or_else(|| {
                    ResolveError::config("when type is url, a2a_agent_url is required")
                })?;
                Ok(Self::url(url))
            }
            DISCOVERY_REGISTRY | DISCOVERY_REGISTRY_ALIAS => {
                let name = non_blank(agent_name).ok_or_else(|| {
                    ResolveError::config("when type is registry, a2a_agent_name is required")
                })?;
                Ok(Self::registry(target()?, name))
            }
            other => Err(ResolveError::config(format!(
                "unknown discovery type `{other}`: expected `url` or `registry`"
            ))),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.trim().is_empty())
}

/// Declared set of agents a batch may address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentBatchSpec {
    /// Agents registered in a registry namespace.
    Registry {
        /// Registry and namespace to query.
        target: RegistryTarget,
        /// Names callers may request.
        available: Vec<String>,
    },
    /// Agents addressed by URL, keyed by caller alias.
    Url {
        /// Alias to card URL.
        available: BTreeMap<String, String>,
    },
}

impl AgentBatchSpec {
    /// Parses a comma-separated list of registered agent names.
    #[must_use]
    pub fn registry(target: RegistryTarget, names_csv: &str) -> Self {
        let available = names_csv
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_owned)
            .collect();
        Self::Registry { target, available }
    }

    /// Parses a JSON object mapping alias to card URL.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Config`] when the input is not a JSON object of strings.
    pub fn url(mapping_json: &str) -> ResolveResult<Self> {
        let available: BTreeMap<String, String> = serde_json::from_str(mapping_json)
            .map_err(|err| ResolveError::config(format!("invalid agent url mapping: {err}")))?;
        Ok(Self::Url { available })
    }

    /// Builds a batch spec from caller parameters.
    ///
    /// `available` is a JSON alias-to-url object for `url` discovery and a
    /// comma-separated name list for `registry` discovery.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Config`] for an unknown discovery type, a
    /// malformed mapping, or a missing registry target.
    pub fn from_parts(
        discovery_type: &str,
        available: &str,
        target: impl FnOnce() -> agent_primitives::Result<RegistryTarget>,
    ) -> ResolveResult<Self> {
        match discovery_type {
            DISCOVERY_URL => Self::url(available),
            DISCOVERY_REGISTRY | DISCOVERY_REGISTRY_ALIAS => Ok(Self::registry(target()?, available)),
            other => Err(ResolveError::config(format!(
                "unknown discovery type `{other}`: expected `url` or `registry`"
            ))),
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            Self::Registry { available, .. } => available.is_empty(),
            Self::Url { available } => available.is_empty(),
        }
    }

    /// Returns the reference for `name`, rejecting names outside the declared set.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Config`] when nothing is available or `name` is
    /// not a member.
    pub fn reference_for(&self, name: &str) -> ResolveResult<AgentReference> {
        if self.is_empty() {
            return Err(ResolveError::config("no agents are available"));
        }
        let missing = || ResolveError::config(format!("agent `{name}` is not in the available list"));
        match self {
            Self::Registry { target, available } => available
                .iter()
                .any(|candidate| candidate == name)
                .then(|| AgentReference::registry(target.clone(), name))
                .ok_or_else(missing),
            Self::Url { available } => available
                .get(name)
                .map(AgentReference::url)
                .ok_or_else(missing),
        }
    }
}

/// Per-name results of a batch resolution, in request order.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    entries: Vec<(String, ResolveResult<AgentCard>)>,
}

impl BatchOutcome {
    /// Outcome recorded for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ResolveResult<AgentCard>> {
        self.entries
            .iter()
            .find(|(alias, _)| alias == name)
            .map(|(_, outcome)| outcome)
    }

    /// Number of recorded outcomes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when nothing was requested.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates outcomes in request order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ResolveResult<AgentCard>)> {
        self.entries
            .iter()
            .map(|(alias, outcome)| (alias.as_str(), outcome))
    }

    /// Renders each entry as `{agent_name, description, skills}` or `{agent_name, error}`.
    ///
    /// `agent_name` is the caller's alias, not the card's own name.
    #[must_use]
    pub fn to_json(&self) -> Vec<Value> {
        self.iter()
            .map(|(alias, outcome)| match outcome {
                Ok(card) => json!({
                    "agent_name": alias,
                    "description": card.description,
                    "skills": card.skills,
                }),
                Err(err) => json!({
                    "agent_name": alias,
                    "error": err.to_string(),
                }),
            })
            .collect()
    }
}

/// Resolves agent references to Agent Cards.
#[derive(Clone)]
pub struct AgentResolver {
    fetcher: Arc<dyn AgentCardFetcher>,
    connector: Arc<dyn RegistryConnector>,
}

impl std::fmt::Debug for AgentResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentResolver").finish_non_exhaustive()
    }
}

impl AgentResolver {
    /// Creates a resolver over a direct fetcher and a registry connector.
    #[must_use]
    pub fn new(fetcher: Arc<dyn AgentCardFetcher>, connector: Arc<dyn RegistryConnector>) -> Self {
        Self { fetcher, connector }
    }

    /// Resolves one reference.
    ///
    /// # Errors
    ///
    /// URL references fail with [`ResolveError::Fetch`]; registry references
    /// propagate the registry failure as [`ResolveError::Backend`].
    pub async fn resolve_single(&self, reference: &AgentReference) -> ResolveResult<AgentCard> {
        match reference {
            AgentReference::Url { url } => {
                self.fetcher.fetch_card(url).await.map_err(ResolveError::Fetch)
            }
            AgentReference::Registry {
                target,
                agent_name,
                version,
            } => {
                debug!(%agent_name, namespace = target.namespace_id(), "resolving agent from registry");
                let session = self.connector.connect(target).await?;
                let card = session
                    .get_agent_card(target.namespace_id(), agent_name, version.as_deref())
                    .await?;
                Ok(card)
            }
        }
    }

    /// Resolves each of `names` independently against `spec`.
    ///
    /// Names outside the declared set fail with a configuration error before
    /// any network access. One failure never affects the other names.
    pub async fn resolve_batch(&self, spec: &AgentBatchSpec, names: &[String]) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();
        for name in names {
            let result = match spec.reference_for(name) {
                Ok(reference) => self.resolve_single(&reference).await,
                Err(err) => Err(err),
            };
            if let Err(err) = &result {
                warn!(agent_name = %name, %err, "agent resolution failed");
            }
            outcome.entries.push((name.clone(), result));
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::mock::{MockConnector, MockRegistry};
    use crate::test_support::card;
    use agent_adapters::{AdapterError, AdapterResult};
    use agent_config::RegistryCredentials;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct MockFetcher {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl AgentCardFetcher for MockFetcher {
        async fn fetch_card(&self, url: &str) -> AdapterResult<AgentCard> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if url.contains("down") {
                return Err(AdapterError::Http {
                    status: 503,
                    url: url.to_owned(),
                    reason: "network communication error".into(),
                });
            }
            Ok(card("remote-name", "from url", url))
        }
    }

    fn target() -> RegistryTarget {
        RegistryTarget::new(RegistryCredentials::new("10.0.0.1"), "public").unwrap()
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|name| (*name).to_owned()).collect()
    }

    fn resolver(registry: Arc<MockRegistry>) -> (AgentResolver, Arc<MockFetcher>) {
        let fetcher = Arc::new(MockFetcher::default());
        let resolver = AgentResolver::new(fetcher.clone(), Arc::new(MockConnector(registry)));
        (resolver, fetcher)
    }

    #[tokio::test]
    async fn url_reference_uses_fetcher() {
        let (resolver, fetcher) = resolver(Arc::new(MockRegistry::default()));
        let card = resolver
            .resolve_single(&AgentReference::url("http://agent/card"))
            .await
            .unwrap();
        assert_eq!(card.url, "http://agent/card");
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn registry_failure_propagates_as_backend() {
        let (resolver, _) = resolver(Arc::new(MockRegistry::default()));
        let err = resolver
            .resolve_single(&AgentReference::registry(target(), "ghost"))
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::Backend(_)));
    }

    #[tokio::test]
    async fn batch_rejects_unknown_names_without_network() {
        let registry = Arc::new(
            MockRegistry::default()
                .with_card(card("a", "first", "http://a/"))
                .with_card(card("b", "second", "http://b/")),
        );
        let (resolver, _) = resolver(registry.clone());
        let spec = AgentBatchSpec::registry(target(), "a, b");

        let outcome = resolver
            .resolve_batch(&spec, &names(&["a", "missing", "b"]))
            .await;

        assert_eq!(outcome.len(), 3);
        assert_eq!(outcome.get("a").unwrap().as_ref().unwrap().description, "first");
        assert!(outcome.get("missing").unwrap().as_ref().unwrap_err().is_config());
        assert_eq!(outcome.get("b").unwrap().as_ref().unwrap().description, "second");
        assert_eq!(registry.card_lookups.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn batch_isolates_network_failures() {
        let (resolver, fetcher) = resolver(Arc::new(MockRegistry::default()));
        let spec = AgentBatchSpec::url(
            r#"{"a": "http://a/card", "b": "http://down/card", "c": "http://c/card"}"#,
        )
        .unwrap();

        let outcome = resolver
            .resolve_batch(&spec, &names(&["b", "missing", "a"]))
            .await;

        assert!(matches!(outcome.get("b"), Some(Err(ResolveError::Fetch(_)))));
        assert!(outcome.get("missing").unwrap().as_ref().unwrap_err().is_config());
        assert!(outcome.get("a").unwrap().is_ok());
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn url_batch_reports_alias_not_card_name() {
        let (resolver, _) = resolver(Arc::new(MockRegistry::default()));
        let spec = AgentBatchSpec::url(r#"{"helper": "http://a/card"}"#).unwrap();
        let outcome = resolver.resolve_batch(&spec, &names(&["helper"])).await;

        let rendered = outcome.to_json();
        assert_eq!(rendered[0]["agent_name"], "helper");
        assert_eq!(rendered[0]["description"], "from url");
        assert_eq!(rendered[0]["skills"][0]["id"], "main");
    }

    #[tokio::test]
    async fn empty_available_set_rejects_everything() {
        let (resolver, fetcher) = resolver(Arc::new(MockRegistry::default()));
        let spec = AgentBatchSpec::registry(target(), " , ");
        let outcome = resolver.resolve_batch(&spec, &names(&["a"])).await;
        let rendered = outcome.to_json();
        assert_eq!(rendered[0]["error"], "configuration error: no agents are available");
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn malformed_url_mapping_is_config_error() {
        assert!(AgentBatchSpec::url("[1, 2]").unwrap_err().is_config());
        assert!(AgentBatchSpec::url(r#"{"a": 1}"#).unwrap_err().is_config());
    }

    #[test]
    fn reference_from_parts_checks_required_fields() {
        let err = AgentReference::from_parts("url", None, None, || Ok(target())).unwrap_err();
        assert!(err.is_config());

        let reference =
            AgentReference::from_parts("nacos", None, Some("weather"), || Ok(target())).unwrap();
        assert_eq!(reference, AgentReference::registry(target(), "weather"));

        let err = AgentReference::from_parts("registry", None, Some("weather"), || {
            RegistryTarget::new(RegistryCredentials::default(), "public")
        })
        .unwrap_err();
        assert!(err.is_config());

        assert!(AgentReference::from_parts("dns", None, None, || Ok(target())).is_err());
    }

    #[test]
    fn batch_spec_from_parts_selects_mode() {
        let target = || RegistryTarget::new(RegistryCredentials::new("h"), "public");
        let url = AgentBatchSpec::from_parts("url", r#"{"a": "http://a/"}"#, target).unwrap();
        assert_eq!(url.reference_for("a").unwrap(), AgentReference::url("http://a/"));

        let registry = AgentBatchSpec::from_parts("nacos", "a, b", target).unwrap();
        assert!(registry.reference_for("b").is_ok());

        assert!(AgentBatchSpec::from_parts("dns", "", target).unwrap_err().is_config());
    }
}
