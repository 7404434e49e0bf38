//! Change-detected Agent Card registration.

use std::sync::Arc;

use agent_memory::{AgentCardCache, CacheKey};
use agent_primitives::AgentCard;
use agent_telemetry::{RegistrationOutcome, registration_event};

use crate::error::{ResolveError, ResolveResult};
use crate::registry::{RegistryConnector, RegistryResult, RegistryTarget};

/// Returns `true` when `current` differs from `cached` in name, description, or url.
///
/// Version and skills are not compared, so a skills-only change is not
/// re-registered.
#[must_use]
pub fn needs_registration(current: &AgentCard, cached: Option<&AgentCard>) -> bool {
    cached.is_none_or(|cached| {
        current.name != cached.name
            || current.description != cached.description
            || current.url != cached.url
    })
}

/// Keeps the registry's copy of a locally built Agent Card up to date.
pub struct AgentCardPublisher {
    connector: Arc<dyn RegistryConnector>,
    cache: Arc<AgentCardCache>,
}

impl std::fmt::Debug for AgentCardPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentCardPublisher")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl AgentCardPublisher {
    /// Creates a publisher.
    #[must_use]
    pub fn new(connector: Arc<dyn RegistryConnector>, cache: Arc<AgentCardCache>) -> Self {
        Self { connector, cache }
    }

    /// Registers `card` when it differs from the last known registered copy.
    ///
    /// Registration is best effort: failures are reported through the
    /// registration event and `card` is returned unchanged either way.
    pub async fn sync(&self, target: &RegistryTarget, card: AgentCard) -> AgentCard {
        let key = CacheKey::for_card(target.address(), target.namespace_id(), &card);
        let cached = self
            .cache
            .get_or_fetch(&key, || self.fetch_registered(target, &card.name, &card.version))
            .await;

        if !needs_registration(&card, cached.as_ref()) {
            registration_event(RegistrationOutcome::Skipped, &card.name, "registered card is current");
            return card;
        }

        match self.register(target, &card).await {
            Ok(()) => registration_event(RegistrationOutcome::Registered, &card.name, "card published"),
            Err(err) => registration_event(RegistrationOutcome::Failed, &card.name, &err.to_string()),
        }
        card
    }

    async fn fetch_registered(
        &self,
        target: &RegistryTarget,
        name: &str,
        version: &str,
    ) -> RegistryResult<AgentCard> {
        let session = self.connector.connect(target).await?;
        session
            .get_agent_card(target.namespace_id(), name, Some(version))
            .await
    }

    async fn register(&self, target: &RegistryTarget, card: &AgentCard) -> ResolveResult<()> {
        let failed = |reason: String| ResolveError::Registration {
            agent: card.name.clone(),
            reason,
        };
        let session = self
            .connector
            .connect(target)
            .await
            .map_err(|err| failed(err.to_string()))?;
        session
            .register_agent(card, target.namespace_id())
            .await
            .map_err(|err| failed(err.to_string()))?;

        // the registry may normalize fields, so cache its echo rather than the local card
        let echo = session
            .get_agent_card(target.namespace_id(), &card.name, Some(&card.version))
            .await
            .map_err(|err| failed(format!("registered but echo lookup failed: {err}")))?;
        self.cache
            .set_cached_agent_card(target.address(), target.namespace_id(), &echo)
            .await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::mock::{MockConnector, MockRegistry};
    use crate::test_support::card;
    use agent_config::RegistryCredentials;
    use agent_memory::{ManualClock, VolatileStore};
    use agent_primitives::AgentSkill;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    fn target() -> RegistryTarget {
        RegistryTarget::new(RegistryCredentials::new("10.0.0.1"), "public").unwrap()
    }

    fn publisher(registry: Arc<MockRegistry>) -> AgentCardPublisher {
        let cache = AgentCardCache::with_clock(
            Arc::new(VolatileStore::new()),
            Duration::from_secs(15),
            Arc::new(ManualClock::new(1_000)),
        );
        AgentCardPublisher::new(Arc::new(MockConnector(registry)), Arc::new(cache))
    }

    #[test]
    fn missing_cached_card_needs_registration() {
        let local = card("a", "desc", "http://a/");
        assert!(needs_registration(&local, None));
        assert!(!needs_registration(&local, Some(&local)));
    }

    #[test]
    fn material_fields_trigger_registration() {
        let local = card("a", "desc", "http://a/");
        let mut moved = local.clone();
        moved.url = "http://b/".into();
        assert!(needs_registration(&moved, Some(&local)));

        let mut described = local.clone();
        described.description = "other".into();
        assert!(needs_registration(&described, Some(&local)));
    }

    #[test]
    fn version_and_skills_are_ignored() {
        let local = card("a", "desc", "http://a/");
        let mut changed = local.clone();
        changed.version = "9.9.9".into();
        changed.skills.push(AgentSkill {
            id: "extra".into(),
            ..AgentSkill::default()
        });
        assert!(!needs_registration(&changed, Some(&local)));
    }

    #[tokio::test]
    async fn unchanged_card_is_not_registered_again() {
        let local = card("a", "desc", "http://a/");
        let registry = Arc::new(MockRegistry::default().with_card(local.clone()));
        let publisher = publisher(registry.clone());

        publisher.sync(&target(), local.clone()).await;
        publisher.sync(&target(), local).await;

        assert_eq!(registry.registrations.load(Ordering::SeqCst), 0);
        assert_eq!(registry.card_lookups.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn changed_card_is_registered_and_echo_cached() {
        let registry = Arc::new(MockRegistry::default().with_card(card("a", "old", "http://a/")));
        let publisher = publisher(registry.clone());

        let local = card("a", "new", "http://a/");
        let returned = publisher.sync(&target(), local.clone()).await;
        assert_eq!(returned, local);
        assert_eq!(registry.registrations.load(Ordering::SeqCst), 1);

        // the echo now sits in the cache, so the next sync neither looks up nor registers
        let lookups = registry.card_lookups.load(Ordering::SeqCst);
        publisher.sync(&target(), local).await;
        assert_eq!(registry.registrations.load(Ordering::SeqCst), 1);
        assert_eq!(registry.card_lookups.load(Ordering::SeqCst), lookups);
    }

    #[tokio::test]
    async fn registration_failure_still_returns_local_card() {
        let registry = Arc::new(MockRegistry {
            fail_register: true,
            ..MockRegistry::default()
        });
        let publisher = publisher(registry.clone());

        let local = card("a", "desc", "http://a/");
        let returned = publisher.sync(&target(), local.clone()).await;
        assert_eq!(returned, local);
        assert_eq!(registry.registrations.load(Ordering::SeqCst), 1);
    }
}
