use tracing::{debug, info, warn};

/// Result of an Agent Card registration attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationOutcome {
    /// The registered card already matched; nothing was sent.
    Skipped,
    /// The card was registered or updated.
    Registered,
    /// Registration failed; the caller continues with the local card.
    Failed,
}

impl RegistrationOutcome {
    /// Stable label used in the `outcome` field.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Skipped => "skipped",
            Self::Registered => "registered",
            Self::Failed => "failed",
        }
    }
}

/// Emits the single structured event describing a registration attempt.
///
/// Severity follows the outcome: `debug` for skipped, `info` for registered,
/// `warn` for failed.
pub fn registration_event(outcome: RegistrationOutcome, agent: &str, detail: &str) {
    let label = outcome.as_str();
    match outcome {
        RegistrationOutcome::Skipped => {
            debug!(outcome = label, agent_name = %agent, detail, "agent card registration");
        }
        RegistrationOutcome::Registered => {
            info!(outcome = label, agent_name = %agent, detail, "agent card registration");
        }
        RegistrationOutcome::Failed => {
            warn!(outcome = label, agent_name = %agent, detail, "agent card registration");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_labels_are_stable() {
        assert_eq!(RegistrationOutcome::Skipped.as_str(), "skipped");
        assert_eq!(RegistrationOutcome::Registered.as_str(), "registered");
        assert_eq!(RegistrationOutcome::Failed.as_str(), "failed");
        registration_event(RegistrationOutcome::Failed, "agent", "backend down");
    }
}
