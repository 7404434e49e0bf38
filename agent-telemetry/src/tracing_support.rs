//! Structured tracing helpers.

use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

static INSTALLED: AtomicBool = AtomicBool::new(false);

/// Subscriber settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Filter directive used when `RUST_LOG` is unset.
    pub default_directive: String,
    /// Emit newline-delimited JSON instead of human-readable lines.
    pub json: bool,
    /// Include the event target in output.
    pub with_target: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            default_directive: "info".to_owned(),
            json: false,
            with_target: true,
        }
    }
}

impl TelemetryConfig {
    fn filter(&self) -> Result<EnvFilter> {
        match EnvFilter::try_from_default_env() {
            Ok(filter) => Ok(filter),
            Err(_) => EnvFilter::try_new(&self.default_directive)
                .with_context(|| format!("invalid log directive `{}`", self.default_directive)),
        }
    }
}

/// Installs the global `tracing` subscriber.
///
/// Returns `Ok(true)` when this call installed the subscriber and `Ok(false)`
/// when one was already in place.
///
/// # Errors
///
/// Returns an error when the configured filter directive cannot be parsed.
pub fn init_tracing(config: &TelemetryConfig) -> Result<bool> {
    if INSTALLED.swap(true, Ordering::SeqCst) {
        return Ok(false);
    }

    let filter = match config.filter() {
        Ok(filter) => filter,
        Err(err) => {
            INSTALLED.store(false, Ordering::SeqCst);
            return Err(err);
        }
    };

    let registry = tracing_subscriber::registry().with(filter);
    let installed = if config.json {
        registry
            .with(fmt::layer().json().with_target(config.with_target))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_target(config.with_target))
            .try_init()
    };

    // Another subscriber set outside this crate counts as already installed.
    Ok(installed.is_ok())
}
