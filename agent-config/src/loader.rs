//! Layered loading of [`BridgeConfig`].

use std::path::Path;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use tracing::debug;

use crate::BridgeConfig;

/// Prefix of environment variables overriding file values.
pub const ENV_PREFIX: &str = "A2A_BRIDGE";

/// Loads the bridge configuration.
///
/// Sources are layered as built-in defaults, then the optional file at `path`
/// (format chosen by extension), then `A2A_BRIDGE__<FIELD>` environment
/// variables. The merged value is validated before it is returned.
///
/// # Errors
///
/// Returns an error when the file cannot be parsed, a value has the wrong
/// type, or validation fails.
pub fn load(path: Option<&Path>) -> Result<BridgeConfig> {
    let mut builder = Config::builder();
    if let Some(path) = path {
        debug!(path = %path.display(), "loading bridge configuration file");
        builder = builder.add_source(File::from(path).required(true));
    }
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .try_parsing(true),
    );

    let settings = builder
        .build()
        .context("failed to assemble bridge configuration sources")?;
    let config: BridgeConfig = settings
        .try_deserialize()
        .context("failed to deserialize bridge configuration")?;
    config
        .validate()
        .context("bridge configuration validation failed")?;
    Ok(config)
}
