//! Configuration for the bridge: tunables, registry credentials, and endpoint settings.
//!
//! Tunables are layered from built-in defaults, an optional file, and
//! `A2A_BRIDGE__*` environment variables. Credentials and endpoint settings
//! arrive from the plugin host as JSON maps and are deserialized directly.

#![warn(missing_docs, clippy::pedantic)]

mod credentials;
mod endpoint;
pub mod loader;
mod schema;

pub use credentials::RegistryCredentials;
pub use endpoint::{AppSelector, EndpointSettings};
pub use schema::{BridgeConfig, DEFAULT_NAMESPACE};
