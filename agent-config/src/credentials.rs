use std::fmt;

use agent_primitives::{Error, Result, normalize_registry_address};
use serde::Deserialize;
use serde_json::Value;

/// Registry connection credentials supplied by the plugin host.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RegistryCredentials {
    /// Registry server address, with or without scheme and port.
    #[serde(default, rename = "nacos_addr")]
    pub address: Option<String>,
    /// Login user name.
    #[serde(default, rename = "nacos_username")]
    pub username: Option<String>,
    /// Login password.
    #[serde(default, rename = "nacos_password")]
    pub password: Option<String>,
}

impl RegistryCredentials {
    /// Creates credentials for an address without authentication.
    #[must_use]
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: Some(address.into()),
            username: None,
            password: None,
        }
    }

    /// Attaches a user name and password.
    #[must_use]
    pub fn with_login(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Parses the host's credential map.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the map has the wrong shape.
    pub fn from_value(value: Value) -> Result<Self> {
        serde_json::from_value(value)
            .map_err(|err| Error::config(format!("invalid registry credentials: {err}")))
    }

    /// Returns the registry address normalized with the default port.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the address is missing or blank.
    pub fn require_address(&self) -> Result<String> {
        normalize_registry_address(self.address.as_deref().unwrap_or_default())
    }

    /// Returns the user name and password when both are present and non-empty.
    #[must_use]
    pub fn login(&self) -> Option<(&str, &str)> {
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(user), Some(pass)) if !user.is_empty() && !pass.is_empty() => Some((user, pass)),
            _ => None,
        }
    }
}

impl fmt::Debug for RegistryCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryCredentials")
            .field("address", &self.address)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
