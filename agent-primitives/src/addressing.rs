//! Registry address canonicalization and backend endpoint URL derivation.

use crate::{Error, Result};

/// Port appended to registry addresses that do not specify one.
pub const DEFAULT_REGISTRY_PORT: u16 = 8848;

const HTTPS_PORT: u16 = 443;

/// Canonicalizes a registry server address.
///
/// When the portion after the last `//` carries no `:`, the default registry
/// port is appended. Applying the function twice yields the same result.
///
/// # Errors
///
/// Returns [`Error::Config`] when the address is empty or blank.
pub fn normalize_registry_address(address: &str) -> Result<String> {
    if address.trim().is_empty() {
        return Err(Error::config("registry address is required"));
    }

    let authority = address.rsplit("//").next().unwrap_or(address);
    if authority.contains(':') {
        Ok(address.to_owned())
    } else {
        Ok(format!("{address}:{DEFAULT_REGISTRY_PORT}"))
    }
}

/// Builds the URL of a backend endpoint from its address, port, and export path.
///
/// The scheme is `https` for port 443 and `http` otherwise. Exactly one `/`
/// separates the authority from the export path.
#[must_use]
pub fn build_endpoint_url(address: &str, port: u16, export_path: &str) -> String {
    let scheme = if port == HTTPS_PORT { "https" } else { "http" };
    if export_path.starts_with('/') {
        format!("{scheme}://{address}:{port}{export_path}")
    } else {
        format!("{scheme}://{address}:{port}/{export_path}")
    }
}
