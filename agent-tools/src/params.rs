//! Typed access to JSON tool parameters.

use serde_json::{Map, Value};

use crate::registry::{ToolError, ToolResult};

/// Borrowed view of a tool's JSON object input.
///
/// Plugin hosts send blanks and numbers-as-strings freely, so empty strings
/// read as absent and integers accept either representation.
#[derive(Debug, Clone, Copy)]
pub struct Params<'a>(&'a Map<String, Value>);

impl<'a> Params<'a> {
    /// Wraps `input`, which must be a JSON object.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::InvalidParameters`] for any other JSON value.
    pub fn new(input: &'a Value) -> ToolResult<Self> {
        input
            .as_object()
            .map(Self)
            .ok_or_else(|| ToolError::invalid("tool parameters must be a JSON object"))
    }

    /// Returns a non-blank string parameter.
    #[must_use]
    pub fn str(&self, key: &str) -> Option<&'a str> {
        self.0
            .get(key)
            .and_then(Value::as_str)
            .filter(|value| !value.trim().is_empty())
    }

    /// Returns a string parameter, rejecting absent or blank values.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::InvalidParameters`] naming the missing key.
    pub fn required_str(&self, key: &str) -> ToolResult<&'a str> {
        self.str(key)
            .ok_or_else(|| ToolError::invalid(format!("parameter `{key}` is required")))
    }

    /// Returns a string parameter that may legitimately be empty.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::InvalidParameters`] when the key is absent or not a string.
    pub fn raw_str(&self, key: &str) -> ToolResult<&'a str> {
        self.0
            .get(key)
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::invalid(format!("parameter `{key}` must be a string")))
    }

    /// Returns an unsigned integer parameter, or `default` when absent.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::InvalidParameters`] when the value is present but
    /// not a non-negative integer.
    pub fn u32_or(&self, key: &str, default: u32) -> ToolResult<u32> {
        let invalid = || ToolError::invalid(format!("parameter `{key}` must be a positive integer"));
        match self.0.get(key) {
            None | Some(Value::Null) => Ok(default),
            Some(Value::String(text)) if text.trim().is_empty() => Ok(default),
            Some(Value::String(text)) => text.trim().parse().map_err(|_| invalid()),
            Some(Value::Number(number)) => number
                .as_u64()
                .and_then(|value| u32::try_from(value).ok())
                .ok_or_else(invalid),
            Some(_) => Err(invalid()),
        }
    }
}
