//! Observability utilities for the bridge.

#![warn(missing_docs, clippy::pedantic)]

mod events;
pub mod tracing_support;

pub use events::{RegistrationOutcome, registration_event};
pub use tracing_support::{TelemetryConfig, init_tracing};
