//! Shared utilities for the cadastre registry.

pub mod logging;
pub mod time;

pub use logging::init_tracing;
pub use time::{format_duration, format_duration_ms};
