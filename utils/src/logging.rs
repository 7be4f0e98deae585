//! Tracing setup for command-line tools.
//!
//! The node has its own configurable subscriber (`cadastre-node::logging`).
//! One-shot CLI commands use this one: compact, without targets, on stderr,
//! so that a command's stdout carries only its result.

use tracing_subscriber::EnvFilter;

/// Install a stderr subscriber. `RUST_LOG` overrides `default_directive`.
///
/// Calling it twice is harmless; the second call is ignored.
pub fn init_tracing(default_directive: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}
