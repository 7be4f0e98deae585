//! HTTP API for the cadastre registry.
//!
//! Provides endpoints for:
//! - Wallet login (nonce challenge, signature verification, session tokens)
//! - Commitments and ownership proofs (generate, verify, share)
//! - Parcel registration and lookup
//! - Ownership transfer requests and authority decisions
//! - Health and Prometheus metrics

pub mod error;
pub mod extract;
pub mod handlers;
pub mod metrics;
pub mod rate_limit;
pub mod server;
pub mod state;

pub use error::RpcError;
pub use metrics::RegistryMetrics;
pub use rate_limit::{RateLimitConfig, RateLimiter};
pub use server::{router, router_with_options, RpcServer};
pub use state::{AppState, SharedLedger};
