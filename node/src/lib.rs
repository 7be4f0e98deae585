//! Cadastre registry node.
//!
//! Loads configuration, opens storage and the commitment ledger, and serves
//! the HTTP API until asked to stop.

pub mod config;
pub mod error;
pub mod logging;
pub mod node;
pub mod shutdown;

pub use config::{NodeConfig, StorageBackend};
pub use error::NodeError;
pub use logging::{init_logging, LogFormat};
pub use node::CadastreNode;
pub use shutdown::ShutdownController;
