//! Node configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

use cadastre_rpc::RateLimitConfig;
use cadastre_types::{OwnerAddress, ProtocolParams};

use crate::logging::LogFormat;
use crate::NodeError;

/// Environment variable holding the session signing secret.
pub const SESSION_SECRET_ENV: &str = "CADASTRE_SESSION_SECRET";
/// Environment variable holding the salt vault secret.
pub const VAULT_SECRET_ENV: &str = "CADASTRE_VAULT_KEY";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Everything in process memory; lost on restart.
    Memory,
    /// LMDB environment under `data_dir`.
    Lmdb,
}

/// Configuration for a cadastre node.
///
/// Can be loaded from a TOML file via [`NodeConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Interface the HTTP API binds to.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default = "default_rpc_port")]
    pub rpc_port: u16,

    /// Base URL clients use to reach this node, used in shareable proof
    /// verification instructions. Relative paths are used when unset.
    #[serde(default)]
    pub public_base_url: Option<String>,

    /// Data directory for LMDB storage.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_storage")]
    pub storage: StorageBackend,

    #[serde(default = "default_map_size")]
    pub lmdb_map_size: usize,

    /// Where the ledger snapshot is persisted. In-memory only when unset.
    #[serde(default)]
    pub ledger_snapshot: Option<PathBuf>,

    /// HMAC secret for session tokens. Overridden by `CADASTRE_SESSION_SECRET`.
    #[serde(default, skip_serializing)]
    pub session_secret: Option<String>,

    /// Secret the salt vault key is derived from. Overridden by `CADASTRE_VAULT_KEY`.
    #[serde(default, skip_serializing)]
    pub vault_secret: Option<String>,

    /// Addresses granted the land-authority role at startup.
    #[serde(default)]
    pub authority_addresses: Vec<String>,

    #[serde(default = "default_log_format")]
    pub log_format: LogFormat,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Whether to serve Prometheus metrics at `/metrics`.
    #[serde(default = "default_true")]
    pub enable_metrics: bool,

    #[serde(default = "RateLimitConfig::general")]
    pub rate_limit_general: RateLimitConfig,

    /// Budget for failed login attempts.
    #[serde(default = "RateLimitConfig::auth")]
    pub rate_limit_auth: RateLimitConfig,

    #[serde(default)]
    pub params: ProtocolParams,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_rpc_port() -> u16 {
    4000
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./cadastre_data")
}

fn default_storage() -> StorageBackend {
    StorageBackend::Lmdb
}

fn default_map_size() -> usize {
    cadastre_store_lmdb::environment::DEFAULT_MAP_SIZE
}

fn default_log_format() -> LogFormat {
    LogFormat::Human
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

// ── Impl ───────────────────────────────────────────────────────────────

impl NodeConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, NodeError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| NodeError::Config(format!("{path}: {e}")))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string. Secrets are omitted.
    pub fn to_toml_string(&self) -> Result<String, NodeError> {
        toml::to_string_pretty(self).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Take secrets from the process environment when set there.
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(secret) = lookup(SESSION_SECRET_ENV).filter(|s| !s.is_empty()) {
            self.session_secret = Some(secret);
        }
        if let Some(secret) = lookup(VAULT_SECRET_ENV).filter(|s| !s.is_empty()) {
            self.vault_secret = Some(secret);
        }
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, NodeError> {
        format!("{}:{}", self.bind_address, self.rpc_port)
            .parse()
            .map_err(|e| NodeError::Config(format!("bind address: {e}")))
    }

    pub fn authorities(&self) -> Result<Vec<OwnerAddress>, NodeError> {
        self.authority_addresses
            .iter()
            .map(|raw| {
                OwnerAddress::parse(raw)
                    .map_err(|e| NodeError::Config(format!("authority_addresses: {e}")))
            })
            .collect()
    }

    /// Reject settings the node cannot run with.
    pub fn validate(&self) -> Result<(), NodeError> {
        let p = &self.params;
        if p.max_proof_age_ms == 0 || p.envelope_ttl_ms == 0 {
            return Err(NodeError::Config(
                "proof and envelope lifetimes must be positive".into(),
            ));
        }
        if p.nonce_space < 2 {
            return Err(NodeError::Config("nonce_space must be at least 2".into()));
        }
        if p.ledger_timeout_ms == 0 {
            return Err(NodeError::Config("ledger_timeout_ms must be positive".into()));
        }
        if self.rate_limit_general.max_requests == 0 || self.rate_limit_auth.max_requests == 0 {
            return Err(NodeError::Config("rate limits must allow at least one request".into()));
        }
        self.socket_addr()?;
        self.authorities()?;
        Ok(())
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            rpc_port: default_rpc_port(),
            public_base_url: None,
            data_dir: default_data_dir(),
            storage: default_storage(),
            lmdb_map_size: default_map_size(),
            ledger_snapshot: None,
            session_secret: None,
            vault_secret: None,
            authority_addresses: Vec::new(),
            log_format: default_log_format(),
            log_level: default_log_level(),
            enable_metrics: default_true(),
            rate_limit_general: RateLimitConfig::general(),
            rate_limit_auth: RateLimitConfig::auth(),
            params: ProtocolParams::default(),
        }
    }
}
