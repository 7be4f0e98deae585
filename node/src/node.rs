//! The registry node: wires storage, the ledger and the protocol services
//! into the HTTP API.

use std::sync::Arc;
use std::time::Duration;

use rand::rngs::OsRng;
use rand::RngCore;
use tokio::net::TcpListener;
use zeroize::Zeroizing;

use cadastre_auth::{ChallengeAuthenticator, OsNonceSource, SessionIssuer};
use cadastre_ledger::{CommitmentLedger, InMemoryLedger, TimedLedger};
use cadastre_nullables::NullStore;
use cadastre_proof::envelope::DEFAULT_VERIFY_ENDPOINT;
use cadastre_proof::{OwnershipProofEngine, ShareableProofService};
use cadastre_registry::ParcelRegistry;
use cadastre_rpc::{AppState, RateLimiter, RegistryMetrics, RpcServer};
use cadastre_store::{AuditStore, IdentityStore, ParcelStore, TransferStore};
use cadastre_store_lmdb::{check_data_dir, check_integrity, LmdbEnvironment};
use cadastre_types::{Clock, SystemClock};

use crate::config::{NodeConfig, StorageBackend, SESSION_SECRET_ENV, VAULT_SECRET_ENV};
use crate::shutdown::ShutdownController;
use crate::NodeError;

/// The four stores a node needs, behind their traits.
struct Stores {
    identities: Arc<dyn IdentityStore>,
    parcels: Arc<dyn ParcelStore>,
    transfers: Arc<dyn TransferStore>,
    audit: Arc<dyn AuditStore>,
    /// Kept open for the node's lifetime when the LMDB backend is used.
    lmdb: Option<LmdbEnvironment>,
}

pub struct CadastreNode {
    config: NodeConfig,
    state: AppState,
    shutdown: ShutdownController,
    _lmdb: Option<LmdbEnvironment>,
}

impl CadastreNode {
    /// Build a node from `config` with the system clock.
    ///
    /// Opens (and integrity-checks) storage, loads the ledger snapshot and
    /// grants the configured authority addresses their role. Nothing is
    /// bound until [`run`](Self::run).
    pub fn new(config: NodeConfig) -> Result<Self, NodeError> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: NodeConfig, clock: Arc<dyn Clock>) -> Result<Self, NodeError> {
        config.validate()?;
        let params = config.params.clone();

        let stores = open_stores(&config)?;

        let ledger_inner: Arc<dyn CommitmentLedger> = match &config.ledger_snapshot {
            Some(path) => Arc::new(InMemoryLedger::open(path)?),
            None => {
                tracing::warn!("no ledger_snapshot configured; ledger state is lost on restart");
                Arc::new(InMemoryLedger::new())
            }
        };
        let ledger = Arc::new(TimedLedger::new(
            ledger_inner,
            Duration::from_millis(params.ledger_timeout_ms),
        ));

        for authority in config.authorities()? {
            stores
                .identities
                .set_authority(&authority, true, clock.now())?;
            tracing::info!(address = %authority, "granted land authority role");
        }

        let session_secret = resolve_secret(config.session_secret.as_deref(), SESSION_SECRET_ENV);
        let vault_secret = resolve_secret(config.vault_secret.as_deref(), VAULT_SECRET_ENV);

        let engine = Arc::new(OwnershipProofEngine::new(clock.clone(), &params));
        let mut envelopes = ShareableProofService::new(
            engine.clone(),
            ledger.clone(),
            stores.audit.clone(),
            clock.clone(),
            &params,
        );
        if let Some(base) = &config.public_base_url {
            envelopes = envelopes.with_endpoint(format!(
                "{}{DEFAULT_VERIFY_ENDPOINT}",
                base.trim_end_matches('/')
            ));
        }

        let state = AppState {
            authenticator: Arc::new(ChallengeAuthenticator::new(
                stores.identities.clone(),
                Arc::new(OsNonceSource::new(params.nonce_space)),
                clock.clone(),
            )),
            sessions: Arc::new(SessionIssuer::new(
                &session_secret,
                params.session_ttl_secs,
                clock.clone(),
            )?),
            engine,
            envelopes: Arc::new(envelopes),
            registry: Arc::new(ParcelRegistry::new(
                stores.parcels.clone(),
                stores.transfers.clone(),
                ledger.clone(),
                clock.clone(),
                &vault_secret,
            )),
            audit: stores.audit.clone(),
            ledger,
            metrics: Arc::new(RegistryMetrics::new()?),
            started_at: clock.now(),
            clock,
            params,
            general_limit: RateLimiter::new(config.rate_limit_general.clone()),
            auth_limit: RateLimiter::new(config.rate_limit_auth.clone()),
        };

        Ok(Self {
            config,
            state,
            shutdown: ShutdownController::new(),
            _lmdb: stores.lmdb,
        })
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// Handler state, e.g. for serving the router in-process.
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// A handle that stops [`run`](Self::run) when triggered.
    pub fn shutdown_handle(&self) -> ShutdownController {
        self.shutdown.clone()
    }

    /// Bind the configured address and serve until SIGINT/SIGTERM or a
    /// programmatic shutdown.
    pub async fn run(self) -> Result<(), NodeError> {
        let listener = TcpListener::bind(self.config.socket_addr()?).await?;
        self.run_on(listener).await
    }

    pub async fn run_on(self, listener: TcpListener) -> Result<(), NodeError> {
        let signals = self.shutdown.clone();
        let signal_task = tokio::spawn(async move { signals.wait_for_signal().await });

        tracing::info!(
            storage = ?self.config.storage,
            addr = %listener.local_addr()?,
            "cadastre node starting"
        );
        let server = RpcServer::new(listener.local_addr()?).with_metrics(self.config.enable_metrics);
        let result = server
            .serve_on(listener, self.state.clone(), self.shutdown.signalled())
            .await;

        signal_task.abort();
        tracing::info!("cadastre node stopped");
        result.map_err(NodeError::from)
    }
}

fn open_stores(config: &NodeConfig) -> Result<Stores, NodeError> {
    match config.storage {
        StorageBackend::Memory => {
            tracing::warn!("memory storage selected; identities and parcels are lost on restart");
            let store = Arc::new(NullStore::new());
            Ok(Stores {
                identities: store.clone(),
                parcels: store.clone(),
                transfers: store.clone(),
                audit: store,
                lmdb: None,
            })
        }
        StorageBackend::Lmdb => {
            check_data_dir(&config.data_dir).map_err(NodeError::Integrity)?;
            let env = LmdbEnvironment::open(&config.data_dir, config.lmdb_map_size)?;

            let report = check_integrity(env.env())?;
            if !report.is_healthy() {
                return Err(NodeError::Integrity(report.errors.join("; ")));
            }
            tracing::info!(
                databases = report.databases_checked,
                entries = report.total_entries,
                "storage integrity check passed"
            );

            Ok(Stores {
                identities: Arc::new(env.identity_store()),
                parcels: Arc::new(env.parcel_store()),
                transfers: Arc::new(env.transfer_store()),
                audit: Arc::new(env.audit_store()),
                lmdb: Some(env),
            })
        }
    }
}

/// Use the configured secret, or a random one that lives only as long as
/// the process.
fn resolve_secret(configured: Option<&str>, env_name: &str) -> Zeroizing<Vec<u8>> {
    match configured {
        Some(secret) => Zeroizing::new(secret.as_bytes().to_vec()),
        None => {
            let mut bytes = Zeroizing::new(vec![0u8; 32]);
            OsRng.fill_bytes(&mut bytes);
            tracing::warn!(
                variable = env_name,
                "secret not configured; using an ephemeral random secret"
            );
            Zeroizing::new(hex::encode(&*bytes).into_bytes())
        }
    }
}
