//! Shared handler state.

use std::sync::Arc;

use cadastre_auth::{ChallengeAuthenticator, SessionIssuer};
use cadastre_ledger::{CommitmentLedger, TimedLedger};
use cadastre_proof::{OwnershipProofEngine, ShareableProofService};
use cadastre_registry::ParcelRegistry;
use cadastre_store::AuditStore;
use cadastre_types::{Clock, ProtocolParams, Timestamp};

use crate::metrics::RegistryMetrics;
use crate::rate_limit::RateLimiter;

pub type SharedLedger = Arc<TimedLedger<Arc<dyn CommitmentLedger>>>;

/// Everything a handler can reach. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub authenticator: Arc<ChallengeAuthenticator>,
    pub sessions: Arc<SessionIssuer>,
    pub engine: Arc<OwnershipProofEngine>,
    pub envelopes: Arc<ShareableProofService>,
    pub registry: Arc<ParcelRegistry>,
    pub audit: Arc<dyn AuditStore>,
    pub ledger: SharedLedger,
    pub metrics: Arc<RegistryMetrics>,
    pub clock: Arc<dyn Clock>,
    pub params: ProtocolParams,
    pub general_limit: RateLimiter,
    pub auth_limit: RateLimiter,
    pub started_at: Timestamp,
}
