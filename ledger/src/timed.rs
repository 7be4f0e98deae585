//! Bounded ledger calls.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use cadastre_types::{Hash32, OwnerAddress, ParcelId};

use crate::ledger::{CommitmentLedger, LedgerEntry};
use crate::LedgerError;

/// Wrapper that puts an upper bound on every call to the inner ledger.
///
/// A call that does not finish in time fails with [`LedgerError::Timeout`],
/// which callers report as "ledger unavailable" rather than as a mismatch.
pub struct TimedLedger<L: CommitmentLedger> {
    inner: L,
    timeout: Duration,
    timeouts: AtomicU64,
}

impl<L: CommitmentLedger> TimedLedger<L> {
    pub fn new(inner: L, timeout: Duration) -> Self {
        Self {
            inner,
            timeout,
            timeouts: AtomicU64::new(0),
        }
    }

    /// Number of calls that hit the timeout so far.
    pub fn timeouts(&self) -> u64 {
        self.timeouts.load(Ordering::Relaxed)
    }

    async fn bounded<T, F>(&self, op: &'static str, fut: F) -> Result<T, LedgerError>
    where
        F: Future<Output = Result<T, LedgerError>> + Send,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                self.timeouts.fetch_add(1, Ordering::Relaxed);
                let ms = self.timeout.as_millis() as u64;
                tracing::warn!(op, timeout_ms = ms, "ledger call timed out");
                Err(LedgerError::Timeout(ms))
            }
        }
    }
}

#[async_trait]
impl<L: CommitmentLedger> CommitmentLedger for TimedLedger<L> {
    async fn get_commitment(&self, parcel_id: ParcelId) -> Result<LedgerEntry, LedgerError> {
        self.bounded("get_commitment", self.inner.get_commitment(parcel_id))
            .await
    }

    async fn register_commitment(
        &self,
        parcel_id: ParcelId,
        owner: OwnerAddress,
        commitment: Hash32,
    ) -> Result<u64, LedgerError> {
        self.bounded(
            "register_commitment",
            self.inner.register_commitment(parcel_id, owner, commitment),
        )
        .await
    }

    async fn transfer_commitment(
        &self,
        parcel_id: ParcelId,
        new_owner: OwnerAddress,
        new_commitment: Hash32,
    ) -> Result<u64, LedgerError> {
        self.bounded(
            "transfer_commitment",
            self.inner
                .transfer_commitment(parcel_id, new_owner, new_commitment),
        )
        .await
    }

    async fn height(&self) -> Result<u64, LedgerError> {
        self.bounded("height", self.inner.height()).await
    }
}
