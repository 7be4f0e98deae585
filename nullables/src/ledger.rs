//! An in-memory ledger with injectable faults.

use async_trait::async_trait;
use cadastre_ledger::{CommitmentLedger, InMemoryLedger, LedgerEntry, LedgerError};
use cadastre_types::{Hash32, OwnerAddress, ParcelId};
use std::sync::Mutex;
use std::time::Duration;

/// How the next ledger calls should misbehave.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LedgerFault {
    None,
    /// Fail immediately with `LedgerError::Unavailable`.
    Unavailable,
    /// Answer reads but fail writes with `LedgerError::Unavailable`.
    RejectWrites,
    /// Sleep for the given time before answering.
    Delay(Duration),
}

/// An in-memory ledger whose availability can be controlled from tests.
pub struct NullLedger {
    inner: InMemoryLedger,
    fault: Mutex<LedgerFault>,
}

impl NullLedger {
    pub fn new() -> Self {
        Self {
            inner: InMemoryLedger::new(),
            fault: Mutex::new(LedgerFault::None),
        }
    }

    pub fn set_fault(&self, fault: LedgerFault) {
        if let Ok(mut f) = self.fault.lock() {
            *f = fault;
        }
    }

    async fn apply_fault(&self, write: bool) -> Result<(), LedgerError> {
        let fault = self
            .fault
            .lock()
            .map(|f| *f)
            .unwrap_or(LedgerFault::None);
        match fault {
            LedgerFault::None => Ok(()),
            LedgerFault::RejectWrites if !write => Ok(()),
            LedgerFault::RejectWrites => {
                Err(LedgerError::Unavailable("injected ledger write fault".into()))
            }
            LedgerFault::Unavailable => {
                Err(LedgerError::Unavailable("injected ledger fault".into()))
            }
            LedgerFault::Delay(d) => {
                tokio::time::sleep(d).await;
                Ok(())
            }
        }
    }
}

impl Default for NullLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommitmentLedger for NullLedger {
    async fn get_commitment(&self, parcel_id: ParcelId) -> Result<LedgerEntry, LedgerError> {
        self.apply_fault(false).await?;
        self.inner.get_commitment(parcel_id).await
    }

    async fn register_commitment(
        &self,
        parcel_id: ParcelId,
        owner: OwnerAddress,
        commitment: Hash32,
    ) -> Result<u64, LedgerError> {
        self.apply_fault(true).await?;
        self.inner
            .register_commitment(parcel_id, owner, commitment)
            .await
    }

    async fn transfer_commitment(
        &self,
        parcel_id: ParcelId,
        new_owner: OwnerAddress,
        new_commitment: Hash32,
    ) -> Result<u64, LedgerError> {
        self.apply_fault(true).await?;
        self.inner
            .transfer_commitment(parcel_id, new_owner, new_commitment)
            .await
    }

    async fn height(&self) -> Result<u64, LedgerError> {
        self.apply_fault(false).await?;
        self.inner.height().await
    }
}
