use cadastre_types::ParcelId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("parcel {0} does not exist on the ledger")]
    ParcelNotFound(ParcelId),

    #[error("parcel {0} is already registered on the ledger")]
    AlreadyRegistered(ParcelId),

    #[error("ledger unavailable: {0}")]
    Unavailable(String),

    #[error("ledger did not answer within {0}ms")]
    Timeout(u64),

    #[error("snapshot error: {0}")]
    Snapshot(String),
}

impl LedgerError {
    /// Whether the failure says nothing about the ledger's contents and the
    /// same request may succeed later.
    pub fn is_transient(&self) -> bool {
        matches!(self, LedgerError::Unavailable(_) | LedgerError::Timeout(_))
    }
}
