use cadastre_crypto::CryptoError;
use cadastre_ledger::LedgerError;
use cadastre_store::StoreError;
use cadastre_types::ParcelId;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("parcel {0} is already registered")]
    AlreadyRegistered(ParcelId),

    /// Also returned when the caller does not own the parcel, so that the two
    /// cases cannot be told apart.
    #[error("parcel {0} not found")]
    ParcelNotFound(ParcelId),

    #[error("you do not own parcel {0}")]
    NotOwner(ParcelId),

    #[error("invalid transfer recipient: {0}")]
    InvalidRecipient(String),

    #[error("a transfer for parcel {0} is already pending")]
    TransferPending(ParcelId),

    #[error("transfer request {0} not found")]
    TransferNotFound(Uuid),

    #[error("transfer request {0} has already been decided")]
    AlreadyDecided(Uuid),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    #[error("salt vault error: {0}")]
    Vault(#[from] CryptoError),
}

impl RegistryError {
    pub fn code(&self) -> &'static str {
        match self {
            RegistryError::AlreadyRegistered(_) => "PARCEL_ALREADY_REGISTERED",
            RegistryError::ParcelNotFound(_) => "PARCEL_NOT_FOUND",
            RegistryError::NotOwner(_) => "NOT_OWNER",
            RegistryError::InvalidRecipient(_) => "INVALID_INPUT",
            RegistryError::TransferPending(_) => "TRANSFER_PENDING",
            RegistryError::TransferNotFound(_) => "TRANSFER_NOT_FOUND",
            RegistryError::AlreadyDecided(_) => "TRANSFER_ALREADY_DECIDED",
            RegistryError::Ledger(e) if e.is_transient() => "LEDGER_UNAVAILABLE",
            RegistryError::Ledger(_) => "LEDGER_ERROR",
            RegistryError::Store(_) | RegistryError::Vault(_) => "INTERNAL_ERROR",
        }
    }
}
