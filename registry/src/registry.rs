//! Parcel registration and ownership lookup.

use std::sync::Arc;

use cadastre_crypto::{generate_salt, open_salt, seal_salt};
use cadastre_ledger::{verify_parcel_commitment, CommitmentLedger, LedgerError, LedgerStatus};
use cadastre_proof::compute_commitment;
use cadastre_store::{ParcelRecord, ParcelStore, StoreError, TransferStore};
use cadastre_types::{Clock, Hash32, OwnerAddress, ParcelId, Salt, Timestamp};
use serde::Serialize;
use zeroize::Zeroizing;

use crate::error::RegistryError;

/// Public view of a parcel. Never carries the salt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParcelView {
    pub parcel_id: ParcelId,
    pub owner: OwnerAddress,
    pub commitment: Hash32,
    pub registered_at: Timestamp,
    pub updated_at: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ledger_status: Option<LedgerStatus>,
}

impl From<&ParcelRecord> for ParcelView {
    fn from(r: &ParcelRecord) -> Self {
        Self {
            parcel_id: r.parcel_id,
            owner: r.owner,
            commitment: r.commitment,
            registered_at: r.registered_at,
            updated_at: r.updated_at,
            ledger_status: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredParcel {
    pub parcel_id: ParcelId,
    pub owner: OwnerAddress,
    pub commitment: Hash32,
    pub ledger_height: u64,
}

/// What an owner needs to generate proofs for one of their parcels.
#[derive(Debug)]
pub struct OwnerSecret {
    pub salt: Salt,
    pub commitment: Hash32,
}

pub struct ParcelRegistry {
    pub(crate) parcels: Arc<dyn ParcelStore>,
    pub(crate) transfers: Arc<dyn TransferStore>,
    pub(crate) ledger: Arc<dyn CommitmentLedger>,
    pub(crate) clock: Arc<dyn Clock>,
    vault_secret: Zeroizing<Vec<u8>>,
}

impl ParcelRegistry {
    pub fn new(
        parcels: Arc<dyn ParcelStore>,
        transfers: Arc<dyn TransferStore>,
        ledger: Arc<dyn CommitmentLedger>,
        clock: Arc<dyn Clock>,
        vault_secret: &[u8],
    ) -> Self {
        Self {
            parcels,
            transfers,
            ledger,
            clock,
            vault_secret: Zeroizing::new(vault_secret.to_vec()),
        }
    }

    /// Register a new parcel for `owner`.
    ///
    /// A fresh salt is generated and sealed; only the commitment leaves the
    /// registry. Rejects ids already known to the store or to the ledger.
    ///
    /// The parcel record is stored before the commitment goes to the ledger
    /// and removed again if the ledger write fails, so a failure on either
    /// side leaves neither a stranded commitment nor an orphaned record.
    pub async fn register_parcel(
        &self,
        parcel_id: ParcelId,
        owner: OwnerAddress,
        registered_by: OwnerAddress,
    ) -> Result<RegisteredParcel, RegistryError> {
        if self.parcels.parcel_exists(parcel_id)? {
            return Err(RegistryError::AlreadyRegistered(parcel_id));
        }
        if self.ledger.get_commitment(parcel_id).await?.exists {
            return Err(RegistryError::AlreadyRegistered(parcel_id));
        }

        let salt = generate_salt();
        let commitment = compute_commitment(&owner, &salt, parcel_id);
        let now = self.clock.now();
        let record = ParcelRecord {
            parcel_id,
            owner,
            commitment,
            sealed_salt: self.seal(&salt)?,
            registered_at: now,
            registered_by,
            updated_at: now,
        };
        match self.parcels.insert_parcel(&record) {
            Ok(()) => {}
            Err(StoreError::Duplicate(_)) => return Err(RegistryError::AlreadyRegistered(parcel_id)),
            Err(e) => return Err(e.into()),
        }

        let ledger_height = match self
            .ledger
            .register_commitment(parcel_id, owner, commitment)
            .await
        {
            Ok(height) => height,
            Err(e) => {
                if let Err(rollback) = self.parcels.remove_parcel(parcel_id) {
                    tracing::error!(
                        parcel = %parcel_id,
                        error = %rollback,
                        "ledger rejected the commitment and the parcel record could not be removed"
                    );
                }
                return Err(match e {
                    LedgerError::AlreadyRegistered(id) => RegistryError::AlreadyRegistered(id),
                    other => RegistryError::Ledger(other),
                });
            }
        };

        tracing::info!(parcel = %parcel_id, owner = %owner, by = %registered_by, "parcel registered");
        Ok(RegisteredParcel {
            parcel_id,
            owner,
            commitment,
            ledger_height,
        })
    }

    /// Parcels currently owned by `owner`, ordered by id.
    pub fn parcels_of(&self, owner: &OwnerAddress) -> Result<Vec<ParcelView>, RegistryError> {
        Ok(self
            .parcels
            .parcels_by_owner(owner)?
            .iter()
            .map(ParcelView::from)
            .collect())
    }

    /// A parcel together with the ledger's view of its commitment.
    pub async fn parcel(&self, parcel_id: ParcelId) -> Result<ParcelView, RegistryError> {
        let record = self.load(parcel_id)?;
        let check =
            verify_parcel_commitment(self.ledger.as_ref(), parcel_id, record.commitment).await;
        let mut view = ParcelView::from(&record);
        view.ledger_status = Some(check.status);
        Ok(view)
    }

    /// Open the sealed salt of `parcel_id` for its owner.
    ///
    /// A missing parcel and a parcel owned by someone else both yield
    /// [`RegistryError::ParcelNotFound`].
    pub fn owner_secret(
        &self,
        parcel_id: ParcelId,
        owner: &OwnerAddress,
    ) -> Result<OwnerSecret, RegistryError> {
        let record = self.load(parcel_id)?;
        if record.owner != *owner {
            tracing::debug!(parcel = %parcel_id, "secret requested by non-owner");
            return Err(RegistryError::ParcelNotFound(parcel_id));
        }
        let salt = open_salt(&record.sealed_salt, &self.vault_secret)?;
        Ok(OwnerSecret {
            salt,
            commitment: record.commitment,
        })
    }

    pub fn parcel_count(&self) -> Result<u64, RegistryError> {
        Ok(self.parcels.parcel_count()?)
    }

    pub(crate) fn load(&self, parcel_id: ParcelId) -> Result<ParcelRecord, RegistryError> {
        match self.parcels.get_parcel(parcel_id) {
            Ok(record) => Ok(record),
            Err(StoreError::NotFound(_)) => Err(RegistryError::ParcelNotFound(parcel_id)),
            Err(e) => Err(e.into()),
        }
    }

    pub(crate) fn seal(&self, salt: &Salt) -> Result<Vec<u8>, RegistryError> {
        Ok(seal_salt(salt, &self.vault_secret)?)
    }
}
