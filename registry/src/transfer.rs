//! Ownership transfer workflow.
//!
//! A transfer is requested by the current owner and decided by an authority.
//! Approval re-salts the parcel for the new owner and moves the commitment on
//! the ledger; a ledger failure restores the old record and rejects the
//! request with the error as notes.

use cadastre_crypto::generate_salt;
use cadastre_proof::compute_commitment;
use cadastre_store::{ParcelRecord, StoreError, TransferRecord, TransferStatus};
use cadastre_types::{OwnerAddress, ParcelId};
use uuid::Uuid;

use crate::error::RegistryError;
use crate::registry::ParcelRegistry;

impl ParcelRegistry {
    pub fn request_transfer(
        &self,
        from: OwnerAddress,
        parcel_id: ParcelId,
        to: OwnerAddress,
        reason: Option<String>,
    ) -> Result<TransferRecord, RegistryError> {
        let parcel = self.load(parcel_id)?;
        if parcel.owner != from {
            return Err(RegistryError::NotOwner(parcel_id));
        }
        if to == from {
            return Err(RegistryError::InvalidRecipient(
                "cannot transfer a parcel to its current owner".into(),
            ));
        }
        if to.is_zero() {
            return Err(RegistryError::InvalidRecipient("zero address".into()));
        }
        if self.transfers.pending_for_parcel(parcel_id)?.is_some() {
            return Err(RegistryError::TransferPending(parcel_id));
        }

        let record = TransferRecord {
            id: Uuid::new_v4(),
            parcel_id,
            from,
            to,
            reason,
            status: TransferStatus::Pending,
            requested_at: self.clock.now(),
            decided_at: None,
            decided_by: None,
            notes: None,
        };
        self.transfers.put_transfer(&record)?;
        tracing::info!(transfer = %record.id, parcel = %parcel_id, from = %from, to = %to, "transfer requested");
        Ok(record)
    }

    pub fn pending_transfers(&self) -> Result<Vec<TransferRecord>, RegistryError> {
        Ok(self.transfers.pending_transfers()?)
    }

    pub async fn approve_transfer(
        &self,
        id: Uuid,
        authority: OwnerAddress,
        notes: Option<String>,
    ) -> Result<TransferRecord, RegistryError> {
        let mut transfer = self.pending(id)?;
        let previous = self.load(transfer.parcel_id)?;

        let salt = generate_salt();
        let commitment = compute_commitment(&transfer.to, &salt, transfer.parcel_id);
        let parcel = ParcelRecord {
            owner: transfer.to,
            commitment,
            sealed_salt: self.seal(&salt)?,
            updated_at: self.clock.now(),
            ..previous.clone()
        };
        self.parcels.update_parcel(&parcel)?;

        if let Err(e) = self
            .ledger
            .transfer_commitment(transfer.parcel_id, transfer.to, commitment)
            .await
        {
            tracing::warn!(transfer = %id, error = %e, "ledger transfer failed; rejecting request");
            if let Err(restore) = self.parcels.update_parcel(&previous) {
                tracing::error!(
                    transfer = %id,
                    error = %restore,
                    "ledger kept the old owner and the parcel record could not be restored"
                );
            }
            self.decide(
                &mut transfer,
                TransferStatus::Rejected,
                authority,
                Some(format!("Ledger transfer failed: {e}")),
            )?;
            return Err(e.into());
        }

        self.decide(&mut transfer, TransferStatus::Approved, authority, notes)?;
        tracing::info!(transfer = %id, parcel = %transfer.parcel_id, to = %transfer.to, "transfer approved");
        Ok(transfer)
    }

    pub fn reject_transfer(
        &self,
        id: Uuid,
        authority: OwnerAddress,
        notes: Option<String>,
    ) -> Result<TransferRecord, RegistryError> {
        let mut transfer = self.pending(id)?;
        self.decide(&mut transfer, TransferStatus::Rejected, authority, notes)?;
        tracing::info!(transfer = %id, "transfer rejected");
        Ok(transfer)
    }

    fn pending(&self, id: Uuid) -> Result<TransferRecord, RegistryError> {
        let transfer = match self.transfers.get_transfer(&id) {
            Ok(t) => t,
            Err(StoreError::NotFound(_)) => return Err(RegistryError::TransferNotFound(id)),
            Err(e) => return Err(e.into()),
        };
        if transfer.status != TransferStatus::Pending {
            return Err(RegistryError::AlreadyDecided(id));
        }
        Ok(transfer)
    }

    fn decide(
        &self,
        transfer: &mut TransferRecord,
        status: TransferStatus,
        authority: OwnerAddress,
        notes: Option<String>,
    ) -> Result<(), RegistryError> {
        transfer.status = status;
        transfer.decided_at = Some(self.clock.now());
        transfer.decided_by = Some(authority);
        transfer.notes = notes;
        self.transfers.put_transfer(transfer)?;
        Ok(())
    }
}
