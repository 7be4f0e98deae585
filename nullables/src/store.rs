//! Thread-safe in-memory storage implementing every store trait.

use cadastre_store::{
    AuditStore, Identity, IdentityStore, ParcelRecord, ParcelStore, SharedProofRecord,
    StoreError, TransferRecord, TransferStatus, TransferStore, VerificationRecord,
};
use cadastre_types::{ChallengeNonce, OwnerAddress, ParcelId, Timestamp};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

/// An in-memory implementation of every store trait.
/// Thread-safe for use with tokio's multi-threaded runtime.
#[derive(Default)]
pub struct NullStore {
    identities: Mutex<HashMap<OwnerAddress, Identity>>,
    parcels: Mutex<BTreeMap<ParcelId, ParcelRecord>>,
    transfers: Mutex<HashMap<Uuid, TransferRecord>>,
    shared_proofs: Mutex<Vec<SharedProofRecord>>,
    verifications: Mutex<Vec<VerificationRecord>>,
    fail_audit: AtomicBool,
    fail_parcel_writes: AtomicBool,
}

fn lock<T>(m: &Mutex<T>) -> Result<MutexGuard<'_, T>, StoreError> {
    m.lock()
        .map_err(|_| StoreError::Backend("mutex poisoned".into()))
}

impl NullStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every audit write fail with a backend error.
    pub fn set_audit_failure(&self, fail: bool) {
        self.fail_audit.store(fail, Ordering::SeqCst);
    }

    /// Make parcel inserts and updates fail with a backend error.
    pub fn set_parcel_write_failure(&self, fail: bool) {
        self.fail_parcel_writes.store(fail, Ordering::SeqCst);
    }

    /// Verification records written so far.
    pub fn verification_records(&self) -> Vec<VerificationRecord> {
        lock(&self.verifications).map(|v| v.clone()).unwrap_or_default()
    }

    fn audit_guard(&self) -> Result<(), StoreError> {
        if self.fail_audit.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("audit writes disabled".into()));
        }
        Ok(())
    }

    fn parcel_write_guard(&self) -> Result<(), StoreError> {
        if self.fail_parcel_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("parcel writes disabled".into()));
        }
        Ok(())
    }
}

impl IdentityStore for NullStore {
    fn get_identity(&self, address: &OwnerAddress) -> Result<Identity, StoreError> {
        lock(&self.identities)?
            .get(address)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(address.to_string()))
    }

    fn upsert_nonce(
        &self,
        address: &OwnerAddress,
        nonce: ChallengeNonce,
        now: Timestamp,
    ) -> Result<Identity, StoreError> {
        let mut identities = lock(&self.identities)?;
        let identity = identities
            .entry(*address)
            .or_insert_with(|| Identity::new(*address, now));
        identity.current_nonce = Some(nonce);
        Ok(identity.clone())
    }

    fn compare_and_swap_nonce(
        &self,
        address: &OwnerAddress,
        expected: ChallengeNonce,
        next: ChallengeNonce,
        now: Timestamp,
    ) -> Result<bool, StoreError> {
        let mut identities = lock(&self.identities)?;
        match identities.get_mut(address) {
            Some(identity) if identity.current_nonce == Some(expected) => {
                identity.current_nonce = Some(next);
                identity.last_login = Some(now);
                Ok(true)
            }
            Some(_) => Ok(false),
            None => Err(StoreError::NotFound(address.to_string())),
        }
    }

    fn set_authority(
        &self,
        address: &OwnerAddress,
        is_authority: bool,
        now: Timestamp,
    ) -> Result<(), StoreError> {
        let mut identities = lock(&self.identities)?;
        identities
            .entry(*address)
            .or_insert_with(|| Identity::new(*address, now))
            .is_authority = is_authority;
        Ok(())
    }

    fn identity_count(&self) -> Result<u64, StoreError> {
        Ok(lock(&self.identities)?.len() as u64)
    }
}

impl ParcelStore for NullStore {
    fn get_parcel(&self, parcel_id: ParcelId) -> Result<ParcelRecord, StoreError> {
        lock(&self.parcels)?
            .get(&parcel_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("parcel {parcel_id}")))
    }

    fn insert_parcel(&self, record: &ParcelRecord) -> Result<(), StoreError> {
        self.parcel_write_guard()?;
        let mut parcels = lock(&self.parcels)?;
        if parcels.contains_key(&record.parcel_id) {
            return Err(StoreError::Duplicate(format!("parcel {}", record.parcel_id)));
        }
        parcels.insert(record.parcel_id, record.clone());
        Ok(())
    }

    fn update_parcel(&self, record: &ParcelRecord) -> Result<(), StoreError> {
        self.parcel_write_guard()?;
        let mut parcels = lock(&self.parcels)?;
        match parcels.get_mut(&record.parcel_id) {
            Some(existing) => {
                *existing = record.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(format!("parcel {}", record.parcel_id))),
        }
    }

    fn remove_parcel(&self, parcel_id: ParcelId) -> Result<(), StoreError> {
        lock(&self.parcels)?.remove(&parcel_id);
        Ok(())
    }

    fn parcel_exists(&self, parcel_id: ParcelId) -> Result<bool, StoreError> {
        Ok(lock(&self.parcels)?.contains_key(&parcel_id))
    }

    fn parcels_by_owner(&self, owner: &OwnerAddress) -> Result<Vec<ParcelRecord>, StoreError> {
        Ok(lock(&self.parcels)?
            .values()
            .filter(|p| p.owner == *owner)
            .cloned()
            .collect())
    }

    fn parcel_count(&self) -> Result<u64, StoreError> {
        Ok(lock(&self.parcels)?.len() as u64)
    }
}

impl TransferStore for NullStore {
    fn get_transfer(&self, id: &Uuid) -> Result<TransferRecord, StoreError> {
        lock(&self.transfers)?
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("transfer {id}")))
    }

    fn put_transfer(&self, record: &TransferRecord) -> Result<(), StoreError> {
        lock(&self.transfers)?.insert(record.id, record.clone());
        Ok(())
    }

    fn pending_transfers(&self) -> Result<Vec<TransferRecord>, StoreError> {
        let mut pending: Vec<_> = lock(&self.transfers)?
            .values()
            .filter(|t| t.status == TransferStatus::Pending)
            .cloned()
            .collect();
        pending.sort_by_key(|t| t.requested_at);
        Ok(pending)
    }

    fn pending_for_parcel(
        &self,
        parcel_id: ParcelId,
    ) -> Result<Option<TransferRecord>, StoreError> {
        Ok(lock(&self.transfers)?
            .values()
            .find(|t| t.parcel_id == parcel_id && t.status == TransferStatus::Pending)
            .cloned())
    }
}

impl AuditStore for NullStore {
    fn record_shared_proof(&self, record: &SharedProofRecord) -> Result<(), StoreError> {
        self.audit_guard()?;
        lock(&self.shared_proofs)?.push(record.clone());
        Ok(())
    }

    fn record_verification(&self, record: &VerificationRecord) -> Result<(), StoreError> {
        self.audit_guard()?;
        lock(&self.verifications)?.push(record.clone());
        Ok(())
    }

    fn shared_proofs_by(
        &self,
        prover: &OwnerAddress,
    ) -> Result<Vec<SharedProofRecord>, StoreError> {
        let mut proofs: Vec<_> = lock(&self.shared_proofs)?
            .iter()
            .filter(|p| p.prover == *prover)
            .cloned()
            .collect();
        proofs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(proofs)
    }

    fn verification_count(
        &self,
        parcel_id: ParcelId,
        prover: &OwnerAddress,
    ) -> Result<u64, StoreError> {
        Ok(lock(&self.verifications)?
            .iter()
            .filter(|v| v.parcel_id == parcel_id && v.prover == *prover)
            .count() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(b: u8) -> OwnerAddress {
        OwnerAddress::new([b; 20])
    }

    #[test]
    fn cas_only_swaps_from_expected() {
        let store = NullStore::new();
        let now = Timestamp::from_millis(1);
        store.upsert_nonce(&addr(1), ChallengeNonce::new(5), now).unwrap();

        assert!(!store
            .compare_and_swap_nonce(&addr(1), ChallengeNonce::new(4), ChallengeNonce::new(6), now)
            .unwrap());
        assert!(store
            .compare_and_swap_nonce(&addr(1), ChallengeNonce::new(5), ChallengeNonce::new(6), now)
            .unwrap());
        assert!(!store
            .compare_and_swap_nonce(&addr(1), ChallengeNonce::new(5), ChallengeNonce::new(7), now)
            .unwrap());
        assert_eq!(
            store.get_identity(&addr(1)).unwrap().current_nonce,
            Some(ChallengeNonce::new(6))
        );
    }

    #[test]
    fn upsert_keeps_authority_flag() {
        let store = NullStore::new();
        let now = Timestamp::from_millis(1);
        store.set_authority(&addr(2), true, now).unwrap();
        let identity = store.upsert_nonce(&addr(2), ChallengeNonce::new(1), now).unwrap();
        assert!(identity.is_authority);
        assert_eq!(store.identity_count().unwrap(), 1);
    }

    #[test]
    fn audit_failure_switch() {
        let store = NullStore::new();
        store.set_audit_failure(true);
        let record = SharedProofRecord {
            parcel_id: ParcelId::new(1).unwrap(),
            prover: addr(1),
            verifier: None,
            challenge_nonce: ChallengeNonce::new(1),
            created_at: Timestamp::from_millis(1),
            expires_at: Timestamp::from_millis(2),
        };
        assert!(store.record_shared_proof(&record).is_err());
        store.set_audit_failure(false);
        assert!(store.record_shared_proof(&record).is_ok());
    }
}
