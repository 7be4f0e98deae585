//! LMDB implementation of AuditStore.
//!
//! Both databases are append-only. A per-database sequence number (the entry
//! count at insert time) keeps keys unique within the same millisecond.

use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env};

use cadastre_store::{AuditStore, SharedProofRecord, StoreError, VerificationRecord};
use cadastre_types::{OwnerAddress, ParcelId};

use crate::keys::{range_scan_values, shared_proof_key, verification_prefix};
use crate::LmdbError;

pub struct LmdbAuditStore {
    pub(crate) env: Arc<Env>,
    pub(crate) shared_proofs_db: Database<Bytes, Bytes>,
    pub(crate) verifications_db: Database<Bytes, Bytes>,
}

impl AuditStore for LmdbAuditStore {
    fn record_shared_proof(&self, record: &SharedProofRecord) -> Result<(), StoreError> {
        let bytes = bincode::serialize(record).map_err(LmdbError::from)?;
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let seq = self.shared_proofs_db.len(&wtxn).map_err(LmdbError::from)?;
        let key = shared_proof_key(&record.prover, record.created_at, seq);
        self.shared_proofs_db
            .put(&mut wtxn, &key, &bytes)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn record_verification(&self, record: &VerificationRecord) -> Result<(), StoreError> {
        let bytes = bincode::serialize(record).map_err(LmdbError::from)?;
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let seq = self.verifications_db.len(&wtxn).map_err(LmdbError::from)?;
        let mut key = verification_prefix(record.parcel_id, &record.prover);
        key.extend_from_slice(&seq.to_be_bytes());
        self.verifications_db
            .put(&mut wtxn, &key, &bytes)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn shared_proofs_by(
        &self,
        prover: &OwnerAddress,
    ) -> Result<Vec<SharedProofRecord>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let mut records = range_scan_values(&self.shared_proofs_db, &rtxn, prover.as_bytes())?
            .iter()
            .map(|bytes| bincode::deserialize::<SharedProofRecord>(bytes))
            .collect::<Result<Vec<_>, _>>()
            .map_err(LmdbError::from)?;
        records.reverse();
        Ok(records)
    }

    fn verification_count(
        &self,
        parcel_id: ParcelId,
        prover: &OwnerAddress,
    ) -> Result<u64, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let prefix = verification_prefix(parcel_id, prover);
        let count = range_scan_values(&self.verifications_db, &rtxn, &prefix)?.len();
        Ok(count as u64)
    }
}
