//! LMDB implementation of TransferStore, keyed by the 16 request-id bytes.

use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env};
use uuid::Uuid;

use cadastre_store::{StoreError, TransferRecord, TransferStatus, TransferStore};
use cadastre_types::ParcelId;

use crate::LmdbError;

pub struct LmdbTransferStore {
    pub(crate) env: Arc<Env>,
    pub(crate) transfers_db: Database<Bytes, Bytes>,
}

impl LmdbTransferStore {
    fn pending(&self) -> Result<Vec<TransferRecord>, LmdbError> {
        let rtxn = self.env.read_txn()?;
        let mut pending = Vec::new();
        for result in self.transfers_db.iter(&rtxn)? {
            let (_key, val) = result?;
            let record: TransferRecord = bincode::deserialize(val)?;
            if record.status == TransferStatus::Pending {
                pending.push(record);
            }
        }
        pending.sort_by_key(|t| t.requested_at);
        Ok(pending)
    }
}

impl TransferStore for LmdbTransferStore {
    fn get_transfer(&self, id: &Uuid) -> Result<TransferRecord, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let val = self
            .transfers_db
            .get(&rtxn, id.as_bytes())
            .map_err(LmdbError::from)?
            .ok_or_else(|| LmdbError::NotFound(format!("transfer {id}")))?;
        let record: TransferRecord = bincode::deserialize(val).map_err(LmdbError::from)?;
        Ok(record)
    }

    fn put_transfer(&self, record: &TransferRecord) -> Result<(), StoreError> {
        let bytes = bincode::serialize(record).map_err(LmdbError::from)?;
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        self.transfers_db
            .put(&mut wtxn, record.id.as_bytes(), &bytes)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn pending_transfers(&self) -> Result<Vec<TransferRecord>, StoreError> {
        Ok(self.pending()?)
    }

    fn pending_for_parcel(
        &self,
        parcel_id: ParcelId,
    ) -> Result<Option<TransferRecord>, StoreError> {
        Ok(self
            .pending()?
            .into_iter()
            .find(|t| t.parcel_id == parcel_id))
    }
}
