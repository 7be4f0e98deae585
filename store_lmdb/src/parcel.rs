//! LMDB implementation of ParcelStore.
//!
//! `parcels` is keyed by the big-endian parcel id. `owner_parcels` is an
//! index keyed `owner ++ parcel_id` with empty values, kept in step with
//! `parcels` inside the same write transaction.

use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, RwTxn};

use cadastre_store::{ParcelRecord, ParcelStore, StoreError};
use cadastre_types::{OwnerAddress, ParcelId};

use crate::keys::{increment_prefix, owner_parcel_key};
use crate::LmdbError;

pub struct LmdbParcelStore {
    pub(crate) env: Arc<Env>,
    pub(crate) parcels_db: Database<Bytes, Bytes>,
    pub(crate) owner_parcels_db: Database<Bytes, Bytes>,
}

impl LmdbParcelStore {
    fn write_record(&self, wtxn: &mut RwTxn<'_>, record: &ParcelRecord) -> Result<(), LmdbError> {
        let bytes = bincode::serialize(record)?;
        self.parcels_db
            .put(wtxn, &record.parcel_id.to_be_bytes(), &bytes)?;
        self.owner_parcels_db
            .put(wtxn, &owner_parcel_key(&record.owner, record.parcel_id), &[])?;
        Ok(())
    }
}

impl ParcelStore for LmdbParcelStore {
    fn get_parcel(&self, parcel_id: ParcelId) -> Result<ParcelRecord, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let val = self
            .parcels_db
            .get(&rtxn, &parcel_id.to_be_bytes())
            .map_err(LmdbError::from)?
            .ok_or_else(|| LmdbError::NotFound(format!("parcel {parcel_id}")))?;
        let record: ParcelRecord = bincode::deserialize(val).map_err(LmdbError::from)?;
        Ok(record)
    }

    fn insert_parcel(&self, record: &ParcelRecord) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let exists = self
            .parcels_db
            .get(&wtxn, &record.parcel_id.to_be_bytes())
            .map_err(LmdbError::from)?
            .is_some();
        if exists {
            return Err(LmdbError::Duplicate(format!("parcel {}", record.parcel_id)).into());
        }
        self.write_record(&mut wtxn, record)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn update_parcel(&self, record: &ParcelRecord) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let previous: ParcelRecord = match self
            .parcels_db
            .get(&wtxn, &record.parcel_id.to_be_bytes())
            .map_err(LmdbError::from)?
        {
            Some(bytes) => bincode::deserialize(bytes).map_err(LmdbError::from)?,
            None => {
                return Err(LmdbError::NotFound(format!("parcel {}", record.parcel_id)).into())
            }
        };
        if previous.owner != record.owner {
            self.owner_parcels_db
                .delete(&mut wtxn, &owner_parcel_key(&previous.owner, record.parcel_id))
                .map_err(LmdbError::from)?;
        }
        self.write_record(&mut wtxn, record)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn remove_parcel(&self, parcel_id: ParcelId) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let existing: Option<ParcelRecord> = match self
            .parcels_db
            .get(&wtxn, &parcel_id.to_be_bytes())
            .map_err(LmdbError::from)?
        {
            Some(bytes) => Some(bincode::deserialize(bytes).map_err(LmdbError::from)?),
            None => None,
        };
        let Some(record) = existing else {
            return Ok(());
        };
        self.parcels_db
            .delete(&mut wtxn, &parcel_id.to_be_bytes())
            .map_err(LmdbError::from)?;
        self.owner_parcels_db
            .delete(&mut wtxn, &owner_parcel_key(&record.owner, parcel_id))
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn parcel_exists(&self, parcel_id: ParcelId) -> Result<bool, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let found = self
            .parcels_db
            .get(&rtxn, &parcel_id.to_be_bytes())
            .map_err(LmdbError::from)?
            .is_some();
        Ok(found)
    }

    fn parcels_by_owner(&self, owner: &OwnerAddress) -> Result<Vec<ParcelRecord>, StoreError> {
        let prefix = owner.as_bytes().as_slice();
        let mut upper = prefix.to_vec();
        increment_prefix(&mut upper);

        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let ids: Vec<[u8; 8]> = {
            let bounds = (
                std::ops::Bound::Included(prefix),
                if upper.is_empty() {
                    std::ops::Bound::Unbounded
                } else {
                    std::ops::Bound::Excluded(upper.as_slice())
                },
            );
            let mut ids = Vec::new();
            for result in self
                .owner_parcels_db
                .range(&rtxn, &bounds)
                .map_err(LmdbError::from)?
            {
                let (key, _) = result.map_err(LmdbError::from)?;
                let id: [u8; 8] = key
                    .get(20..)
                    .and_then(|tail| tail.try_into().ok())
                    .ok_or_else(|| LmdbError::Serialization("invalid owner index key".into()))?;
                ids.push(id);
            }
            ids
        };

        let mut records = Vec::with_capacity(ids.len());
        for id in ids {
            let val = self
                .parcels_db
                .get(&rtxn, &id)
                .map_err(LmdbError::from)?
                .ok_or_else(|| {
                    LmdbError::Serialization(format!(
                        "owner index points at missing parcel {}",
                        u64::from_be_bytes(id)
                    ))
                })?;
            let record: ParcelRecord = bincode::deserialize(val).map_err(LmdbError::from)?;
            records.push(record);
        }
        Ok(records)
    }

    fn parcel_count(&self) -> Result<u64, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let count = self.parcels_db.len(&rtxn).map_err(LmdbError::from)?;
        Ok(count)
    }
}
