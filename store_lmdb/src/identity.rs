//! LMDB implementation of IdentityStore.
//!
//! Keyed by the 20 address bytes. Nonce updates read and write inside one
//! write transaction; LMDB serialises writers, which makes them atomic.

use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, RoTxn};

use cadastre_store::{Identity, IdentityStore, StoreError};
use cadastre_types::{ChallengeNonce, OwnerAddress, Timestamp};

use crate::LmdbError;

pub struct LmdbIdentityStore {
    pub(crate) env: Arc<Env>,
    pub(crate) identities_db: Database<Bytes, Bytes>,
}

impl LmdbIdentityStore {
    fn read(&self, txn: &RoTxn<'_>, address: &OwnerAddress) -> Result<Option<Identity>, LmdbError> {
        match self.identities_db.get(txn, address.as_bytes())? {
            Some(bytes) => Ok(Some(bincode::deserialize(bytes)?)),
            None => Ok(None),
        }
    }

    /// Load (or create) the identity, apply `f`, and write it back in a
    /// single write transaction. `f` returns `false` to abort without writing.
    fn update<F>(&self, address: &OwnerAddress, now: Timestamp, f: F) -> Result<Option<Identity>, LmdbError>
    where
        F: FnOnce(&mut Identity) -> bool,
    {
        let mut wtxn = self.env.write_txn()?;
        let mut identity = self
            .read(&wtxn, address)?
            .unwrap_or_else(|| Identity::new(*address, now));
        if !f(&mut identity) {
            return Ok(None);
        }
        let bytes = bincode::serialize(&identity)?;
        self.identities_db.put(&mut wtxn, address.as_bytes(), &bytes)?;
        wtxn.commit()?;
        Ok(Some(identity))
    }
}

impl IdentityStore for LmdbIdentityStore {
    fn get_identity(&self, address: &OwnerAddress) -> Result<Identity, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let identity = self
            .read(&rtxn, address)?
            .ok_or_else(|| LmdbError::NotFound(format!("identity {address}")))?;
        Ok(identity)
    }

    fn upsert_nonce(
        &self,
        address: &OwnerAddress,
        nonce: ChallengeNonce,
        now: Timestamp,
    ) -> Result<Identity, StoreError> {
        let identity = self
            .update(address, now, |identity| {
                identity.current_nonce = Some(nonce);
                true
            })?
            .ok_or_else(|| LmdbError::Heed("nonce upsert aborted".into()))?;
        Ok(identity)
    }

    fn compare_and_swap_nonce(
        &self,
        address: &OwnerAddress,
        expected: ChallengeNonce,
        next: ChallengeNonce,
        now: Timestamp,
    ) -> Result<bool, StoreError> {
        let swapped = self.update(address, now, |identity| {
            if identity.current_nonce != Some(expected) {
                return false;
            }
            identity.current_nonce = Some(next);
            identity.last_login = Some(now);
            true
        })?;
        Ok(swapped.is_some())
    }

    fn set_authority(
        &self,
        address: &OwnerAddress,
        is_authority: bool,
        now: Timestamp,
    ) -> Result<(), StoreError> {
        self.update(address, now, |identity| {
            identity.is_authority = is_authority;
            true
        })?;
        Ok(())
    }

    fn identity_count(&self) -> Result<u64, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let count = self.identities_db.len(&rtxn).map_err(LmdbError::from)?;
        Ok(count)
    }
}
