//! LMDB environment setup.

use std::path::Path;
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};

use crate::audit::LmdbAuditStore;
use crate::identity::LmdbIdentityStore;
use crate::parcel::LmdbParcelStore;
use crate::transfer::LmdbTransferStore;
use crate::LmdbError;

pub(crate) const IDENTITIES_DB: &str = "identities";
pub(crate) const PARCELS_DB: &str = "parcels";
pub(crate) const OWNER_PARCELS_DB: &str = "owner_parcels";
pub(crate) const TRANSFERS_DB: &str = "transfers";
pub(crate) const SHARED_PROOFS_DB: &str = "shared_proofs";
pub(crate) const VERIFICATIONS_DB: &str = "verifications";

pub(crate) const ALL_DATABASES: &[&str] = &[
    IDENTITIES_DB,
    PARCELS_DB,
    OWNER_PARCELS_DB,
    TRANSFERS_DB,
    SHARED_PROOFS_DB,
    VERIFICATIONS_DB,
];

/// Default map size: 1 GiB.
pub const DEFAULT_MAP_SIZE: usize = 1 << 30;

/// Wraps the LMDB environment and all database handles.
pub struct LmdbEnvironment {
    env: Arc<Env>,
    identities_db: Database<Bytes, Bytes>,
    parcels_db: Database<Bytes, Bytes>,
    owner_parcels_db: Database<Bytes, Bytes>,
    transfers_db: Database<Bytes, Bytes>,
    shared_proofs_db: Database<Bytes, Bytes>,
    verifications_db: Database<Bytes, Bytes>,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment at the given directory, creating
    /// every database that does not exist yet.
    pub fn open(path: &Path, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path)
            .map_err(|e| LmdbError::Heed(format!("cannot create {}: {e}", path.display())))?;

        let mut options = EnvOpenOptions::new();
        options.map_size(map_size).max_dbs(ALL_DATABASES.len() as u32);
        // SAFETY: each data directory is opened once per process; the node
        // owns it exclusively for its lifetime.
        let env = unsafe { options.open(path)? };

        let mut wtxn = env.write_txn()?;
        let identities_db = env.create_database(&mut wtxn, Some(IDENTITIES_DB))?;
        let parcels_db = env.create_database(&mut wtxn, Some(PARCELS_DB))?;
        let owner_parcels_db = env.create_database(&mut wtxn, Some(OWNER_PARCELS_DB))?;
        let transfers_db = env.create_database(&mut wtxn, Some(TRANSFERS_DB))?;
        let shared_proofs_db = env.create_database(&mut wtxn, Some(SHARED_PROOFS_DB))?;
        let verifications_db = env.create_database(&mut wtxn, Some(VERIFICATIONS_DB))?;
        wtxn.commit()?;

        tracing::info!(path = %path.display(), map_size, "LMDB environment opened");
        Ok(Self {
            env: Arc::new(env),
            identities_db,
            parcels_db,
            owner_parcels_db,
            transfers_db,
            shared_proofs_db,
            verifications_db,
        })
    }

    pub fn env(&self) -> &Arc<Env> {
        &self.env
    }

    pub fn identity_store(&self) -> LmdbIdentityStore {
        LmdbIdentityStore {
            env: Arc::clone(&self.env),
            identities_db: self.identities_db,
        }
    }

    pub fn parcel_store(&self) -> LmdbParcelStore {
        LmdbParcelStore {
            env: Arc::clone(&self.env),
            parcels_db: self.parcels_db,
            owner_parcels_db: self.owner_parcels_db,
        }
    }

    pub fn transfer_store(&self) -> LmdbTransferStore {
        LmdbTransferStore {
            env: Arc::clone(&self.env),
            transfers_db: self.transfers_db,
        }
    }

    pub fn audit_store(&self) -> LmdbAuditStore {
        LmdbAuditStore {
            env: Arc::clone(&self.env),
            shared_proofs_db: self.shared_proofs_db,
            verifications_db: self.verifications_db,
        }
    }
}
