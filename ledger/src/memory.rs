//! In-process commitment ledger with optional snapshot persistence.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use async_trait::async_trait;
use cadastre_types::{Hash32, OwnerAddress, ParcelId, Timestamp};

use crate::ledger::{CommitmentLedger, LedgerEntry};
use crate::snapshot::{LedgerSnapshot, SnapshotEntry};
use crate::LedgerError;

#[derive(Default)]
struct LedgerState {
    entries: BTreeMap<ParcelId, SnapshotEntry>,
    height: u64,
}

/// A ledger held in memory. When opened with a path, every write is
/// followed by a snapshot written to that path (via a temporary file and a
/// rename).
#[derive(Default)]
pub struct InMemoryLedger {
    state: RwLock<LedgerState>,
    snapshot_path: Option<PathBuf>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a persisted ledger, loading the snapshot at `path` if it exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let path = path.as_ref().to_path_buf();
        let mut state = LedgerState::default();
        if path.exists() {
            let raw = std::fs::read_to_string(&path)
                .map_err(|e| LedgerError::Snapshot(format!("{}: {e}", path.display())))?;
            let snap = LedgerSnapshot::from_json(&raw)?;
            tracing::info!(
                parcels = snap.entries.len(),
                height = snap.height,
                "loaded ledger snapshot"
            );
            state.height = snap.height;
            state.entries = snap
                .entries
                .into_iter()
                .map(|e| (e.parcel_id, e))
                .collect();
        }
        Ok(Self {
            state: RwLock::new(state),
            snapshot_path: Some(path),
        })
    }

    /// Capture the current state.
    pub fn snapshot(&self) -> Result<LedgerSnapshot, LedgerError> {
        let state = self
            .state
            .read()
            .map_err(|_| LedgerError::Unavailable("ledger lock poisoned".into()))?;
        Ok(Self::snapshot_of(&state))
    }

    fn snapshot_of(state: &LedgerState) -> LedgerSnapshot {
        LedgerSnapshot::create(
            state.entries.values().cloned().collect(),
            state.height,
            Timestamp::now(),
        )
    }

    fn persist(&self, state: &LedgerState) -> Result<(), LedgerError> {
        let Some(path) = &self.snapshot_path else {
            return Ok(());
        };
        let json = Self::snapshot_of(state).to_json()?;
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, json)
            .and_then(|_| std::fs::rename(&tmp, path))
            .map_err(|e| LedgerError::Unavailable(format!("snapshot write failed: {e}")))
    }

    fn write<F>(&self, apply: F) -> Result<u64, LedgerError>
    where
        F: FnOnce(&mut LedgerState) -> Result<(), LedgerError>,
    {
        let mut state = self
            .state
            .write()
            .map_err(|_| LedgerError::Unavailable("ledger lock poisoned".into()))?;
        apply(&mut state)?;
        self.persist(&state)?;
        Ok(state.height)
    }
}

#[async_trait]
impl CommitmentLedger for InMemoryLedger {
    async fn get_commitment(&self, parcel_id: ParcelId) -> Result<LedgerEntry, LedgerError> {
        let state = self
            .state
            .read()
            .map_err(|_| LedgerError::Unavailable("ledger lock poisoned".into()))?;
        Ok(match state.entries.get(&parcel_id) {
            Some(entry) => LedgerEntry {
                exists: true,
                commitment_hash: Some(entry.commitment),
                owner: Some(entry.owner),
            },
            None => LedgerEntry::missing(),
        })
    }

    async fn register_commitment(
        &self,
        parcel_id: ParcelId,
        owner: OwnerAddress,
        commitment: Hash32,
    ) -> Result<u64, LedgerError> {
        let height = self.write(|state| {
            if state.entries.contains_key(&parcel_id) {
                return Err(LedgerError::AlreadyRegistered(parcel_id));
            }
            state.height += 1;
            let updated_height = state.height;
            state.entries.insert(
                parcel_id,
                SnapshotEntry {
                    parcel_id,
                    owner,
                    commitment,
                    updated_height,
                },
            );
            Ok(())
        })?;
        tracing::info!(parcel = %parcel_id, owner = %owner, height, "commitment registered");
        Ok(height)
    }

    async fn transfer_commitment(
        &self,
        parcel_id: ParcelId,
        new_owner: OwnerAddress,
        new_commitment: Hash32,
    ) -> Result<u64, LedgerError> {
        let height = self.write(|state| {
            let next_height = state.height + 1;
            let entry = state
                .entries
                .get_mut(&parcel_id)
                .ok_or(LedgerError::ParcelNotFound(parcel_id))?;
            entry.owner = new_owner;
            entry.commitment = new_commitment;
            entry.updated_height = next_height;
            state.height = next_height;
            Ok(())
        })?;
        tracing::info!(parcel = %parcel_id, new_owner = %new_owner, height, "commitment transferred");
        Ok(height)
    }

    async fn height(&self) -> Result<u64, LedgerError> {
        let state = self
            .state
            .read()
            .map_err(|_| LedgerError::Unavailable("ledger lock poisoned".into()))?;
        Ok(state.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(id: u64) -> ParcelId {
        ParcelId::new(id).unwrap()
    }

    #[tokio::test]
    async fn register_then_read() {
        let ledger = InMemoryLedger::new();
        let owner = OwnerAddress::new([1; 20]);
        let h = ledger
            .register_commitment(pid(1), owner, Hash32::new([2; 32]))
            .await
            .unwrap();
        assert_eq!(h, 1);

        let entry = ledger.get_commitment(pid(1)).await.unwrap();
        assert!(entry.exists);
        assert_eq!(entry.commitment_hash, Some(Hash32::new([2; 32])));
        assert_eq!(entry.owner, Some(owner));
    }

    #[tokio::test]
    async fn missing_parcel_reads_as_not_existing() {
        let ledger = InMemoryLedger::new();
        let entry = ledger.get_commitment(pid(9)).await.unwrap();
        assert_eq!(entry, LedgerEntry::missing());
    }

    #[tokio::test]
    async fn duplicate_registration_rejected() {
        let ledger = InMemoryLedger::new();
        let owner = OwnerAddress::new([1; 20]);
        ledger
            .register_commitment(pid(1), owner, Hash32::new([2; 32]))
            .await
            .unwrap();
        let err = ledger
            .register_commitment(pid(1), owner, Hash32::new([3; 32]))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::AlreadyRegistered(_)));
        assert_eq!(ledger.height().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn transfer_rebinds_owner_and_commitment() {
        let ledger = InMemoryLedger::new();
        ledger
            .register_commitment(pid(1), OwnerAddress::new([1; 20]), Hash32::new([2; 32]))
            .await
            .unwrap();
        let h = ledger
            .transfer_commitment(pid(1), OwnerAddress::new([5; 20]), Hash32::new([6; 32]))
            .await
            .unwrap();
        assert_eq!(h, 2);
        let entry = ledger.get_commitment(pid(1)).await.unwrap();
        assert_eq!(entry.owner, Some(OwnerAddress::new([5; 20])));
        assert_eq!(entry.commitment_hash, Some(Hash32::new([6; 32])));
    }

    #[tokio::test]
    async fn transfer_of_unknown_parcel_fails() {
        let ledger = InMemoryLedger::new();
        let err = ledger
            .transfer_commitment(pid(4), OwnerAddress::new([5; 20]), Hash32::new([6; 32]))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::ParcelNotFound(_)));
    }

    #[tokio::test]
    async fn snapshot_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        {
            let ledger = InMemoryLedger::open(&path).unwrap();
            ledger
                .register_commitment(pid(7), OwnerAddress::new([1; 20]), Hash32::new([2; 32]))
                .await
                .unwrap();
        }
        let reopened = InMemoryLedger::open(&path).unwrap();
        assert_eq!(reopened.height().await.unwrap(), 1);
        assert!(reopened.get_commitment(pid(7)).await.unwrap().exists);
    }

    #[tokio::test]
    async fn corrupted_snapshot_refuses_to_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            InMemoryLedger::open(&path),
            Err(LedgerError::Snapshot(_))
        ));
    }
}
