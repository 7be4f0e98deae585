//! Ledger snapshots: every parcel binding captured at a point in time.
//!
//! The in-process ledger persists itself as a JSON snapshot after every
//! write and reloads it on start. The snapshot hash is computed
//! deterministically from the entries and height so a tampered or truncated
//! file is detected on load.

use serde::{Deserialize, Serialize};

use cadastre_crypto::Packed;
use cadastre_types::{Hash32, OwnerAddress, ParcelId, Timestamp};

use crate::LedgerError;

pub const SNAPSHOT_VERSION: u32 = 1;

/// A ledger snapshot.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    /// Keccak-256 over the entries and height.
    pub hash: Hash32,
    /// Ledger height at which this snapshot was taken.
    pub height: u64,
    pub created_at: Timestamp,
    /// Entries ordered by parcel id.
    pub entries: Vec<SnapshotEntry>,
    pub version: u32,
}

/// The binding of one parcel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub parcel_id: ParcelId,
    pub owner: OwnerAddress,
    pub commitment: Hash32,
    /// Ledger height of the last write touching this parcel.
    pub updated_height: u64,
}

impl LedgerSnapshot {
    pub fn create(mut entries: Vec<SnapshotEntry>, height: u64, created_at: Timestamp) -> Self {
        entries.sort_by_key(|e| e.parcel_id);
        let mut snap = Self {
            hash: Hash32::ZERO,
            height,
            created_at,
            entries,
            version: SNAPSHOT_VERSION,
        };
        snap.hash = snap.compute_hash();
        snap
    }

    fn compute_hash(&self) -> Hash32 {
        let mut packed = Packed::new();
        for entry in &self.entries {
            packed = packed
                .parcel(entry.parcel_id)
                .address(&entry.owner)
                .hash(&entry.commitment)
                .uint256(entry.updated_height);
        }
        packed.uint256(self.height).keccak()
    }

    /// Verify the snapshot hash matches the entries.
    pub fn verify(&self) -> bool {
        self.hash == self.compute_hash()
    }

    pub fn to_json(&self) -> Result<String, LedgerError> {
        serde_json::to_string_pretty(self).map_err(|e| LedgerError::Snapshot(e.to_string()))
    }

    /// Parse and verify a snapshot.
    pub fn from_json(raw: &str) -> Result<Self, LedgerError> {
        let snap: Self =
            serde_json::from_str(raw).map_err(|e| LedgerError::Snapshot(e.to_string()))?;
        if snap.version != SNAPSHOT_VERSION {
            return Err(LedgerError::Snapshot(format!(
                "unsupported snapshot version {}",
                snap.version
            )));
        }
        if !snap.verify() {
            return Err(LedgerError::Snapshot("snapshot hash mismatch".into()));
        }
        Ok(snap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: u64) -> SnapshotEntry {
        SnapshotEntry {
            parcel_id: ParcelId::new(id).unwrap(),
            owner: OwnerAddress::new([id as u8; 20]),
            commitment: Hash32::new([0xAA; 32]),
            updated_height: id,
        }
    }

    #[test]
    fn test_create_and_verify() {
        let snap = LedgerSnapshot::create(vec![entry(2), entry(1)], 2, Timestamp::from_millis(5));
        assert!(snap.verify());
        assert_eq!(snap.entries[0].parcel_id.get(), 1);
    }

    #[test]
    fn test_tampered_snapshot_fails_verify() {
        let mut snap = LedgerSnapshot::create(vec![entry(1)], 1, Timestamp::from_millis(5));
        snap.entries[0].commitment = Hash32::new([0xBB; 32]);
        assert!(!snap.verify());
    }

    #[test]
    fn test_json_roundtrip() {
        let snap = LedgerSnapshot::create(vec![entry(1), entry(3)], 3, Timestamp::from_millis(5));
        let restored = LedgerSnapshot::from_json(&snap.to_json().unwrap()).unwrap();
        assert_eq!(restored.hash, snap.hash);
        assert_eq!(restored.entries, snap.entries);
    }

    #[test]
    fn test_tampered_json_rejected() {
        let snap = LedgerSnapshot::create(vec![entry(1)], 1, Timestamp::from_millis(5));
        let raw = snap.to_json().unwrap().replace("\"height\": 1", "\"height\": 9");
        assert!(matches!(
            LedgerSnapshot::from_json(&raw),
            Err(LedgerError::Snapshot(_))
        ));
    }

    #[test]
    fn test_hash_ignores_created_at() {
        let a = LedgerSnapshot::create(vec![entry(1)], 1, Timestamp::from_millis(5));
        let b = LedgerSnapshot::create(vec![entry(1)], 1, Timestamp::from_millis(9));
        assert_eq!(a.hash, b.hash);
    }
}
