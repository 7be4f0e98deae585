//! Cross-check a claimed commitment against the ledger.

use cadastre_types::{Hash32, ParcelId};
use serde::{Deserialize, Serialize};

use crate::ledger::CommitmentLedger;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LedgerStatus {
    Matched,
    Mismatch,
    NotFound,
    Unavailable,
}

/// Result of comparing an expected commitment with the ledger's binding.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitmentCheck {
    pub status: LedgerStatus,
    pub ledger_commitment: Option<Hash32>,
    pub expected_commitment: Hash32,
    pub reason: String,
}

impl CommitmentCheck {
    pub fn is_valid(&self) -> bool {
        self.status == LedgerStatus::Matched
    }
}

/// Read the ledger binding for `parcel_id` and compare it with `expected`.
///
/// Never fails: an unreachable ledger is reported as
/// [`LedgerStatus::Unavailable`], distinct from a missing parcel or a
/// mismatch.
pub async fn verify_parcel_commitment<L>(
    ledger: &L,
    parcel_id: ParcelId,
    expected: Hash32,
) -> CommitmentCheck
where
    L: CommitmentLedger + ?Sized,
{
    let (status, ledger_commitment, reason) = match ledger.get_commitment(parcel_id).await {
        Err(e) => {
            tracing::warn!(parcel = %parcel_id, error = %e, "ledger read failed");
            (LedgerStatus::Unavailable, None, format!("Ledger unavailable: {e}"))
        }
        Ok(entry) => match entry.commitment_hash.filter(|_| entry.exists) {
            None => (
                LedgerStatus::NotFound,
                None,
                "Parcel does not exist on the ledger".to_owned(),
            ),
            Some(on_ledger) if on_ledger == expected => (
                LedgerStatus::Matched,
                Some(on_ledger),
                "Commitment verified".to_owned(),
            ),
            Some(on_ledger) => (
                LedgerStatus::Mismatch,
                Some(on_ledger),
                "Commitment mismatch".to_owned(),
            ),
        },
    };
    CommitmentCheck {
        status,
        ledger_commitment,
        expected_commitment: expected,
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemoryLedger;
    use cadastre_types::OwnerAddress;

    fn pid() -> ParcelId {
        ParcelId::new(11).unwrap()
    }

    async fn ledger_with(commitment: Hash32) -> InMemoryLedger {
        let ledger = InMemoryLedger::new();
        ledger
            .register_commitment(pid(), OwnerAddress::new([1; 20]), commitment)
            .await
            .unwrap();
        ledger
    }

    #[tokio::test]
    async fn matching_commitment_verifies() {
        let ledger = ledger_with(Hash32::new([4; 32])).await;
        let check = verify_parcel_commitment(&ledger, pid(), Hash32::new([4; 32])).await;
        assert!(check.is_valid());
        assert_eq!(check.reason, "Commitment verified");
    }

    #[tokio::test]
    async fn different_commitment_is_mismatch() {
        let ledger = ledger_with(Hash32::new([4; 32])).await;
        let check = verify_parcel_commitment(&ledger, pid(), Hash32::new([5; 32])).await;
        assert_eq!(check.status, LedgerStatus::Mismatch);
        assert_eq!(check.ledger_commitment, Some(Hash32::new([4; 32])));
    }

    #[tokio::test]
    async fn unknown_parcel_is_not_found() {
        let ledger = InMemoryLedger::new();
        let check = verify_parcel_commitment(&ledger, pid(), Hash32::new([5; 32])).await;
        assert_eq!(check.status, LedgerStatus::NotFound);
        assert!(!check.is_valid());
    }
}
