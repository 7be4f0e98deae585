//! Nonce challenge–response login.
//!
//! Per identity the lifecycle is `NoChallenge → ChallengeIssued`, and from
//! `ChallengeIssued` a verification either succeeds (the nonce is rotated, so
//! the identity is immediately back in `ChallengeIssued` with a fresh nonce)
//! or fails (the nonce is left untouched). There is no resting "verified"
//! state; the session token carries that.

use std::sync::Arc;

use cadastre_crypto::{parse_signature, recover_personal_signer};
use cadastre_store::{Identity, IdentityStore, StoreError};
use cadastre_types::{ChallengeNonce, Clock, NonceSource, OwnerAddress};
use serde::Serialize;

use crate::error::AuthError;

/// The exact text a wallet must sign for `nonce`.
pub fn challenge_message(nonce: ChallengeNonce) -> String {
    format!("Please sign this nonce: {nonce}")
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Challenge {
    pub nonce: ChallengeNonce,
    pub message: String,
}

/// A wallet that has just proven control of its address.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatedIdentity {
    pub address: OwnerAddress,
    pub is_authority: bool,
    /// The nonce that replaced the one just consumed.
    #[serde(skip)]
    pub next_nonce: ChallengeNonce,
}

pub struct ChallengeAuthenticator {
    identities: Arc<dyn IdentityStore>,
    nonces: Arc<dyn NonceSource>,
    clock: Arc<dyn Clock>,
}

impl ChallengeAuthenticator {
    pub fn new(
        identities: Arc<dyn IdentityStore>,
        nonces: Arc<dyn NonceSource>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            identities,
            nonces,
            clock,
        }
    }

    /// Issue a fresh challenge, creating the identity on first contact.
    ///
    /// Any previously issued nonce for this address stops being valid.
    pub fn issue_challenge(&self, address: &OwnerAddress) -> Result<Challenge, AuthError> {
        let nonce = self.nonces.next_nonce();
        self.identities
            .upsert_nonce(address, nonce, self.clock.now())?;
        tracing::info!(address = %address, "login challenge issued");
        Ok(Challenge {
            nonce,
            message: challenge_message(nonce),
        })
    }

    /// The stored identity for `address`.
    pub fn identity(&self, address: &OwnerAddress) -> Result<Identity, AuthError> {
        match self.identities.get_identity(address) {
            Ok(identity) => Ok(identity),
            Err(StoreError::NotFound(_)) => Err(AuthError::IdentityNotFound(*address)),
            Err(e) => Err(e.into()),
        }
    }

    /// Check that `signature` is `address`'s signature over its outstanding
    /// challenge, then rotate the nonce.
    ///
    /// The rotation is a compare-and-swap against the nonce that was checked,
    /// so of two concurrent verifications of the same signature at most one
    /// succeeds.
    pub fn verify_challenge(
        &self,
        address: &OwnerAddress,
        signature: &str,
    ) -> Result<AuthenticatedIdentity, AuthError> {
        let identity = self.identity(address)?;
        let nonce = identity
            .current_nonce
            .ok_or(AuthError::IdentityNotFound(*address))?;

        let sig = parse_signature(signature)
            .map_err(|e| AuthError::MalformedSignature(e.to_string()))?;
        let message = challenge_message(nonce);
        let recovered = recover_personal_signer(message.as_bytes(), &sig).map_err(|e| {
            tracing::warn!(address = %address, error = %e, "signature recovery failed");
            AuthError::SignatureMismatch
        })?;
        if recovered != *address {
            tracing::warn!(address = %address, recovered = %recovered, "login signature mismatch");
            return Err(AuthError::SignatureMismatch);
        }

        let next = self.fresh_nonce(nonce);
        let swapped = self.identities.compare_and_swap_nonce(
            address,
            nonce,
            next,
            self.clock.now(),
        )?;
        if !swapped {
            tracing::warn!(address = %address, "challenge consumed concurrently");
            return Err(AuthError::SignatureMismatch);
        }

        tracing::info!(address = %address, authority = identity.is_authority, "wallet authenticated");
        Ok(AuthenticatedIdentity {
            address: *address,
            is_authority: identity.is_authority,
            next_nonce: next,
        })
    }

    /// A nonce different from `previous`, so a rotation can never leave the
    /// consumed signature valid.
    fn fresh_nonce(&self, previous: ChallengeNonce) -> ChallengeNonce {
        for _ in 0..16 {
            let candidate = self.nonces.next_nonce();
            if candidate != previous {
                return candidate;
            }
        }
        ChallengeNonce::new(previous.get().wrapping_add(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadastre_crypto::keypair_from_seed;
    use cadastre_nullables::{NullClock, NullNonceSource, NullStore};

    fn authenticator(nonces: Vec<u64>) -> (ChallengeAuthenticator, Arc<NullStore>) {
        let store = Arc::new(NullStore::new());
        let auth = ChallengeAuthenticator::new(
            store.clone(),
            Arc::new(NullNonceSource::new(nonces)),
            Arc::new(NullClock::new(1_700_000_000_000)),
        );
        (auth, store)
    }

    #[test]
    fn message_format_is_exact() {
        assert_eq!(
            challenge_message(ChallengeNonce::new(123456)),
            "Please sign this nonce: 123456"
        );
    }

    #[test]
    fn issue_creates_identity_with_nonce() {
        let (auth, store) = authenticator(vec![42]);
        let addr = OwnerAddress::new([1; 20]);
        let challenge = auth.issue_challenge(&addr).unwrap();
        assert_eq!(challenge.nonce.get(), 42);
        assert_eq!(challenge.message, "Please sign this nonce: 42");
        let identity = store.get_identity(&addr).unwrap();
        assert_eq!(identity.current_nonce, Some(ChallengeNonce::new(42)));
        assert!(!identity.is_authority);
    }

    #[test]
    fn valid_signature_authenticates_and_rotates() {
        let (auth, store) = authenticator(vec![42, 77]);
        let key = keypair_from_seed(&[3; 32]).unwrap();
        let challenge = auth.issue_challenge(&key.address()).unwrap();
        let sig = key.sign_personal_hex(challenge.message.as_bytes()).unwrap();

        let who = auth.verify_challenge(&key.address(), &sig).unwrap();
        assert_eq!(who.address, key.address());
        assert_eq!(who.next_nonce.get(), 77);
        assert_eq!(
            store.get_identity(&key.address()).unwrap().current_nonce,
            Some(ChallengeNonce::new(77))
        );
    }

    #[test]
    fn signature_is_single_use() {
        let (auth, _) = authenticator(vec![42, 77]);
        let key = keypair_from_seed(&[3; 32]).unwrap();
        let challenge = auth.issue_challenge(&key.address()).unwrap();
        let sig = key.sign_personal_hex(challenge.message.as_bytes()).unwrap();

        auth.verify_challenge(&key.address(), &sig).unwrap();
        assert!(matches!(
            auth.verify_challenge(&key.address(), &sig),
            Err(AuthError::SignatureMismatch)
        ));
    }

    #[test]
    fn rotation_never_reuses_the_consumed_nonce() {
        let (auth, store) = authenticator(vec![42, 42, 42, 9]);
        let key = keypair_from_seed(&[3; 32]).unwrap();
        let challenge = auth.issue_challenge(&key.address()).unwrap();
        let sig = key.sign_personal_hex(challenge.message.as_bytes()).unwrap();
        auth.verify_challenge(&key.address(), &sig).unwrap();
        assert_eq!(
            store.get_identity(&key.address()).unwrap().current_nonce,
            Some(ChallengeNonce::new(9))
        );
    }

    #[test]
    fn second_challenge_invalidates_first() {
        let (auth, _) = authenticator(vec![1, 2, 3]);
        let key = keypair_from_seed(&[3; 32]).unwrap();
        let first = auth.issue_challenge(&key.address()).unwrap();
        let stale = key.sign_personal_hex(first.message.as_bytes()).unwrap();
        auth.issue_challenge(&key.address()).unwrap();

        assert!(matches!(
            auth.verify_challenge(&key.address(), &stale),
            Err(AuthError::SignatureMismatch)
        ));
    }

    #[test]
    fn other_wallet_signature_rejected() {
        let (auth, store) = authenticator(vec![5, 6]);
        let owner = keypair_from_seed(&[3; 32]).unwrap();
        let intruder = keypair_from_seed(&[4; 32]).unwrap();
        let challenge = auth.issue_challenge(&owner.address()).unwrap();
        let sig = intruder
            .sign_personal_hex(challenge.message.as_bytes())
            .unwrap();

        assert!(matches!(
            auth.verify_challenge(&owner.address(), &sig),
            Err(AuthError::SignatureMismatch)
        ));
        // A failed attempt leaves the nonce in place.
        assert_eq!(
            store.get_identity(&owner.address()).unwrap().current_nonce,
            Some(ChallengeNonce::new(5))
        );
    }

    #[test]
    fn unknown_identity_is_not_found() {
        let (auth, _) = authenticator(vec![1]);
        let sig = format!("0x{}", "11".repeat(65));
        assert!(matches!(
            auth.verify_challenge(&OwnerAddress::new([8; 20]), &sig),
            Err(AuthError::IdentityNotFound(_))
        ));
    }

    #[test]
    fn identity_lookup_reports_role_and_unknown_wallets() {
        let (auth, store) = authenticator(vec![1]);
        let addr = OwnerAddress::new([8; 20]);
        assert!(matches!(
            auth.identity(&addr),
            Err(AuthError::IdentityNotFound(_))
        ));
        store
            .set_authority(&addr, true, cadastre_types::Timestamp::from_millis(1))
            .unwrap();
        let identity = auth.identity(&addr).unwrap();
        assert!(identity.is_authority);
        assert_eq!(identity.current_nonce, None);
    }

    #[test]
    fn seeded_authority_without_challenge_is_not_found() {
        let (auth, store) = authenticator(vec![1]);
        let addr = OwnerAddress::new([8; 20]);
        store
            .set_authority(&addr, true, cadastre_types::Timestamp::from_millis(1))
            .unwrap();
        let sig = format!("0x{}", "11".repeat(65));
        assert!(matches!(
            auth.verify_challenge(&addr, &sig),
            Err(AuthError::IdentityNotFound(_))
        ));
    }

    #[test]
    fn authority_flag_is_reported() {
        let (auth, store) = authenticator(vec![5, 6]);
        let key = keypair_from_seed(&[3; 32]).unwrap();
        store
            .set_authority(&key.address(), true, cadastre_types::Timestamp::from_millis(1))
            .unwrap();
        let challenge = auth.issue_challenge(&key.address()).unwrap();
        let sig = key.sign_personal_hex(challenge.message.as_bytes()).unwrap();
        assert!(auth.verify_challenge(&key.address(), &sig).unwrap().is_authority);
    }

    #[test]
    fn garbage_signature_is_malformed() {
        let (auth, _) = authenticator(vec![5]);
        let addr = OwnerAddress::new([8; 20]);
        auth.issue_challenge(&addr).unwrap();
        assert!(matches!(
            auth.verify_challenge(&addr, "0xnothex"),
            Err(AuthError::MalformedSignature(_))
        ));
    }
}
