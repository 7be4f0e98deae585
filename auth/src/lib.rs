//! Wallet login for the cadastre registry.
//!
//! A wallet proves control of its address by signing a server-issued nonce
//! (`personal_sign`). Each nonce authenticates at most once: it is rotated
//! atomically on every successful verification. A successful login is turned
//! into an HMAC-signed session token by [`SessionIssuer`].

pub mod challenge;
pub mod error;
pub mod nonce;
pub mod session;

pub use challenge::{challenge_message, AuthenticatedIdentity, Challenge, ChallengeAuthenticator};
pub use error::{AuthError, SessionError};
pub use nonce::OsNonceSource;
pub use session::{SessionClaims, SessionIssuer, SessionToken};
