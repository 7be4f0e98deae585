//! Route handlers, one module per API area.

pub mod auth;
pub mod health;
pub mod parcels;
pub mod transfers;
pub mod users;
pub mod zk;

use cadastre_types::OwnerAddress;

use crate::error::RpcError;

/// An optional verifier from a request body. Empty, `"0"`, `"0x0"`,
/// `"PUBLIC"` and the zero address all mean "anyone may verify".
pub(crate) fn optional_verifier(raw: Option<&str>) -> Result<Option<OwnerAddress>, RpcError> {
    match raw.map(str::trim) {
        None | Some("") | Some("0") | Some("0x0") | Some("PUBLIC") => Ok(None),
        Some(other) => {
            let addr = OwnerAddress::parse(other)?;
            Ok((!addr.is_zero()).then_some(addr))
        }
    }
}
