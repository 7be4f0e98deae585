use thiserror::Error;

/// Failure reported by any store backend.
///
/// Callers map `NotFound` onto their own domain error (unknown identity,
/// parcel or transfer); everything else is an infrastructure failure.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no record for {0}")]
    NotFound(String),

    #[error("record already stored: {0}")]
    Duplicate(String),

    #[error("store backend failure: {0}")]
    Backend(String),

    #[error("stored record could not be decoded: {0}")]
    Serialization(String),
}
