use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("config error: {0}")]
    Config(String),

    #[error("store error: {0}")]
    Store(#[from] cadastre_store::StoreError),

    #[error("LMDB error: {0}")]
    Lmdb(#[from] cadastre_store_lmdb::LmdbError),

    #[error("ledger error: {0}")]
    Ledger(#[from] cadastre_ledger::LedgerError),

    #[error("session setup error: {0}")]
    Session(#[from] cadastre_auth::SessionError),

    #[error("metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("database integrity check failed: {0}")]
    Integrity(String),

    #[error("logging already initialised: {0}")]
    Logging(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
