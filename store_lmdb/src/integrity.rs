//! LMDB database integrity checks.
//!
//! Run on startup to detect corruption early, before the node starts serving
//! requests.

use std::path::Path;

use heed::types::Bytes;
use heed::Env;

use crate::environment::ALL_DATABASES;
use crate::LmdbError;

/// Summary of an integrity check run.
#[derive(Debug)]
pub struct IntegrityReport {
    pub databases_checked: u32,
    pub total_entries: u64,
    pub errors: Vec<String>,
}

impl IntegrityReport {
    pub fn is_healthy(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Open each expected database and count its entries. Read failures are
/// collected in the report rather than returned.
pub fn check_integrity(env: &Env) -> Result<IntegrityReport, LmdbError> {
    let mut report = IntegrityReport {
        databases_checked: 0,
        total_entries: 0,
        errors: Vec::new(),
    };

    let rtxn = env.read_txn()?;
    for &db_name in ALL_DATABASES {
        match env.open_database::<Bytes, Bytes>(&rtxn, Some(db_name)) {
            Ok(Some(db)) => {
                report.databases_checked += 1;
                match db.len(&rtxn) {
                    Ok(count) => report.total_entries += count,
                    Err(e) => report
                        .errors
                        .push(format!("failed to read database '{db_name}': {e}")),
                }
            }
            Ok(None) => report.errors.push(format!("database '{db_name}' is missing")),
            Err(e) => report
                .errors
                .push(format!("failed to open database '{db_name}': {e}")),
        }
    }
    Ok(report)
}

/// Returns `Ok(())` for a fresh (nonexistent) directory, and an error if the
/// directory exists but holds no `data.mdb`.
pub fn check_data_dir(path: &Path) -> Result<(), String> {
    if !path.exists() {
        return Ok(());
    }
    let data_file = path.join("data.mdb");
    if !data_file.exists() {
        return Err(format!(
            "LMDB directory exists but data.mdb is missing at {}",
            path.display()
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::{LmdbEnvironment, DEFAULT_MAP_SIZE};

    #[test]
    fn fresh_path_is_acceptable() {
        let dir = tempfile::tempdir().unwrap();
        assert!(check_data_dir(&dir.path().join("not-yet")).is_ok());
    }

    #[test]
    fn empty_existing_dir_is_suspicious() {
        let dir = tempfile::tempdir().unwrap();
        assert!(check_data_dir(dir.path()).is_err());
    }

    #[test]
    fn opened_environment_is_healthy() {
        let dir = tempfile::tempdir().unwrap();
        let lmdb = LmdbEnvironment::open(dir.path(), DEFAULT_MAP_SIZE).unwrap();
        let report = check_integrity(lmdb.env()).unwrap();
        assert!(report.is_healthy(), "{:?}", report.errors);
        assert_eq!(report.databases_checked as usize, ALL_DATABASES.len());
        assert!(check_data_dir(dir.path()).is_ok());
    }
}
