//! LMDB database integrity checks.
//!
//! Run on startup to detect corruption early, before any vote is cast.

use std::path::Path;

use accord_store::proposal::Proposal;

use crate::environment::{LmdbEnvironment, DATABASE_NAMES};
use crate::proposal::{id_from_bytes, read_proposal};
use crate::LmdbError;

/// Summary of an integrity check run.
pub struct IntegrityReport {
    pub databases_checked: u32,
    pub total_entries: u64,
    pub errors: Vec<String>,
}

impl IntegrityReport {
    /// Returns `true` if no errors were detected.
    pub fn is_healthy(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Check LMDB database integrity on startup.
///
/// Counts the entries of every named database, then verifies that each
/// order-index entry and each vote refers to a stored proposal. Read and
/// decode failures are recorded in the report rather than causing a hard
/// error.
pub fn check_integrity(env: &LmdbEnvironment) -> Result<IntegrityReport, LmdbError> {
    let mut report = IntegrityReport {
        databases_checked: 0,
        total_entries: 0,
        errors: Vec::new(),
    };

    let rtxn = env.env().read_txn()?;

    for &db_name in DATABASE_NAMES {
        match env
            .env()
            .open_database::<heed::types::Bytes, heed::types::Bytes>(&rtxn, Some(db_name))
        {
            Ok(Some(db)) => {
                report.databases_checked += 1;
                match db.len(&rtxn) {
                    Ok(count) => report.total_entries += count,
                    Err(e) => report
                        .errors
                        .push(format!("failed to read database '{}': {}", db_name, e)),
                }
            }
            Ok(None) => report
                .errors
                .push(format!("database '{}' is missing", db_name)),
            Err(e) => report
                .errors
                .push(format!("failed to open database '{}': {}", db_name, e)),
        }
    }

    for entry in env.proposal_order_db.iter(&rtxn)? {
        let (_key, id_bytes) = entry?;
        let present = id_from_bytes(id_bytes)
            .and_then(|id| read_proposal(env, &rtxn, &id).map(|p| p.is_some()));
        match present {
            Ok(true) => {}
            Ok(false) => report.errors.push(format!(
                "order index references missing proposal {}",
                hex_prefix(id_bytes)
            )),
            Err(e) => report.errors.push(format!("order index entry unreadable: {e}")),
        }
    }

    for entry in env.proposals_db.iter(&rtxn)? {
        let (key, bytes) = entry?;
        if let Err(e) = bincode::deserialize::<Proposal>(bytes) {
            report.errors.push(format!(
                "proposal {} does not decode: {}",
                hex_prefix(key),
                e
            ));
        }
    }

    for entry in env.votes_db.iter(&rtxn)? {
        let (key, _bytes) = entry?;
        let present = id_from_bytes(&key[..key.len().min(32)])
            .and_then(|id| read_proposal(env, &rtxn, &id).map(|p| p.is_some()));
        if !matches!(present, Ok(true)) {
            report.errors.push(format!(
                "vote key {} has no owning proposal",
                hex_prefix(key)
            ));
        }
    }

    if !report.is_healthy() {
        tracing::warn!(errors = report.errors.len(), "integrity check found problems");
    }
    Ok(report)
}

fn hex_prefix(bytes: &[u8]) -> String {
    bytes.iter().take(8).map(|b| format!("{:02x}", b)).collect()
}

/// Check if the LMDB data directory looks valid before opening.
///
/// Returns `Ok(())` for a fresh (nonexistent) directory. Returns an error
/// if the directory exists but `data.mdb` is missing, which suggests
/// corruption or misconfiguration.
pub fn check_data_dir(path: &Path) -> Result<(), String> {
    if !path.exists() {
        return Ok(()); // Fresh start
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
