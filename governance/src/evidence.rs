//! Audit evidence.
//!
//! Every governance mutation writes one evidence record inside its store
//! transaction. A failed write aborts the transaction, so no committed vote
//! or proposal exists without its evidence. If the commit itself fails after
//! the record is durable, a compensating `*_aborted` record follows it.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use accord_types::Timestamp;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Evidence kind written for every recorded vote.
pub const VOTE_EVIDENCE: &str = "vote";
/// Evidence kind written for every submitted proposal.
pub const PROPOSAL_CREATED_EVIDENCE: &str = "proposal_created";
/// Compensates a `vote` record whose store commit failed.
pub const VOTE_ABORTED_EVIDENCE: &str = "vote_aborted";
/// Compensates a `proposal_created` record whose store commit failed.
pub const PROPOSAL_ABORTED_EVIDENCE: &str = "proposal_aborted";

#[derive(Debug, Error)]
pub enum EvidenceError {
    #[error("evidence I/O error: {0}")]
    Io(String),

    #[error("evidence serialization error: {0}")]
    Serialization(String),

    #[error("evidence write timed out after {0:?}")]
    Timeout(Duration),
}

impl From<std::io::Error> for EvidenceError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

impl From<serde_json::Error> for EvidenceError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// Destination for audit evidence.
///
/// `write` must be durable once it returns `Ok`; the caller commits its
/// transaction only afterwards.
pub trait EvidenceWriter: Send + Sync {
    fn write(&self, kind: &str, payload: &serde_json::Value) -> Result<(), EvidenceError>;
}

impl<T: EvidenceWriter + ?Sized> EvidenceWriter for Arc<T> {
    fn write(&self, kind: &str, payload: &serde_json::Value) -> Result<(), EvidenceError> {
        (**self).write(kind, payload)
    }
}

/// Record that a mutation whose evidence is already durable never committed.
///
/// Failure here is logged only: the caller is already returning the commit
/// error, and the audit sweep still reports the proposal as it stands.
pub(crate) fn write_compensation<E: EvidenceWriter + ?Sized>(
    writer: &E,
    kind: &str,
    payload: &serde_json::Value,
) {
    if let Err(e) = writer.write(kind, payload) {
        tracing::error!(kind, error = %e, "compensating evidence write failed");
    }
}

/// One line of the evidence log.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EvidenceRecord {
    pub kind: String,
    pub recorded_at: Timestamp,
    pub payload: serde_json::Value,
}

/// Append-only JSON Lines evidence log, fsynced after every record.
pub struct JsonlEvidenceWriter {
    file: Mutex<File>,
}

impl JsonlEvidenceWriter {
    /// Open (or create) the log at `path`, creating parent directories.
    pub fn open(path: &Path) -> Result<Self, EvidenceError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        tracing::info!(path = %path.display(), "opened evidence log");
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    /// Read every record back, oldest first.
    pub fn read_all(path: &Path) -> Result<Vec<EvidenceRecord>, EvidenceError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        contents
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(EvidenceError::from))
            .collect()
    }
}

impl EvidenceWriter for JsonlEvidenceWriter {
    fn write(&self, kind: &str, payload: &serde_json::Value) -> Result<(), EvidenceError> {
        let record = EvidenceRecord {
            kind: kind.to_string(),
            recorded_at: Timestamp::now(),
            payload: payload.clone(),
        };
        let mut line = serde_json::to_vec(&record)?;
        line.push(b'\n');

        let mut file = self
            .file
            .lock()
            .map_err(|_| EvidenceError::Io("evidence log lock poisoned".to_string()))?;
        file.write_all(&line)?;
        file.sync_data()?;
        tracing::debug!(kind, bytes = line.len(), "evidence written");
        Ok(())
    }
}
