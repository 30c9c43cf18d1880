//! Nullable evidence writer: records in memory, fails on demand.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use accord_governance::{EvidenceError, EvidenceWriter};

/// Injected failures look like an evidence collaborator that stopped answering.
const INJECTED_TIMEOUT: Duration = Duration::from_secs(5);

pub struct NullEvidenceWriter {
    records: Mutex<Vec<(String, serde_json::Value)>>,
    fail_always: AtomicBool,
    fail_remaining: AtomicUsize,
}

impl NullEvidenceWriter {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            fail_always: AtomicBool::new(false),
            fail_remaining: AtomicUsize::new(0),
        }
    }

    /// Fail the next `count` writes, then succeed again.
    pub fn fail_next(&self, count: usize) {
        self.fail_remaining.store(count, Ordering::SeqCst);
    }

    /// Fail every write until switched back off.
    pub fn set_failing(&self, failing: bool) {
        self.fail_always.store(failing, Ordering::SeqCst);
    }

    /// Every record written so far as `(kind, payload)`.
    pub fn records(&self) -> Vec<(String, serde_json::Value)> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn kinds(&self) -> Vec<String> {
        self.records().into_iter().map(|(kind, _)| kind).collect()
    }

    fn should_fail(&self) -> bool {
        if self.fail_always.load(Ordering::SeqCst) {
            return true;
        }
        self.fail_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl Default for NullEvidenceWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl EvidenceWriter for NullEvidenceWriter {
    fn write(&self, kind: &str, payload: &serde_json::Value) -> Result<(), EvidenceError> {
        if self.should_fail() {
            return Err(EvidenceError::Timeout(INJECTED_TIMEOUT));
        }
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((kind.to_string(), payload.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fail_next_counts_down() {
        let writer = NullEvidenceWriter::new();
        writer.fail_next(1);
        assert!(matches!(
            writer.write("vote", &json!({})),
            Err(EvidenceError::Timeout(_))
        ));
        assert!(writer.write("vote", &json!({"n": 2})).is_ok());
        assert_eq!(writer.records().len(), 1);
        assert_eq!(writer.kinds(), vec!["vote".to_string()]);
    }

    #[test]
    fn set_failing_blocks_every_write() {
        let writer = NullEvidenceWriter::new();
        writer.set_failing(true);
        assert!(writer.write("vote", &json!({})).is_err());
        assert!(writer.write("vote", &json!({})).is_err());
        writer.set_failing(false);
        assert!(writer.write("vote", &json!({})).is_ok());
    }
}
