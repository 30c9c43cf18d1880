//! Shared wiring for governance integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use accord_governance::{GovernanceEngine, VoteRequest};
use accord_nullables::{NullClock, NullEvidenceWriter, NullNotifier, NullStore};
use accord_store::ProposalStore;
use accord_store_lmdb::LmdbEnvironment;
use accord_types::Clock;

pub type Engine<S> = GovernanceEngine<S, Arc<NullEvidenceWriter>, Arc<NullNotifier>>;

pub struct Harness<S: ProposalStore> {
    pub engine: Engine<S>,
    pub store: Arc<S>,
    pub evidence: Arc<NullEvidenceWriter>,
    pub notifier: Arc<NullNotifier>,
    pub clock: Arc<NullClock>,
    _dir: Option<tempfile::TempDir>,
}

impl<S: ProposalStore> Harness<S> {
    fn wire(store: S, dir: Option<tempfile::TempDir>) -> Self {
        let store = Arc::new(store);
        let evidence = Arc::new(NullEvidenceWriter::new());
        let notifier = Arc::new(NullNotifier::new());
        let clock = Arc::new(NullClock::new(1_700_000_000_000));
        let engine = GovernanceEngine::new(
            Arc::clone(&store),
            Arc::clone(&evidence),
            Arc::clone(&notifier),
            Arc::clone(&clock) as Arc<dyn Clock>,
        );
        Self {
            engine,
            store,
            evidence,
            notifier,
            clock,
            _dir: dir,
        }
    }

    /// Submit a proposal and return its hex id.
    pub fn proposal(&self, title: &str) -> String {
        let p = self
            .engine
            .submit_proposal(title, "body text")
            .expect("submit");
        self.clock.advance(1);
        p.id.to_hex()
    }

    /// Cast a vote, advancing the clock afterwards.
    pub fn cast(
        &self,
        id: &str,
        actor: &str,
        decision: &str,
    ) -> Result<accord_governance::VoteOutcome, accord_governance::GovernanceError> {
        let result = self
            .engine
            .cast_vote(&VoteRequest::new(id, actor, decision, "because"));
        self.clock.advance(1);
        result
    }
}

pub fn null_harness() -> Harness<NullStore> {
    Harness::wire(NullStore::new(), None)
}

pub fn lmdb_harness() -> Harness<LmdbEnvironment> {
    let dir = tempfile::tempdir().expect("temp dir");
    let env = LmdbEnvironment::open(dir.path(), 8, 16 * 1024 * 1024).expect("open env");
    Harness::wire(env, Some(dir))
}

/// Run a scenario generic over the store against both backends.
macro_rules! on_both_stores {
    ($($scenario:ident),* $(,)?) => {
        $(
            mod $scenario {
                #[test]
                fn null_store() {
                    super::$scenario(super::common::null_harness());
                }

                #[test]
                fn lmdb() {
                    super::$scenario(super::common::lmdb_harness());
                }
            }
        )*
    };
}
