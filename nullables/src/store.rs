//! Nullable store: thread-safe, transactional in-memory storage for testing.
//!
//! Mirrors the LMDB backend's transaction model: one writer at a time,
//! readers see committed state only, and a write transaction works on a
//! private copy that replaces the committed state on commit.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock};

use accord_store::{
    sort_newest_first, sort_votes, NewProposal, NewVote, Proposal, ProposalStore,
    ProposalSummary, ProposalWithVotes, StoreError, Vote, WriteTxn,
};
use accord_types::{ProposalId, ProposalStatus, Timestamp};

#[derive(Clone, Default)]
struct State {
    proposals: HashMap<ProposalId, Proposal>,
    votes: HashMap<ProposalId, Vec<Vote>>,
    proposal_seq: u64,
    vote_seq: u64,
}

impl State {
    fn view(&self, id: &ProposalId) -> Result<ProposalWithVotes, StoreError> {
        let proposal = self
            .proposals
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("proposal {id}")))?;
        let votes = self.votes.get(id).cloned().unwrap_or_default();
        Ok(ProposalWithVotes { proposal, votes })
    }
}

/// An in-memory proposal store for testing.
#[derive(Default)]
pub struct NullStore {
    committed: RwLock<State>,
    writer: Mutex<()>,
    fail_commit: AtomicBool,
}

impl NullStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next commit fail. The transaction's writes are discarded.
    pub fn fail_next_commit(&self) {
        self.fail_commit.store(true, Ordering::SeqCst);
    }

    /// Total number of committed votes across all proposals.
    pub fn vote_count(&self) -> usize {
        self.read().votes.values().map(Vec::len).sum()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, State> {
        self.committed.read().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Write transaction over a [`NullStore`]. Holds the writer lock until
/// committed or dropped.
pub struct NullWriteTxn<'a> {
    store: &'a NullStore,
    working: State,
    _writer: MutexGuard<'a, ()>,
}

impl ProposalStore for NullStore {
    type WriteTxn<'a>
        = NullWriteTxn<'a>
    where
        Self: 'a;

    fn begin_write(&self) -> Result<Self::WriteTxn<'_>, StoreError> {
        let writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let working = self.read().clone();
        Ok(NullWriteTxn {
            store: self,
            working,
            _writer: writer,
        })
    }

    fn get_proposal(&self, id: &ProposalId) -> Result<ProposalWithVotes, StoreError> {
        self.read().view(id)
    }

    fn list_proposals(
        &self,
        status: Option<ProposalStatus>,
    ) -> Result<Vec<ProposalSummary>, StoreError> {
        let state = self.read();
        let mut proposals: Vec<Proposal> = state
            .proposals
            .values()
            .filter(|p| !status.is_some_and(|s| s != p.status))
            .cloned()
            .collect();
        sort_newest_first(&mut proposals);
        Ok(proposals
            .iter()
            .map(|p| {
                let count = state.votes.get(&p.id).map_or(0, Vec::len);
                ProposalSummary::new(p, count as u64)
            })
            .collect())
    }

    fn proposal_count(&self) -> Result<u64, StoreError> {
        Ok(self.read().proposals.len() as u64)
    }
}

impl WriteTxn for NullWriteTxn<'_> {
    fn create_proposal(
        &mut self,
        proposal: NewProposal,
        now: Timestamp,
    ) -> Result<Proposal, StoreError> {
        self.working.proposal_seq += 1;
        let record = proposal.into_proposal(self.working.proposal_seq, now);
        if self.working.proposals.contains_key(&record.id) {
            return Err(StoreError::Corruption(format!(
                "proposal id {} already present",
                record.id
            )));
        }
        self.working.proposals.insert(record.id, record.clone());
        Ok(record)
    }

    fn load_proposal(&self, id: &ProposalId) -> Result<ProposalWithVotes, StoreError> {
        self.working.view(id)
    }

    fn append_vote(
        &mut self,
        proposal_id: &ProposalId,
        vote: NewVote,
        now: Timestamp,
    ) -> Result<Vote, StoreError> {
        if !self.working.proposals.contains_key(proposal_id) {
            return Err(StoreError::NotFound(format!("proposal {proposal_id}")));
        }
        self.working.vote_seq += 1;
        let record = vote.into_vote(*proposal_id, self.working.vote_seq, now);
        let votes = self.working.votes.entry(*proposal_id).or_default();
        votes.push(record.clone());
        sort_votes(votes);
        Ok(record)
    }

    fn update_status(
        &mut self,
        proposal_id: &ProposalId,
        status: ProposalStatus,
    ) -> Result<bool, StoreError> {
        let record = self
            .working
            .proposals
            .get_mut(proposal_id)
            .ok_or_else(|| StoreError::NotFound(format!("proposal {proposal_id}")))?;
        if record.status == status {
            return Ok(false);
        }
        record.status = status;
        Ok(true)
    }

    fn commit(self) -> Result<(), StoreError> {
        if self.store.fail_commit.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Backend("injected commit failure".to_string()));
        }
        let mut committed = self
            .store
            .committed
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *committed = self.working;
        Ok(())
    }
}
