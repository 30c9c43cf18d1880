//! Write batching: groups every operation of one governance action into a
//! single LMDB write transaction.
//!
//! # Usage
//!
//! ```ignore
//! let mut batch = env.write_batch()?;
//! let current = batch.load_proposal(&id)?;
//! let vote = batch.append_vote(&id, new_vote, now)?;
//! batch.update_status(&id, ProposalStatus::Approved)?;
//! batch.commit()?;
//! ```
//!
//! If the batch is dropped without calling [`WriteBatch::commit`], all
//! operations are rolled back (the underlying LMDB transaction is aborted)
//! and the writer lock is released.

use heed::RwTxn;

use accord_store::proposal::{NewProposal, Proposal, ProposalWithVotes};
use accord_store::vote::{NewVote, Vote};
use accord_store::{StoreError, WriteTxn};
use accord_types::{ProposalId, ProposalStatus, Timestamp};

use crate::environment::LmdbEnvironment;
use crate::meta::{PROPOSAL_SEQ_KEY, VOTE_SEQ_KEY};
use crate::proposal::{order_key, read_proposal, read_proposal_with_votes, vote_key};
use crate::LmdbError;


/// A write batch over a single LMDB write transaction.
pub struct WriteBatch<'a> {
    txn: RwTxn<'a>,
    env: &'a LmdbEnvironment,
}

impl<'a> WriteBatch<'a> {
    /// Begin a new write batch.
    pub(crate) fn new(env: &'a LmdbEnvironment) -> Result<Self, StoreError> {
        let txn = env.env().write_txn().map_err(LmdbError::from)?;
        Ok(Self { txn, env })
    }

    /// Bump a big-endian u64 counter in `meta_db` and return the new value.
    fn next_seq(&mut self, key: &str) -> Result<u64, StoreError> {
        let current = self
            .env
            .meta_db
            .get(&self.txn, key.as_bytes())
            .map_err(LmdbError::from)?
            .and_then(|b| b.try_into().ok().map(u64::from_be_bytes))
            .unwrap_or(0);
        let next = current.checked_add(1).ok_or_else(|| {
            StoreError::Corruption(format!("sequence {} exhausted", key))
        })?;
        self.env
            .meta_db
            .put(&mut self.txn, key.as_bytes(), &next.to_be_bytes())
            .map_err(LmdbError::from)?;
        Ok(next)
    }

    fn put_proposal(&mut self, proposal: &Proposal) -> Result<(), StoreError> {
        let bytes = bincode::serialize(proposal).map_err(LmdbError::from)?;
        self.env
            .proposals_db
            .put(&mut self.txn, proposal.id.as_bytes().as_slice(), &bytes)
            .map_err(LmdbError::from)?;
        Ok(())
    }
}

impl WriteTxn for WriteBatch<'_> {
    fn create_proposal(
        &mut self,
        proposal: NewProposal,
        now: Timestamp,
    ) -> Result<Proposal, StoreError> {
        let seq = self.next_seq(PROPOSAL_SEQ_KEY)?;
        let record = proposal.into_proposal(seq, now);
        if read_proposal(self.env, &self.txn, &record.id)?.is_some() {
            return Err(StoreError::Corruption(format!(
                "proposal id {} already present",
                record.id
            )));
        }
        self.put_proposal(&record)?;
        self.env
            .proposal_order_db
            .put(
                &mut self.txn,
                &order_key(record.created_at, record.seq),
                record.id.as_bytes().as_slice(),
            )
            .map_err(LmdbError::from)?;
        Ok(record)
    }

    fn load_proposal(&self, id: &ProposalId) -> Result<ProposalWithVotes, StoreError> {
        read_proposal_with_votes(self.env, &self.txn, id)
    }

    fn append_vote(
        &mut self,
        proposal_id: &ProposalId,
        vote: NewVote,
        now: Timestamp,
    ) -> Result<Vote, StoreError> {
        if read_proposal(self.env, &self.txn, proposal_id)?.is_none() {
            return Err(StoreError::NotFound(format!("proposal {proposal_id}")));
        }
        let seq = self.next_seq(VOTE_SEQ_KEY)?;
        let record = vote.into_vote(*proposal_id, seq, now);
        let bytes = bincode::serialize(&record).map_err(LmdbError::from)?;
        self.env
            .votes_db
            .put(
                &mut self.txn,
                &vote_key(proposal_id, record.created_at, record.seq),
                &bytes,
            )
            .map_err(LmdbError::from)?;
        Ok(record)
    }

    fn update_status(
        &mut self,
        proposal_id: &ProposalId,
        status: ProposalStatus,
    ) -> Result<bool, StoreError> {
        let mut record = read_proposal(self.env, &self.txn, proposal_id)?
            .ok_or_else(|| StoreError::NotFound(format!("proposal {proposal_id}")))?;
        if record.status == status {
            return Ok(false);
        }
        record.status = status;
        self.put_proposal(&record)?;
        Ok(true)
    }

    /// Commit all batched operations in a single write transaction.
    fn commit(self) -> Result<(), StoreError> {
        self.txn.commit().map_err(LmdbError::from)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use accord_store::ProposalStore;
    use accord_types::{Actor, Decision};

    /// Helper: open a temporary LMDB environment.
    fn temp_env() -> (tempfile::TempDir, LmdbEnvironment) {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let env = LmdbEnvironment::open(dir.path(), 8, 10 * 1024 * 1024)
            .expect("failed to open env");
        (dir, env)
    }

    fn new_proposal() -> NewProposal {
        NewProposal::new("T", "B").expect("valid proposal")
    }

    fn approve(actor: Actor) -> NewVote {
        NewVote::new(actor, Decision::Approve, "r", None).expect("valid vote")
    }

    #[test]
    fn committed_proposal_is_readable() {
        let (_dir, env) = temp_env();

        let mut batch = env.write_batch().expect("write_batch");
        let created = batch
            .create_proposal(new_proposal(), Timestamp::from_millis(1_000))
            .expect("create");
        batch.commit().expect("commit");

        let loaded = env.get_proposal(&created.id).expect("get");
        assert_eq!(loaded.proposal, created);
        assert_eq!(loaded.proposal.status, ProposalStatus::Pending);
        assert!(loaded.votes.is_empty());
    }

    #[test]
    fn dropped_batch_does_not_persist() {
        let (_dir, env) = temp_env();

        let id = {
            let mut batch = env.write_batch().expect("write_batch");
            let created = batch
                .create_proposal(new_proposal(), Timestamp::from_millis(1))
                .expect("create");
            created.id
            // batch is dropped here, implicit rollback
        };

        let result = env.get_proposal(&id);
        assert!(matches!(result, Err(StoreError::NotFound(_))));
        assert_eq!(env.proposal_count().expect("count"), 0);
    }

    #[test]
    fn batch_sees_its_own_writes() {
        let (_dir, env) = temp_env();

        let mut batch = env.write_batch().expect("write_batch");
        let created = batch
            .create_proposal(new_proposal(), Timestamp::from_millis(1))
            .expect("create");
        batch
            .append_vote(&created.id, approve(Actor::Human), Timestamp::from_millis(2))
            .expect("append");
        let view = batch.load_proposal(&created.id).expect("load");
        assert_eq!(view.votes.len(), 1);
        assert_eq!(view.votes[0].actor, Actor::Human);
    }

    #[test]
    fn append_vote_to_missing_proposal_is_not_found() {
        let (_dir, env) = temp_env();

        let mut batch = env.write_batch().expect("write_batch");
        let err = batch
            .append_vote(&ProposalId::new([9; 32]), approve(Actor::Human), Timestamp::EPOCH)
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn votes_come_back_in_creation_order() {
        let (_dir, env) = temp_env();

        let mut batch = env.write_batch().expect("write_batch");
        let p = batch
            .create_proposal(new_proposal(), Timestamp::from_millis(1))
            .expect("create");
        batch
            .append_vote(&p.id, approve(Actor::Human), Timestamp::from_millis(30))
            .expect("append");
        batch
            .append_vote(&p.id, approve(Actor::Synthient), Timestamp::from_millis(10))
            .expect("append");
        batch
            .append_vote(&p.id, approve(Actor::Human), Timestamp::from_millis(10))
            .expect("append");
        batch.commit().expect("commit");

        let votes = env.get_proposal(&p.id).expect("get").votes;
        let order: Vec<(u64, u64)> = votes
            .iter()
            .map(|v| (v.created_at.as_millis(), v.seq))
            .collect();
        assert_eq!(order, vec![(10, 2), (10, 3), (30, 1)]);
    }

    #[test]
    fn update_status_is_idempotent() {
        let (_dir, env) = temp_env();

        let mut batch = env.write_batch().expect("write_batch");
        let p = batch
            .create_proposal(new_proposal(), Timestamp::from_millis(1))
            .expect("create");
        assert!(!batch
            .update_status(&p.id, ProposalStatus::Pending)
            .expect("noop"));
        assert!(batch
            .update_status(&p.id, ProposalStatus::Rejected)
            .expect("update"));
        assert!(!batch
            .update_status(&p.id, ProposalStatus::Rejected)
            .expect("noop"));
        batch.commit().expect("commit");

        let stored = env.get_proposal(&p.id).expect("get").proposal;
        assert_eq!(stored.status, ProposalStatus::Rejected);
        assert_eq!(stored.created_at, p.created_at);
    }

    #[test]
    fn list_is_newest_first_with_filter() {
        let (_dir, env) = temp_env();

        let mut batch = env.write_batch().expect("write_batch");
        let old = batch
            .create_proposal(new_proposal(), Timestamp::from_millis(100))
            .expect("create");
        let new = batch
            .create_proposal(new_proposal(), Timestamp::from_millis(200))
            .expect("create");
        batch
            .update_status(&old.id, ProposalStatus::Rejected)
            .expect("update");
        batch
            .append_vote(&new.id, approve(Actor::Human), Timestamp::from_millis(300))
            .expect("append");
        batch.commit().expect("commit");

        let all = env.list_proposals(None).expect("list");
        let ids: Vec<ProposalId> = all.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![new.id, old.id]);
        assert_eq!(all[0].vote_count, 1);

        let rejected = env
            .list_proposals(Some(ProposalStatus::Rejected))
            .expect("list");
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].id, old.id);
    }

    #[test]
    fn identical_content_gets_distinct_ids() {
        let (_dir, env) = temp_env();

        let mut batch = env.write_batch().expect("write_batch");
        let a = batch
            .create_proposal(new_proposal(), Timestamp::from_millis(5))
            .expect("create");
        let b = batch
            .create_proposal(new_proposal(), Timestamp::from_millis(5))
            .expect("create");
        batch.commit().expect("commit");
        assert_ne!(a.id, b.id);
        assert_eq!(env.proposal_count().expect("count"), 2);
    }
}
