//! The scoped write transaction.

use accord_types::{ProposalId, ProposalStatus, Timestamp};

use crate::proposal::{NewProposal, Proposal, ProposalWithVotes};
use crate::vote::{NewVote, Vote};
use crate::StoreError;

/// A writable unit of work against a [`crate::ProposalStore`].
///
/// Nothing written through the handle is visible to other readers until
/// [`WriteTxn::commit`] succeeds. Dropping the handle without committing
/// rolls every operation back and releases the writer lock, whichever way
/// the scope is left.
pub trait WriteTxn {
    /// Insert a new `pending` proposal and assign its id.
    fn create_proposal(
        &mut self,
        proposal: NewProposal,
        now: Timestamp,
    ) -> Result<Proposal, StoreError>;

    /// Read a proposal and its ordered votes, including this transaction's
    /// own uncommitted writes.
    fn load_proposal(&self, id: &ProposalId) -> Result<ProposalWithVotes, StoreError>;

    /// Append a vote to an existing proposal.
    fn append_vote(
        &mut self,
        proposal_id: &ProposalId,
        vote: NewVote,
        now: Timestamp,
    ) -> Result<Vote, StoreError>;

    /// Set a proposal's status. Returns `false` without writing when the
    /// status is already `status`.
    fn update_status(
        &mut self,
        proposal_id: &ProposalId,
        status: ProposalStatus,
    ) -> Result<bool, StoreError>;

    /// Publish every operation of this transaction atomically.
    fn commit(self) -> Result<(), StoreError>
    where
        Self: Sized;

    /// Discard every operation of this transaction.
    fn rollback(self)
    where
        Self: Sized,
    {
        drop(self);
    }
}
