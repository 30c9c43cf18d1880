//! The dual-consensus rule.
//!
//! Pure functions over a proposal's ordered votes. The status after any
//! vote depends only on the votes so far:
//!
//! 1. any veto, from either actor class, rejects the proposal;
//! 2. otherwise at least one human approve and at least one synthient
//!    approve approve it;
//! 3. otherwise it stays pending.
//!
//! Rule 1 makes `rejected` absorbing, and since votes are never removed an
//! approved proposal can only ever move to rejected.

use accord_store::Vote;
use accord_types::{Actor, Decision, ProposalStatus};
use serde::Serialize;

/// Per-class vote counts for one proposal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub human_approve: u32,
    pub human_veto: u32,
    pub synthient_approve: u32,
    pub synthient_veto: u32,
}

impl Tally {
    pub fn from_ballots<I>(ballots: I) -> Self
    where
        I: IntoIterator<Item = (Actor, Decision)>,
    {
        let mut tally = Self::default();
        for (actor, decision) in ballots {
            tally.record(actor, decision);
        }
        tally
    }

    pub fn from_votes<'a, I>(votes: I) -> Self
    where
        I: IntoIterator<Item = &'a Vote>,
    {
        Self::from_ballots(votes.into_iter().map(|v| (v.actor, v.decision)))
    }

    pub fn record(&mut self, actor: Actor, decision: Decision) {
        let slot = match (actor, decision) {
            (Actor::Human, Decision::Approve) => &mut self.human_approve,
            (Actor::Human, Decision::Veto) => &mut self.human_veto,
            (Actor::Synthient, Decision::Approve) => &mut self.synthient_approve,
            (Actor::Synthient, Decision::Veto) => &mut self.synthient_veto,
        };
        *slot = slot.saturating_add(1);
    }

    pub fn has_veto(&self) -> bool {
        self.human_veto > 0 || self.synthient_veto > 0
    }

    pub fn status(&self) -> ProposalStatus {
        if self.has_veto() {
            ProposalStatus::Rejected
        } else if self.human_approve > 0 && self.synthient_approve > 0 {
            ProposalStatus::Approved
        } else {
            ProposalStatus::Pending
        }
    }
}

/// Stateless evaluator of the dual-consensus rule.
pub struct ConsensusEngine;

impl ConsensusEngine {
    /// Status after `incoming` is appended to `existing`.
    pub fn compute_status(existing: &[Vote], incoming: &Vote) -> ProposalStatus {
        Tally::from_votes(existing.iter().chain(std::iter::once(incoming))).status()
    }

    /// Status implied by a complete vote list.
    pub fn evaluate(votes: &[Vote]) -> ProposalStatus {
        Tally::from_votes(votes).status()
    }

    /// Run the state machine over `votes` in order, starting from pending.
    ///
    /// Each step sees only the previous status and which classes have
    /// approved so far, never the full vote list. Audits compare the result
    /// with `evaluate` and with the stored status.
    pub fn replay(votes: &[Vote]) -> ProposalStatus {
        votes
            .iter()
            .fold(ReplayState::default(), ReplayState::step)
            .status
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct ReplayState {
    status: ProposalStatus,
    human_approved: bool,
    synthient_approved: bool,
}

impl ReplayState {
    fn step(self, vote: &Vote) -> Self {
        if self.status == ProposalStatus::Rejected || vote.decision == Decision::Veto {
            return Self {
                status: ProposalStatus::Rejected,
                ..self
            };
        }
        let mut next = self;
        match vote.actor {
            Actor::Human => next.human_approved = true,
            Actor::Synthient => next.synthient_approved = true,
        }
        if next.human_approved && next.synthient_approved {
            next.status = ProposalStatus::Approved;
        }
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use accord_store::NewVote;
    use accord_types::{ProposalId, Timestamp};

    fn vote(seq: u64, actor: Actor, decision: Decision) -> Vote {
        NewVote::new(actor, decision, "reason", None)
            .unwrap()
            .into_vote(ProposalId::ZERO, seq, Timestamp::from_millis(seq))
    }

    #[test]
    fn single_human_approve_stays_pending() {
        let v = vote(1, Actor::Human, Decision::Approve);
        assert_eq!(
            ConsensusEngine::compute_status(&[], &v),
            ProposalStatus::Pending
        );
    }

    #[test]
    fn human_and_synthient_approve() {
        let first = vote(1, Actor::Human, Decision::Approve);
        let second = vote(2, Actor::Synthient, Decision::Approve);
        assert_eq!(
            ConsensusEngine::compute_status(&[first], &second),
            ProposalStatus::Approved
        );
    }

    #[test]
    fn same_class_approvals_do_not_approve() {
        let votes = [
            vote(1, Actor::Human, Decision::Approve),
            vote(2, Actor::Human, Decision::Approve),
        ];
        assert_eq!(ConsensusEngine::evaluate(&votes), ProposalStatus::Pending);
    }

    #[test]
    fn veto_overrides_prior_approval() {
        let votes = [
            vote(1, Actor::Human, Decision::Approve),
            vote(2, Actor::Synthient, Decision::Approve),
        ];
        let veto = vote(3, Actor::Human, Decision::Veto);
        assert_eq!(
            ConsensusEngine::compute_status(&votes, &veto),
            ProposalStatus::Rejected
        );
    }

    #[test]
    fn rejected_is_absorbing() {
        let votes = [
            vote(1, Actor::Synthient, Decision::Veto),
            vote(2, Actor::Human, Decision::Approve),
        ];
        let late = vote(3, Actor::Synthient, Decision::Approve);
        assert_eq!(
            ConsensusEngine::compute_status(&votes, &late),
            ProposalStatus::Rejected
        );
    }

    #[test]
    fn replay_matches_evaluate() {
        let votes = [
            vote(1, Actor::Synthient, Decision::Approve),
            vote(2, Actor::Human, Decision::Approve),
        ];
        assert_eq!(ConsensusEngine::replay(&votes), ProposalStatus::Approved);
        assert_eq!(ConsensusEngine::replay(&[]), ProposalStatus::Pending);
    }

    #[test]
    fn replay_steps_through_each_transition() {
        let approved = [
            vote(1, Actor::Human, Decision::Approve),
            vote(2, Actor::Human, Decision::Approve),
            vote(3, Actor::Synthient, Decision::Approve),
        ];
        assert_eq!(ConsensusEngine::replay(&approved[..2]), ProposalStatus::Pending);
        assert_eq!(ConsensusEngine::replay(&approved), ProposalStatus::Approved);

        let mut vetoed = approved.to_vec();
        vetoed.push(vote(4, Actor::Synthient, Decision::Veto));
        vetoed.push(vote(5, Actor::Human, Decision::Approve));
        assert_eq!(ConsensusEngine::replay(&vetoed), ProposalStatus::Rejected);
        assert_eq!(ConsensusEngine::evaluate(&vetoed), ProposalStatus::Rejected);
    }

    #[test]
    fn tally_counts_each_slot() {
        let tally = Tally::from_ballots([
            (Actor::Human, Decision::Approve),
            (Actor::Human, Decision::Approve),
            (Actor::Synthient, Decision::Veto),
        ]);
        assert_eq!(tally.human_approve, 2);
        assert_eq!(tally.synthient_veto, 1);
        assert!(tally.has_veto());
    }
}
