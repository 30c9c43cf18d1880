//! Governance engine: the three services wired over one shared store.

use std::sync::Arc;

use accord_store::{Proposal, ProposalStore, ProposalSummary, ProposalWithVotes};
use accord_types::{Clock, ProposalStatus};

use crate::error::GovernanceError;
use crate::evidence::EvidenceWriter;
use crate::notify::NotificationSink;
use crate::query::{AuditFinding, AuditReport, QueryService};
use crate::submit::ProposalService;
use crate::vote::{VoteOutcome, VoteRequest, VoteService};

pub struct GovernanceEngine<S, E, N> {
    proposals: ProposalService<S, E, N>,
    votes: VoteService<S, E, N>,
    query: QueryService<S>,
}

impl<S, E, N> GovernanceEngine<S, E, N>
where
    S: ProposalStore,
    E: EvidenceWriter + Clone,
    N: NotificationSink + Clone,
{
    pub fn new(store: Arc<S>, evidence: E, notifier: N, clock: Arc<dyn Clock>) -> Self {
        Self {
            proposals: ProposalService::new(
                Arc::clone(&store),
                evidence.clone(),
                notifier.clone(),
                Arc::clone(&clock),
            ),
            votes: VoteService::new(Arc::clone(&store), evidence, notifier, clock),
            query: QueryService::new(store),
        }
    }

    /// Submit a new proposal (starts `pending`).
    pub fn submit_proposal(&self, title: &str, body: &str) -> Result<Proposal, GovernanceError> {
        self.proposals.submit(title, body)
    }

    /// Cast a vote on a proposal.
    pub fn cast_vote(&self, request: &VoteRequest) -> Result<VoteOutcome, GovernanceError> {
        self.votes.cast_vote(request)
    }

    pub fn get_proposal(&self, id: &str) -> Result<ProposalWithVotes, GovernanceError> {
        self.query.get_proposal(id)
    }

    pub fn list_proposals(
        &self,
        status: Option<ProposalStatus>,
    ) -> Result<Vec<ProposalSummary>, GovernanceError> {
        self.query.list_proposals(status)
    }

    pub fn audit(&self, id: &str) -> Result<AuditFinding, GovernanceError> {
        self.query.audit(id)
    }

    pub fn audit_all(&self) -> Result<AuditReport, GovernanceError> {
        self.query.audit_all()
    }
}
