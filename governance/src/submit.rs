//! Proposal submission.

use std::sync::Arc;

use accord_store::{NewProposal, Proposal, ProposalStore, WriteTxn};
use accord_types::Clock;
use serde_json::json;

use crate::error::GovernanceError;
use crate::evidence::{
    write_compensation, EvidenceWriter, PROPOSAL_ABORTED_EVIDENCE, PROPOSAL_CREATED_EVIDENCE,
};
use crate::notify::{publish_best_effort, GovernanceEvent, NotificationSink};

pub struct ProposalService<S, E, N> {
    store: Arc<S>,
    evidence: E,
    notifier: N,
    clock: Arc<dyn Clock>,
}

impl<S, E, N> ProposalService<S, E, N>
where
    S: ProposalStore,
    E: EvidenceWriter,
    N: NotificationSink,
{
    pub fn new(store: Arc<S>, evidence: E, notifier: N, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            evidence,
            notifier,
            clock,
        }
    }

    /// Create a `pending` proposal. Title and body are required.
    ///
    /// The proposal and its `proposal_created` evidence commit together. A
    /// commit that fails after the evidence is durable is answered with a
    /// `proposal_aborted` record.
    pub fn submit(&self, title: &str, body: &str) -> Result<Proposal, GovernanceError> {
        let new_proposal = NewProposal::new(title, body)?;

        let mut txn = self.store.begin_write()?;
        let proposal = txn.create_proposal(new_proposal, self.clock.now())?;

        let payload = json!({
            "proposal_id": proposal.id,
            "title": proposal.title,
            "status": proposal.status,
            "created_at": proposal.created_at,
        });
        if let Err(e) = self.evidence.write(PROPOSAL_CREATED_EVIDENCE, &payload) {
            tracing::warn!(error = %e, "evidence write failed, rolling back proposal");
            txn.rollback();
            return Err(e.into());
        }
        if let Err(e) = txn.commit() {
            tracing::warn!(proposal_id = %proposal.id, error = %e, "proposal commit failed");
            write_compensation(
                &self.evidence,
                PROPOSAL_ABORTED_EVIDENCE,
                &json!({ "proposal_id": proposal.id, "error": e.to_string() }),
            );
            return Err(e.into());
        }

        tracing::info!(proposal_id = %proposal.id, title = %proposal.title, "proposal created");
        publish_best_effort(
            &self.notifier,
            GovernanceEvent::ProposalCreated {
                proposal_id: proposal.id,
                title: proposal.title.clone(),
            },
        );
        Ok(proposal)
    }
}
