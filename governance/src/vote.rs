//! The vote service: records one vote and applies the consensus rule.

use std::sync::Arc;

use accord_store::{NewVote, ProposalStore, Vote, WriteTxn};
use accord_types::{Clock, ProposalId, ProposalStatus, VoteId};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::consensus::ConsensusEngine;
use crate::error::GovernanceError;
use crate::evidence::{write_compensation, EvidenceWriter, VOTE_ABORTED_EVIDENCE, VOTE_EVIDENCE};
use crate::notify::{publish_best_effort, GovernanceEvent, NotificationSink};
use crate::query::parse_proposal_id;

/// A raw cast request as received from a caller.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRequest {
    pub proposal_id: String,
    pub actor: String,
    pub decision: String,
    pub reason: String,
    /// Optional free-text identity of the voter, kept for audit only.
    #[serde(default)]
    pub voter: Option<String>,
}

impl VoteRequest {
    pub fn new(proposal_id: &str, actor: &str, decision: &str, reason: &str) -> Self {
        Self {
            proposal_id: proposal_id.to_string(),
            actor: actor.to_string(),
            decision: decision.to_string(),
            reason: reason.to_string(),
            voter: None,
        }
    }

    pub fn with_voter(mut self, voter: &str) -> Self {
        self.voter = Some(voter.to_string());
        self
    }

    /// Check required fields and parse them. Touches no storage.
    pub fn validate(&self) -> Result<(ProposalId, NewVote), GovernanceError> {
        let fields = [
            ("proposal_id", &self.proposal_id),
            ("actor", &self.actor),
            ("decision", &self.decision),
            ("reason", &self.reason),
        ];
        let missing: Vec<&str> = fields
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| *name)
            .collect();
        if !missing.is_empty() {
            return Err(GovernanceError::Validation(format!(
                "missing required fields: {}",
                missing.join(", ")
            )));
        }
        let vote = NewVote::parse(
            &self.actor,
            &self.decision,
            &self.reason,
            self.voter.as_deref(),
        )?;
        let proposal_id = parse_proposal_id(&self.proposal_id)?;
        Ok((proposal_id, vote))
    }
}

/// Result of a successful cast.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct VoteOutcome {
    pub status: ProposalStatus,
    pub vote_id: VoteId,
    pub previous_status: ProposalStatus,
    /// `true` when this vote changed the proposal's status.
    pub transitioned: bool,
}

pub struct VoteService<S, E, N> {
    store: Arc<S>,
    evidence: E,
    notifier: N,
    clock: Arc<dyn Clock>,
}

impl<S, E, N> VoteService<S, E, N>
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

    /// Record a vote and return the proposal's resulting status.
    ///
    /// The vote append, the status write and the evidence record commit
    /// together or not at all. The store's write transaction is held from
    /// the proposal load to the commit, so concurrent casts on the same
    /// proposal are applied one after another and each sees every vote
    /// committed before it. If the commit fails once the `vote` evidence is
    /// durable, a `vote_aborted` record naming the same vote id follows it.
    pub fn cast_vote(&self, request: &VoteRequest) -> Result<VoteOutcome, GovernanceError> {
        let (proposal_id, new_vote) = request.validate()?;

        let mut txn = self.store.begin_write()?;
        let current = txn.load_proposal(&proposal_id)?;
        let previous_status = current.proposal.status;

        let vote = txn.append_vote(&proposal_id, new_vote, self.clock.now())?;
        let status = ConsensusEngine::compute_status(&current.votes, &vote);
        let transitioned = txn.update_status(&proposal_id, status)?;

        let payload = vote_evidence(&vote, previous_status, status);
        if let Err(e) = self.evidence.write(VOTE_EVIDENCE, &payload) {
            tracing::warn!(
                proposal_id = %proposal_id,
                vote_id = %vote.id,
                error = %e,
                "evidence write failed, rolling back vote"
            );
            txn.rollback();
            return Err(e.into());
        }
        if let Err(e) = txn.commit() {
            tracing::warn!(
                proposal_id = %proposal_id,
                vote_id = %vote.id,
                error = %e,
                "vote commit failed after evidence was written"
            );
            write_compensation(
                &self.evidence,
                VOTE_ABORTED_EVIDENCE,
                &json!({
                    "proposal_id": proposal_id,
                    "vote_id": vote.id,
                    "error": e.to_string(),
                }),
            );
            return Err(e.into());
        }

        tracing::info!(
            proposal_id = %proposal_id,
            vote_id = %vote.id,
            actor = %vote.actor,
            decision = %vote.decision,
            from = %previous_status,
            to = %status,
            "vote recorded"
        );

        publish_best_effort(
            &self.notifier,
            GovernanceEvent::VoteRecorded {
                proposal_id,
                vote_id: vote.id,
                actor: vote.actor,
                decision: vote.decision,
                status,
            },
        );
        if transitioned {
            publish_best_effort(
                &self.notifier,
                GovernanceEvent::StatusChanged {
                    proposal_id,
                    from: previous_status,
                    to: status,
                },
            );
        }

        Ok(VoteOutcome {
            status,
            vote_id: vote.id,
            previous_status,
            transitioned,
        })
    }
}

fn vote_evidence(
    vote: &Vote,
    previous_status: ProposalStatus,
    status: ProposalStatus,
) -> serde_json::Value {
    json!({
        "proposal_id": vote.proposal_id,
        "vote_id": vote.id,
        "actor": vote.actor,
        "voter": vote.voter,
        "decision": vote.decision,
        "reason": vote.reason,
        "created_at": vote.created_at,
        "previous_status": previous_status,
        "status": status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "0101010101010101010101010101010101010101010101010101010101010101";

    #[test]
    fn validate_parses_request() {
        let (id, vote) = VoteRequest::new(ID, "synthiant", "veto", "unsafe")
            .with_voter("agent-7")
            .validate()
            .expect("valid");
        assert_eq!(id, ProposalId::new([1; 32]));
        assert_eq!(vote.actor, accord_types::Actor::Synthient);
        assert_eq!(vote.voter.as_deref(), Some("agent-7"));
    }

    #[test]
    fn validate_names_all_missing_fields() {
        let err = VoteRequest::new("", "human", "", " ").validate().unwrap_err();
        assert!(
            matches!(err, GovernanceError::Validation(ref m) if m.ends_with("proposal_id, decision, reason"))
        );
    }

    #[test]
    fn validate_rejects_unknown_decision() {
        let err = VoteRequest::new(ID, "human", "abstain", "r")
            .validate()
            .unwrap_err();
        assert_eq!(err.http_status(), 400);
    }

    #[test]
    fn malformed_id_names_no_proposal() {
        let err = VoteRequest::new("does-not-exist", "human", "approve", "r")
            .validate()
            .unwrap_err();
        assert_eq!(err.http_status(), 404);
    }

    #[test]
    fn request_deserializes_without_voter() {
        let req: VoteRequest = serde_json::from_str(
            r#"{"proposal_id":"x","actor":"human","decision":"approve","reason":"ok"}"#,
        )
        .expect("json");
        assert_eq!(req.voter, None);
    }
}
