//! Vote records.

use accord_types::{Actor, Decision, ProposalId, Timestamp, VoteId};
use serde::{Deserialize, Serialize};

use crate::StoreError;

/// A stored vote. Append-only.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub id: VoteId,
    pub proposal_id: ProposalId,
    /// Store-assigned insertion sequence; breaks `created_at` ties.
    pub seq: u64,
    pub actor: Actor,
    /// Free-text voter identity. Audit label only, never counted.
    #[serde(default)]
    pub voter: Option<String>,
    pub decision: Decision,
    pub reason: String,
    pub created_at: Timestamp,
}

/// Validated input for a new vote.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewVote {
    pub actor: Actor,
    pub decision: Decision,
    pub reason: String,
    pub voter: Option<String>,
}

impl NewVote {
    /// Build from already-typed fields. The reason must be non-empty.
    pub fn new(
        actor: Actor,
        decision: Decision,
        reason: &str,
        voter: Option<&str>,
    ) -> Result<Self, StoreError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(StoreError::Validation(
                "missing required field: reason".to_string(),
            ));
        }
        Ok(Self {
            actor,
            decision,
            reason: reason.to_string(),
            voter: normalize_voter(voter),
        })
    }

    /// Validate raw request fields.
    ///
    /// All of `actor`, `decision` and `reason` are required; `decision` must
    /// be `approve` or `veto` and `actor` must be `synthient` or `human`.
    pub fn parse(
        actor: &str,
        decision: &str,
        reason: &str,
        voter: Option<&str>,
    ) -> Result<Self, StoreError> {
        let mut missing = Vec::new();
        for (name, value) in [("actor", actor), ("decision", decision), ("reason", reason)] {
            if value.trim().is_empty() {
                missing.push(name);
            }
        }
        if !missing.is_empty() {
            return Err(StoreError::Validation(format!(
                "missing required fields: {}",
                missing.join(", ")
            )));
        }
        let actor: Actor = actor
            .parse()
            .map_err(|e: accord_types::TypesError| StoreError::Validation(e.to_string()))?;
        let decision: Decision = decision
            .parse()
            .map_err(|e: accord_types::TypesError| StoreError::Validation(e.to_string()))?;
        Self::new(actor, decision, reason, voter)
    }

    /// Build the stored record once the store has assigned a sequence number.
    pub fn into_vote(self, proposal_id: ProposalId, seq: u64, created_at: Timestamp) -> Vote {
        let id = VoteId::derive(
            &proposal_id,
            seq,
            created_at.as_millis(),
            self.actor.as_str(),
            self.decision.as_str(),
            &self.reason,
        );
        Vote {
            id,
            proposal_id,
            seq,
            actor: self.actor,
            voter: self.voter,
            decision: self.decision,
            reason: self.reason,
            created_at,
        }
    }
}

fn normalize_voter(voter: Option<&str>) -> Option<String> {
    voter
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Order votes by `created_at` ascending, insertion order on ties.
pub fn sort_votes(votes: &mut [Vote]) {
    votes.sort_by_key(|v| (v.created_at, v.seq));
}
