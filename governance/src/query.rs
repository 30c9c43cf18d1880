//! Read paths over committed state, plus replay audits.

use std::sync::Arc;

use accord_store::{ProposalStore, ProposalSummary, ProposalWithVotes};
use accord_types::{ProposalId, ProposalStatus};
use serde::Serialize;

use crate::consensus::ConsensusEngine;
use crate::error::GovernanceError;

/// Parse a caller-supplied proposal id.
///
/// An empty id is a validation error. Any other string that is not a
/// well-formed id cannot name a stored proposal and reports not found.
pub fn parse_proposal_id(raw: &str) -> Result<ProposalId, GovernanceError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(GovernanceError::Validation(
            "missing required field: proposal_id".to_string(),
        ));
    }
    raw.parse::<ProposalId>()
        .map_err(|_| GovernanceError::ProposalNotFound(raw.to_string()))
}

/// Parse an optional status filter such as `?status=approved`.
pub fn parse_status_filter(raw: Option<&str>) -> Result<Option<ProposalStatus>, GovernanceError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => s
            .parse()
            .map(Some)
            .map_err(|e: accord_types::TypesError| GovernanceError::Validation(e.to_string())),
    }
}

/// Stored status versus the status replaying the vote history yields.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AuditFinding {
    pub proposal_id: ProposalId,
    pub stored: ProposalStatus,
    pub replayed: ProposalStatus,
    pub vote_count: usize,
}

impl AuditFinding {
    pub fn is_consistent(&self) -> bool {
        self.stored == self.replayed
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AuditReport {
    pub checked: usize,
    pub mismatches: Vec<AuditFinding>,
}

impl AuditReport {
    pub fn is_consistent(&self) -> bool {
        self.mismatches.is_empty()
    }
}

pub struct QueryService<S> {
    store: Arc<S>,
}

impl<S: ProposalStore> QueryService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// A proposal with its votes, oldest vote first.
    pub fn get_proposal(&self, id: &str) -> Result<ProposalWithVotes, GovernanceError> {
        let id = parse_proposal_id(id)?;
        Ok(self.store.get_proposal(&id)?)
    }

    /// Proposals newest first, optionally only those with `status`.
    pub fn list_proposals(
        &self,
        status: Option<ProposalStatus>,
    ) -> Result<Vec<ProposalSummary>, GovernanceError> {
        Ok(self.store.list_proposals(status)?)
    }

    /// Replay one proposal's votes and compare with its stored status.
    pub fn audit(&self, id: &str) -> Result<AuditFinding, GovernanceError> {
        let view = self.get_proposal(id)?;
        Ok(audit_view(&view))
    }

    /// Audit every stored proposal.
    pub fn audit_all(&self) -> Result<AuditReport, GovernanceError> {
        let summaries = self.store.list_proposals(None)?;
        let mut report = AuditReport::default();
        for summary in summaries {
            let view = self.store.get_proposal(&summary.id)?;
            let finding = audit_view(&view);
            report.checked += 1;
            if !finding.is_consistent() {
                tracing::warn!(
                    proposal_id = %finding.proposal_id,
                    stored = %finding.stored,
                    replayed = %finding.replayed,
                    "stored status disagrees with vote history"
                );
                report.mismatches.push(finding);
            }
        }
        tracing::info!(
            checked = report.checked,
            mismatches = report.mismatches.len(),
            "audit complete"
        );
        Ok(report)
    }
}

fn audit_view(view: &ProposalWithVotes) -> AuditFinding {
    AuditFinding {
        proposal_id: view.proposal.id,
        stored: view.proposal.status,
        replayed: ConsensusEngine::replay(&view.votes),
        vote_count: view.votes.len(),
    }
}
