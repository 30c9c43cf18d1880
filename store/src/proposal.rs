//! Proposal records and the proposal storage trait.

use accord_types::{ProposalId, ProposalStatus, Timestamp};
use serde::{Deserialize, Serialize};

use crate::transaction::WriteTxn;
use crate::vote::Vote;
use crate::StoreError;

/// A stored governance proposal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: ProposalId,
    /// Store-assigned insertion sequence; breaks `created_at` ties.
    pub seq: u64,
    pub title: String,
    pub body: String,
    pub status: ProposalStatus,
    pub created_at: Timestamp,
}

/// A proposal together with its votes, ordered by creation time ascending.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalWithVotes {
    pub proposal: Proposal,
    pub votes: Vec<Vote>,
}

/// Listing entry for a proposal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalSummary {
    pub id: ProposalId,
    pub title: String,
    pub status: ProposalStatus,
    pub created_at: Timestamp,
    pub vote_count: u64,
}

impl ProposalSummary {
    pub fn new(proposal: &Proposal, vote_count: u64) -> Self {
        Self {
            id: proposal.id,
            title: proposal.title.clone(),
            status: proposal.status,
            created_at: proposal.created_at,
            vote_count,
        }
    }
}

/// Validated input for a new proposal. Title and body are stored trimmed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewProposal {
    title: String,
    body: String,
}

impl NewProposal {
    /// Validate raw submission fields; both must be non-empty after trimming.
    pub fn new(title: &str, body: &str) -> Result<Self, StoreError> {
        let title = title.trim();
        let body = body.trim();
        let mut missing = Vec::new();
        if title.is_empty() {
            missing.push("title");
        }
        if body.is_empty() {
            missing.push("body");
        }
        if !missing.is_empty() {
            return Err(StoreError::Validation(format!(
                "missing required fields: {}",
                missing.join(", ")
            )));
        }
        Ok(Self {
            title: title.to_string(),
            body: body.to_string(),
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// Build the stored record once the store has assigned a sequence number.
    pub fn into_proposal(self, seq: u64, created_at: Timestamp) -> Proposal {
        let id = ProposalId::derive(seq, created_at.as_millis(), &self.title, &self.body);
        Proposal {
            id,
            seq,
            title: self.title,
            body: self.body,
            status: ProposalStatus::Pending,
            created_at,
        }
    }
}

/// Trait for proposal and vote persistence.
///
/// Reads on the store itself see committed state only. All mutations go
/// through [`ProposalStore::begin_write`]; at most one write transaction is
/// open at a time, so a transaction that loads a proposal owns its vote set
/// until it commits or is dropped.
pub trait ProposalStore: Send + Sync {
    type WriteTxn<'a>: WriteTxn
    where
        Self: 'a;

    /// Begin a scoped write transaction, blocking while another is open.
    fn begin_write(&self) -> Result<Self::WriteTxn<'_>, StoreError>;

    /// Get a proposal with its votes ordered by `created_at` ascending.
    fn get_proposal(&self, id: &ProposalId) -> Result<ProposalWithVotes, StoreError>;

    /// List proposals newest first, optionally filtered by status.
    fn list_proposals(
        &self,
        status: Option<ProposalStatus>,
    ) -> Result<Vec<ProposalSummary>, StoreError>;

    /// Total number of proposals.
    fn proposal_count(&self) -> Result<u64, StoreError>;
}

/// Order summaries newest first; later insertion wins a `created_at` tie.
pub fn sort_newest_first(proposals: &mut [Proposal]) {
    proposals.sort_by(|a, b| (b.created_at, b.seq).cmp(&(a.created_at, a.seq)));
}
