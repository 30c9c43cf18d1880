//! Dual-consensus governance for Accord.
//!
//! A proposal is approved once at least one human and at least one
//! synthient approve it, and rejected the moment anyone vetoes it. A veto is
//! absorbing: no later vote moves a rejected proposal.
//!
//! Every mutation runs as one scoped store transaction that also writes the
//! audit evidence record; if the evidence write fails nothing is committed.
//! UI notifications are published only after commit and never affect the
//! outcome.

pub mod consensus;
pub mod engine;
pub mod error;
pub mod evidence;
pub mod notify;
pub mod query;
pub mod submit;
pub mod vote;

pub use consensus::{ConsensusEngine, Tally};
pub use engine::GovernanceEngine;
pub use error::{ErrorKind, GovernanceError};
pub use evidence::{EvidenceError, EvidenceRecord, EvidenceWriter, JsonlEvidenceWriter};
pub use notify::{BroadcastNotifier, GovernanceEvent, NotificationSink, NotifyError};
pub use query::{parse_proposal_id, parse_status_filter, AuditFinding, AuditReport, QueryService};
pub use submit::ProposalService;
pub use vote::{VoteOutcome, VoteRequest, VoteService};
