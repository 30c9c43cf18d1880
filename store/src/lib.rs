//! Abstract storage traits for Accord governance.
//!
//! Every storage backend (LMDB, in-memory for testing) implements these
//! traits. The governance services depend only on the traits, so the same
//! decision logic runs against any backend offering a scoped write
//! transaction.

pub mod error;
pub mod meta;
pub mod proposal;
pub mod transaction;
pub mod vote;

pub use error::StoreError;
pub use meta::MetaStore;
pub use proposal::{
    sort_newest_first, NewProposal, Proposal, ProposalStore, ProposalSummary, ProposalWithVotes,
};
pub use transaction::WriteTxn;
pub use vote::{sort_votes, NewVote, Vote};
