//! Fundamental types for Accord governance.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! proposal and vote identifiers, timestamps and clocks, and the closed enums
//! that drive the dual-consensus rule (actor class, decision, proposal status).

pub mod error;
pub mod id;
pub mod state;
pub mod time;

pub use error::TypesError;
pub use id::{ProposalId, VoteId};
pub use state::{Actor, Decision, ProposalStatus};
pub use time::{Clock, SystemClock, Timestamp};
