//! Nullable infrastructure for deterministic testing.
//!
//! Every external dependency of the governance services (clock, storage,
//! evidence log, notification channel) sits behind a trait. This crate
//! provides test-friendly implementations that:
//! - Return deterministic values
//! - Can be told to fail on demand
//! - Never touch the filesystem or network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod clock;
pub mod evidence;
pub mod notify;
pub mod store;

pub use clock::NullClock;
pub use evidence::NullEvidenceWriter;
pub use notify::NullNotifier;
pub use store::{NullStore, NullWriteTxn};
