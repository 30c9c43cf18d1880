//! LMDB storage backend for Accord.
//!
//! Implements the `accord-store` traits using the `heed` LMDB bindings.
//! Proposals, their creation-order index, votes and metadata live in four
//! named databases within a single environment. LMDB admits one write
//! transaction at a time, which is what serializes concurrent vote casts.

pub mod environment;
pub mod error;
pub mod integrity;
pub mod meta;
pub mod migration;
pub mod proposal;
pub mod write_batch;

pub use environment::LmdbEnvironment;
pub use error::LmdbError;
pub use integrity::{check_data_dir, check_integrity, IntegrityReport};
pub use migration::{Migrator, CURRENT_SCHEMA_VERSION};
pub use write_batch::WriteBatch;
