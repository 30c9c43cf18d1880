//! Database schema migration engine.
//!
//! Tracks a monotonically increasing schema version in the meta store and
//! runs sequential migration functions to bring an older database up to date.

use accord_store::MetaStore;

use crate::meta::SEQUENCE_KEYS;
use crate::LmdbError;

/// The schema version that the current code expects.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Runs database migrations to bring the schema up to date.
pub struct Migrator;

impl Migrator {
    /// Check the stored schema version and run any needed migrations.
    ///
    /// - Version 0 means a fresh database (no version stored yet).
    /// - If the stored version matches `CURRENT_SCHEMA_VERSION`, this is a no-op.
    /// - If the stored version is *higher* than what this code supports,
    ///   the database was written by a newer release and we refuse to open it.
    pub fn run(meta_store: &impl MetaStore) -> Result<(), LmdbError> {
        let current = meta_store
            .get_schema_version()
            .map_err(|e| LmdbError::Heed(e.to_string()))?;

        if current == CURRENT_SCHEMA_VERSION {
            tracing::info!(version = current, "database schema is up to date");
            return Ok(());
        }

        if current > CURRENT_SCHEMA_VERSION {
            return Err(LmdbError::Heed(format!(
                "database schema version {} is newer than supported version {}",
                current, CURRENT_SCHEMA_VERSION
            )));
        }

        for version in current..CURRENT_SCHEMA_VERSION {
            tracing::info!(from = version, to = version + 1, "running migration");
            run_migration(meta_store, version, version + 1)?;
        }

        meta_store
            .set_schema_version(CURRENT_SCHEMA_VERSION)
            .map_err(|e| LmdbError::Heed(e.to_string()))?;

        tracing::info!(version = CURRENT_SCHEMA_VERSION, "migration complete");
        Ok(())
    }
}

fn run_migration(meta_store: &impl MetaStore, from: u32, to: u32) -> Result<(), LmdbError> {
    match (from, to) {
        (0, 1) => stamp_sequences(meta_store),
        _ => Err(LmdbError::Heed(format!(
            "unknown migration: {} -> {}",
            from, to
        ))),
    }
}

/// v1 stores both sequence counters explicitly. Counters already bumped by
/// earlier writes keep their value; missing ones start at zero.
fn stamp_sequences(meta_store: &impl MetaStore) -> Result<(), LmdbError> {
    for name in SEQUENCE_KEYS {
        let stored = meta_store
            .get_sequence(name)
            .map_err(|e| LmdbError::Heed(e.to_string()))?;
        if stored.is_none() {
            meta_store
                .set_sequence(name, 0)
                .map_err(|e| LmdbError::Heed(e.to_string()))?;
            tracing::debug!(sequence = name, "stamped sequence counter");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::{PROPOSAL_SEQ_KEY, VOTE_SEQ_KEY};
    use crate::LmdbEnvironment;
    use accord_store::{NewProposal, ProposalStore, WriteTxn};
    use accord_types::Timestamp;

    fn temp_env() -> (tempfile::TempDir, LmdbEnvironment) {
        let dir = tempfile::tempdir().expect("temp dir");
        let env = LmdbEnvironment::open(dir.path(), 8, 10 * 1024 * 1024).expect("open env");
        (dir, env)
    }

    #[test]
    fn unknown_migration_is_error() {
        let (_dir, env) = temp_env();
        assert!(run_migration(&env, 99, 100).is_err());
    }

    #[test]
    fn initial_migration_stamps_sequences() {
        let (_dir, env) = temp_env();
        run_migration(&env, 0, 1).expect("migrate");
        for name in SEQUENCE_KEYS {
            assert_eq!(env.get_sequence(name).expect("get"), Some(0));
        }
    }

    #[test]
    fn initial_migration_keeps_existing_records() {
        let (_dir, env) = temp_env();
        let mut batch = env.write_batch().expect("write_batch");
        let proposal = batch
            .create_proposal(
                NewProposal::new("T", "B").expect("valid proposal"),
                Timestamp::from_millis(1),
            )
            .expect("create");
        batch.commit().expect("commit");

        Migrator::run(&env).expect("migrate");

        assert_eq!(env.get_sequence(PROPOSAL_SEQ_KEY).expect("get"), Some(1));
        assert_eq!(env.get_sequence(VOTE_SEQ_KEY).expect("get"), Some(0));
        let stored = env.get_proposal(&proposal.id).expect("still present");
        assert_eq!(stored.proposal, proposal);
    }

    #[test]
    fn fresh_database_is_stamped_with_current_version() {
        let (_dir, env) = temp_env();
        Migrator::run(&env).expect("migrate");
        assert_eq!(env.get_schema_version().expect("version"), CURRENT_SCHEMA_VERSION);
        // Second run is a no-op.
        Migrator::run(&env).expect("migrate again");
    }

    #[test]
    fn newer_schema_is_refused() {
        let (_dir, env) = temp_env();
        env.set_schema_version(CURRENT_SCHEMA_VERSION + 1)
            .expect("set version");
        assert!(Migrator::run(&env).is_err());
    }
}
