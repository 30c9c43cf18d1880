//! LMDB environment setup.

use std::path::Path;
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};

use accord_store::proposal::{ProposalStore, ProposalSummary, ProposalWithVotes};
use accord_store::StoreError;
use accord_types::{ProposalId, ProposalStatus};

use crate::proposal;
use crate::write_batch::WriteBatch;
use crate::LmdbError;

/// Named databases this backend creates.
pub(crate) const DATABASE_NAMES: &[&str] = &["proposals", "proposal_order", "votes", "meta"];

/// Wraps the LMDB environment and all database handles.
pub struct LmdbEnvironment {
    env: Arc<Env>,
    /// `proposal_id` → bincode(`Proposal`).
    pub(crate) proposals_db: Database<Bytes, Bytes>,
    /// `created_at_be ++ seq_be` → `proposal_id`.
    pub(crate) proposal_order_db: Database<Bytes, Bytes>,
    /// `proposal_id ++ created_at_be ++ seq_be` → bincode(`Vote`).
    pub(crate) votes_db: Database<Bytes, Bytes>,
    /// Sequence counters and schema version.
    pub(crate) meta_db: Database<Bytes, Bytes>,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment at the given path.
    ///
    /// The directory is created if missing. `max_dbs` must leave room for
    /// every named database.
    pub fn open(path: &Path, max_dbs: u32, map_size: usize) -> Result<Self, LmdbError> {
        if (max_dbs as usize) < DATABASE_NAMES.len() {
            return Err(LmdbError::Heed(format!(
                "max_dbs {} is below the {} databases required",
                max_dbs,
                DATABASE_NAMES.len()
            )));
        }
        std::fs::create_dir_all(path)
            .map_err(|e| LmdbError::Heed(format!("create {}: {}", path.display(), e)))?;

        let mut options = EnvOpenOptions::new();
        options.map_size(map_size).max_dbs(max_dbs);
        // SAFETY: each environment path is opened once per process and the
        // memory map is never modified outside LMDB.
        let env = unsafe { options.open(path) }?;

        let mut wtxn = env.write_txn()?;
        let proposals_db = env.create_database(&mut wtxn, Some("proposals"))?;
        let proposal_order_db = env.create_database(&mut wtxn, Some("proposal_order"))?;
        let votes_db = env.create_database(&mut wtxn, Some("votes"))?;
        let meta_db = env.create_database(&mut wtxn, Some("meta"))?;
        wtxn.commit()?;

        tracing::info!(path = %path.display(), map_size, "opened LMDB environment");

        Ok(Self {
            env: Arc::new(env),
            proposals_db,
            proposal_order_db,
            votes_db,
            meta_db,
        })
    }

    /// The underlying heed environment.
    pub fn env(&self) -> &Arc<Env> {
        &self.env
    }

    /// Begin a write batch. Blocks while another write batch is open.
    pub fn write_batch(&self) -> Result<WriteBatch<'_>, StoreError> {
        WriteBatch::new(self)
    }
}

impl ProposalStore for LmdbEnvironment {
    type WriteTxn<'a>
        = WriteBatch<'a>
    where
        Self: 'a;

    fn begin_write(&self) -> Result<Self::WriteTxn<'_>, StoreError> {
        self.write_batch()
    }

    fn get_proposal(&self, id: &ProposalId) -> Result<ProposalWithVotes, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        proposal::read_proposal_with_votes(self, &rtxn, id)
    }

    fn list_proposals(
        &self,
        status: Option<ProposalStatus>,
    ) -> Result<Vec<ProposalSummary>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let iter = self
            .proposal_order_db
            .rev_iter(&rtxn)
            .map_err(LmdbError::from)?;
        let mut results = Vec::new();
        for entry in iter {
            let (_key, id_bytes) = entry.map_err(LmdbError::from)?;
            let id = proposal::id_from_bytes(id_bytes)?;
            let record = proposal::read_proposal(self, &rtxn, &id)?.ok_or_else(|| {
                StoreError::Corruption(format!("order index points at missing proposal {id}"))
            })?;
            if status.is_some_and(|s| s != record.status) {
                continue;
            }
            let vote_count = proposal::count_votes(self, &rtxn, &id)?;
            results.push(ProposalSummary::new(&record, vote_count));
        }
        tracing::debug!(count = results.len(), filter = ?status, "listed proposals");
        Ok(results)
    }

    fn proposal_count(&self) -> Result<u64, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let count = self.proposals_db.len(&rtxn).map_err(LmdbError::from)?;
        Ok(count)
    }
}
