//! LMDB implementation of MetaStore.

use accord_store::meta::MetaStore;
use accord_store::StoreError;

use crate::environment::LmdbEnvironment;
use crate::LmdbError;

const SCHEMA_VERSION_KEY: &[u8] = b"schema_version";

/// Sequence counters, stored as big-endian u64.
pub(crate) const PROPOSAL_SEQ_KEY: &str = "proposal_seq";
pub(crate) const VOTE_SEQ_KEY: &str = "vote_seq";
pub(crate) const SEQUENCE_KEYS: [&str; 2] = [PROPOSAL_SEQ_KEY, VOTE_SEQ_KEY];

impl MetaStore for LmdbEnvironment {
    fn get_schema_version(&self) -> Result<u32, StoreError> {
        let rtxn = self.env().read_txn().map_err(LmdbError::from)?;
        let val = self
            .meta_db
            .get(&rtxn, SCHEMA_VERSION_KEY)
            .map_err(LmdbError::from)?;
        match val {
            Some(bytes) => {
                let arr: [u8; 4] = bytes.try_into().map_err(|_| {
                    LmdbError::Serialization(
                        "schema_version has unexpected byte length".to_string(),
                    )
                })?;
                Ok(u32::from_le_bytes(arr))
            }
            None => Ok(0),
        }
    }

    fn set_schema_version(&self, version: u32) -> Result<(), StoreError> {
        let bytes = version.to_le_bytes();
        let mut wtxn = self.env().write_txn().map_err(LmdbError::from)?;
        self.meta_db
            .put(&mut wtxn, SCHEMA_VERSION_KEY, &bytes)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn get_sequence(&self, name: &str) -> Result<Option<u64>, StoreError> {
        let rtxn = self.env().read_txn().map_err(LmdbError::from)?;
        let val = self
            .meta_db
            .get(&rtxn, name.as_bytes())
            .map_err(LmdbError::from)?;
        val.map(|bytes| {
            bytes.try_into().map(u64::from_be_bytes).map_err(|_| {
                StoreError::Corruption(format!("sequence {} has unexpected byte length", name))
            })
        })
        .transpose()
    }

    fn set_sequence(&self, name: &str, value: u64) -> Result<(), StoreError> {
        let mut wtxn = self.env().write_txn().map_err(LmdbError::from)?;
        self.meta_db
            .put(&mut wtxn, name.as_bytes(), &value.to_be_bytes())
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_database_reports_version_zero() {
        let dir = tempfile::tempdir().expect("temp dir");
        let env = LmdbEnvironment::open(dir.path(), 8, 10 * 1024 * 1024).expect("open");
        assert_eq!(env.get_schema_version().expect("get"), 0);
        env.set_schema_version(3).expect("set");
        assert_eq!(env.get_schema_version().expect("get"), 3);
    }

    #[test]
    fn sequences_are_absent_until_set() {
        let dir = tempfile::tempdir().expect("temp dir");
        let env = LmdbEnvironment::open(dir.path(), 8, 10 * 1024 * 1024).expect("open");
        assert_eq!(env.get_sequence(VOTE_SEQ_KEY).expect("get"), None);
        env.set_sequence(VOTE_SEQ_KEY, 7).expect("set");
        assert_eq!(env.get_sequence(VOTE_SEQ_KEY).expect("get"), Some(7));
    }
}
