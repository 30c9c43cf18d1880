//! Metadata storage trait (schema version, sequence counters).

use crate::StoreError;

pub trait MetaStore {
    /// Stored schema version; 0 for a fresh database.
    fn get_schema_version(&self) -> Result<u32, StoreError>;

    fn set_schema_version(&self, version: u32) -> Result<(), StoreError>;

    /// Last value handed out by the named sequence; `None` if never stored.
    fn get_sequence(&self, name: &str) -> Result<Option<u64>, StoreError>;

    fn set_sequence(&self, name: &str, value: u64) -> Result<(), StoreError>;
}
