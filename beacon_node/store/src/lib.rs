//! Storage functionality for the beacon node.
//!
//! Provides the following:
//!
//! - `KeyValueStore`: the surface assumed of the on-disk database engine.
//! - `MemoryStore`: an in-memory implementation of it, used in testing.
//! - `WriteThroughCache`: a bounded LRU cache that fronts a store.
//! - `BlockStates`: the cache bound to the beacon-state column, keyed by
//!   block root.

mod block_states;
mod errors;
mod lru_index;
mod memory_store;
mod write_through_cache;

pub use block_states::{BlockStates, StateInfo, STATE_CACHE_BATCH_PRUNE, STATE_CACHE_SIZE};
pub use errors::{DBError, Error};
pub use memory_store::MemoryStore;
pub use write_through_cache::{
    CacheBackend, WriteThroughCache, DEFAULT_BATCH_PRUNE_SIZE, DEFAULT_MAX_ENTRIES,
};

pub type Hash256 = ethereum_types::H256;

/// The operations assumed of the key-value database engine.
///
/// Everything above this trait treats keys and values as opaque bytes;
/// columns keep unrelated key spaces apart inside one database.
pub trait KeyValueStore: Sync + Send + Sized + 'static {
    /// Retrieve some bytes in `column` with `key`.
    fn get_bytes(&self, column: &str, key: &[u8]) -> Result<Option<Vec<u8>>, Error>;

    /// Store some `value` in `column`, indexed with `key`.
    fn put_bytes(&self, column: &str, key: &[u8], value: &[u8]) -> Result<(), Error>;

    /// Return `true` if `key` exists in `column`.
    fn key_exists(&self, column: &str, key: &[u8]) -> Result<bool, Error>;

    /// Removes `key` from `column`.
    fn key_delete(&self, column: &str, key: &[u8]) -> Result<(), Error>;
}

pub fn get_key_for_col(column: &str, key: &[u8]) -> Vec<u8> {
    let mut result = column.as_bytes().to_vec();
    result.extend_from_slice(key);
    result
}

/// A unique column identifier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DBColumn {
    BeaconState,
}

impl Into<&'static str> for DBColumn {
    /// Returns a `&str` prefix to be added to keys before they hit the
    /// key-value database.
    fn into(self) -> &'static str {
        match self {
            DBColumn::BeaconState => "ste",
        }
    }
}
