//! Binds the write-through cache to the beacon-state column of the database.
//!
//! The state database grows without bound; this facade is the only
//! bounded-memory view of it. Gossip validation and fork choice read through
//! it, block processing writes through it.

use crate::errors::Error;
use crate::write_through_cache::{CacheBackend, WriteThroughCache};
use crate::{DBColumn, Hash256, KeyValueStore};
use std::sync::Arc;

/// The bound on cached states. States are large, so this is far below the
/// general-purpose cache default.
pub const STATE_CACHE_SIZE: usize = 128;
/// The extra prune budget per mutation.
pub const STATE_CACHE_BATCH_PRUNE: usize = 16;

/// A pre-computed beacon state, addressed by the root of the block whose
/// processing produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct StateInfo {
    pub block_root: Hash256,
    /// The encoded state. Nothing in this module looks inside it.
    pub state_bytes: Vec<u8>,
}

impl StateInfo {
    pub fn new(block_root: Hash256, state_bytes: Vec<u8>) -> Self {
        Self {
            block_root,
            state_bytes,
        }
    }
}

/// The durable half of the states cache: writes land in the state column
/// before they are cached.
struct StateColumnBackend<S> {
    db: Arc<S>,
}

impl<S: KeyValueStore> CacheBackend<Hash256, StateInfo> for StateColumnBackend<S> {
    fn store(&self, key: &Hash256, value: &StateInfo) -> Result<(), Error> {
        self.db
            .put_bytes(DBColumn::BeaconState.into(), key.as_bytes(), &value.state_bytes)
    }
}

/// An LRU-bounded view of the states the node has computed, backed by the
/// state database.
pub struct BlockStates<S: KeyValueStore> {
    cache: WriteThroughCache<Hash256, StateInfo, StateColumnBackend<S>>,
    db: Arc<S>,
}

impl<S: KeyValueStore> BlockStates<S> {
    pub fn new(db: Arc<S>) -> Result<Self, Error> {
        Self::with_capacity(db, STATE_CACHE_SIZE, STATE_CACHE_BATCH_PRUNE)
    }

    /// As `new`, but with a caller-chosen bound. Used by tests and tooling;
    /// production nodes use the defaults.
    pub fn with_capacity(
        db: Arc<S>,
        max_entries: usize,
        batch_prune_size: usize,
    ) -> Result<Self, Error> {
        Ok(Self {
            cache: WriteThroughCache::new(
                StateColumnBackend { db: db.clone() },
                max_entries,
                batch_prune_size,
            )?,
            db,
        })
    }

    /// Durably stores `info`, then caches it.
    ///
    /// If the database write fails the error propagates and the cache is not
    /// updated.
    pub fn store_state_info(&self, info: StateInfo) -> Result<(), Error> {
        self.cache.put(info.block_root, info)
    }

    /// Returns the state computed from the block at `block_root`, consulting
    /// the cache first and the database on a miss.
    ///
    /// A database miss is returned as `None` and is not cached; a database
    /// error is fatal and propagates.
    pub fn get_state_info(&self, block_root: &Hash256) -> Result<Option<StateInfo>, Error> {
        let db = &self.db;
        self.cache.get(block_root, |root| {
            match db.get_bytes(DBColumn::BeaconState.into(), root.as_bytes())? {
                Some(bytes) => Ok(Some(StateInfo::new(*root, bytes))),
                None => Ok(None),
            }
        })
    }

    /// As `get_state_info`, but a state that is in neither the cache nor the
    /// database is an error.
    pub fn get_state_info_or_fail(&self, block_root: &Hash256) -> Result<StateInfo, Error> {
        self.get_state_info(block_root)?
            .ok_or(Error::StateNotFound(*block_root))
    }

    /// The number of states currently cached. The database may hold many
    /// more.
    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }
}
