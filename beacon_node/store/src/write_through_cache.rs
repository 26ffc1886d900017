//! A bounded, write-through LRU cache in front of a persistent store.
//!
//! Reads are served straight from a shared data table without taking any
//! exclusive lock. All mutation — inserts, recency re-indexing, pruning and
//! the write-through itself — is serialized behind a single coordinator
//! mutex, so the recency index only ever has one owner.
//!
//! Hits do not update recency inline; they leave a deferred "touch" that the
//! next mutation applies before it does anything else. LRU ordering is
//! therefore eventual, becoming exact at every mutation boundary.

use crate::errors::Error;
use crate::lru_index::{next_token, LruIndex};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::hash::Hash;

/// The bound on live entries, unless the caller picks another.
pub const DEFAULT_MAX_ENTRIES: usize = 512;
/// The per-mutation budget of extra index pops available to pruning.
pub const DEFAULT_BATCH_PRUNE_SIZE: usize = 32;

/// The durable half of a write-through cache.
///
/// One implementation exists per cache kind; it is invoked for every `put`
/// *before* the data table is updated.
pub trait CacheBackend<K, V>: Send + Sync {
    fn store(&self, key: &K, value: &V) -> Result<(), Error>;
}

/// A bounded map of `key -> value` where every insert is written through to a
/// backend and the least-recently-used entries are evicted first.
pub struct WriteThroughCache<K, V, B> {
    /// Concurrently-readable table of `key -> (value, recency token)`.
    data: RwLock<HashMap<K, (V, u64)>>,
    /// Owns the recency index. Taking this lock is what serializes writers;
    /// the hit path never takes it.
    index: Mutex<LruIndex<K>>,
    /// Keys read since the last mutation, awaiting a recency update.
    pending_touches: Mutex<Vec<K>>,
    backend: B,
    max_entries: usize,
    batch_prune_size: usize,
}

impl<K, V, B> WriteThroughCache<K, V, B>
where
    K: Eq + Hash + Clone,
    V: Clone,
    B: CacheBackend<K, V>,
{
    pub fn new(backend: B, max_entries: usize, batch_prune_size: usize) -> Result<Self, Error> {
        if max_entries == 0 {
            return Err(Error::ZeroCacheSize);
        }

        Ok(Self {
            data: RwLock::new(HashMap::new()),
            index: Mutex::new(LruIndex::new()),
            pending_touches: Mutex::new(Vec::new()),
            backend,
            max_entries,
            batch_prune_size,
        })
    }

    /// The number of live entries.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Returns `true` if `key` is cached, without updating its recency.
    pub fn contains(&self, key: &K) -> bool {
        self.data.read().contains_key(key)
    }

    /// Writes `value` through to the backend, then caches it.
    ///
    /// The backend write happens first: if it fails, the error propagates and
    /// the cache is left exactly as it was. A crash between the write and the
    /// cache update can only lose cache state, never store state.
    pub fn put(&self, key: K, value: V) -> Result<(), Error> {
        let mut index = self.index.lock();

        self.backend.store(&key, &value)?;

        self.apply_pending_touches(&mut index);
        self.insert_entry(&mut index, key, value);
        self.prune(&mut index);

        Ok(())
    }

    /// Reads `key`, falling back to `fetch` on a miss.
    ///
    /// A hit clones the value out of the data table, leaves a deferred touch
    /// behind and returns without blocking on the coordinator.
    ///
    /// On a miss, `fetch` runs with no cache lock held — it is expected to
    /// perform store I/O. A fetched value is cached (with no backend write;
    /// it came from the backend) and returned. An absent result is returned
    /// as-is: negative results are not cached. A `fetch` error propagates
    /// untouched.
    pub fn get<F>(&self, key: &K, fetch: F) -> Result<Option<V>, Error>
    where
        F: FnOnce(&K) -> Result<Option<V>, Error>,
    {
        let cached = self.data.read().get(key).map(|(value, _)| value.clone());
        if let Some(value) = cached {
            self.pending_touches.lock().push(key.clone());
            return Ok(Some(value));
        }

        match fetch(key)? {
            Some(value) => {
                let mut index = self.index.lock();
                // A racing caller may have filled this key in the meantime;
                // replacing its entry with an equally-fresh fetch result is
                // harmless.
                self.apply_pending_touches(&mut index);
                self.insert_entry(&mut index, key.clone(), value.clone());
                self.prune(&mut index);
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// Inserts or replaces an entry under a fresh token.
    ///
    /// Callers must hold the coordinator lock.
    fn insert_entry(&self, index: &mut LruIndex<K>, key: K, value: V) {
        let token = next_token();
        if let Some((_, old_token)) = self.data.write().insert(key.clone(), (value, token)) {
            index.delete(old_token);
        }
        index.insert(token, key);
    }

    /// Re-indexes every key read since the last mutation.
    ///
    /// Callers must hold the coordinator lock.
    fn apply_pending_touches(&self, index: &mut LruIndex<K>) {
        let touched = std::mem::take(&mut *self.pending_touches.lock());
        if touched.is_empty() {
            return;
        }

        let mut data = self.data.write();
        for key in touched {
            // The entry may have been evicted since it was read.
            if let Some((_, token)) = data.get_mut(&key) {
                index.delete(*token);
                let fresh = next_token();
                *token = fresh;
                index.insert(fresh, key);
            }
        }
    }

    /// Evicts least-recently-used entries until the bound holds again.
    ///
    /// A single pass pops at most `overflow + batch_prune_size` index
    /// entries, bounding the work any one coordinator message performs. Pops
    /// that turn out not to be needed — the bound already holds again, or the
    /// index entry is stale because its key was re-tokenized — are restored
    /// or discarded respectively without counting as evictions.
    ///
    /// Callers must hold the coordinator lock.
    fn prune(&self, index: &mut LruIndex<K>) {
        let mut data = self.data.write();
        let overflow = match data.len().checked_sub(self.max_entries) {
            Some(overflow) if overflow > 0 => overflow,
            _ => return,
        };

        for (token, key) in index.pop_oldest(overflow + self.batch_prune_size) {
            if data.len() <= self.max_entries {
                // The bound holds; this entry survives. Its token is
                // unchanged, so reinsertion preserves its position.
                index.insert(token, key);
                continue;
            }

            match data.get(&key) {
                Some((_, current)) if *current == token => {
                    data.remove(&key);
                }
                // A stale index entry; the key was touched or replaced after
                // this token was issued. Dropping it is cleanup, not an
                // eviction.
                _ => {}
            }
        }
    }

    /// Asserts the structural invariants that must hold at every mutation
    /// boundary:
    ///
    /// - the index and the data table are the same size;
    /// - every indexed token matches its entry's current token;
    /// - the data table respects `max_entries`.
    ///
    /// Only meaningful when no touches are pending.
    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        let data = self.data.read();
        let index = self.index.lock();

        assert_eq!(
            index.len(),
            data.len(),
            "index and data table should be in sync"
        );

        for (token, key) in index.iter() {
            let (_, current) = data
                .get(key)
                .expect("every indexed key should have a data entry");
            assert_eq!(current, token, "indexed token should be current");
        }

        assert!(
            data.len() <= self.max_entries,
            "data table should respect max_entries"
        );
    }
}
