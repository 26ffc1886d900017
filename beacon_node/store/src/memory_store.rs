use crate::{get_key_for_col, Error, KeyValueStore};
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// Used for keying a `BTreeMap` with a column-prefixed byte string.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone)]
pub struct BytesKey {
    key: Vec<u8>,
}

impl BytesKey {
    pub fn from_vec(key: Vec<u8>) -> Self {
        Self { key }
    }
}

type DBMap = BTreeMap<BytesKey, Vec<u8>>;

/// A thread-safe `BTreeMap` wrapper, standing in for the on-disk database
/// engine in tests.
pub struct MemoryStore {
    db: RwLock<DBMap>,
}

impl MemoryStore {
    /// Create a new, empty database.
    pub fn open() -> Self {
        Self {
            db: RwLock::new(BTreeMap::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::open()
    }
}

impl KeyValueStore for MemoryStore {
    /// Get the value of some key from the database. Returns `None` if the key
    /// does not exist.
    fn get_bytes(&self, col: &str, key: &[u8]) -> Result<Option<Vec<u8>>, Error> {
        let column_key = BytesKey::from_vec(get_key_for_col(col, key));
        Ok(self.db.read().get(&column_key).cloned())
    }

    /// Puts a key in the database.
    fn put_bytes(&self, col: &str, key: &[u8], val: &[u8]) -> Result<(), Error> {
        let column_key = BytesKey::from_vec(get_key_for_col(col, key));
        self.db.write().insert(column_key, val.to_vec());
        Ok(())
    }

    /// Return true if some key exists in some column.
    fn key_exists(&self, col: &str, key: &[u8]) -> Result<bool, Error> {
        let column_key = BytesKey::from_vec(get_key_for_col(col, key));
        Ok(self.db.read().contains_key(&column_key))
    }

    /// Delete some key from the database.
    fn key_delete(&self, col: &str, key: &[u8]) -> Result<(), Error> {
        let column_key = BytesKey::from_vec(get_key_for_col(col, key));
        self.db.write().remove(&column_key);
        Ok(())
    }
}
