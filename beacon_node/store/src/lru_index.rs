//! An ordered-by-recency index over cached keys.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// The process-wide source of recency tokens.
static RECENCY_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Returns the next recency token.
///
/// Tokens are strictly monotonic and never reused for the lifetime of the
/// process; two concurrent callers always observe distinct tokens.
pub fn next_token() -> u64 {
    RECENCY_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// Maps recency tokens to cache keys, iterable oldest-first.
///
/// The index says nothing about the data itself; it exists so that eviction
/// can find the least-recently-used keys in logarithmic time.
#[derive(Debug, Default)]
pub struct LruIndex<K> {
    tokens: BTreeMap<u64, K>,
}

impl<K> LruIndex<K> {
    pub fn new() -> Self {
        Self {
            tokens: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Records `key` as last accessed at `token`.
    pub fn insert(&mut self, token: u64, key: K) {
        self.tokens.insert(token, key);
    }

    /// Forgets the entry recorded at `token`, if any.
    pub fn delete(&mut self, token: u64) -> Option<K> {
        self.tokens.remove(&token)
    }

    /// Removes and returns up to `batch_n` of the oldest entries, in
    /// ascending token order.
    pub fn pop_oldest(&mut self, batch_n: usize) -> Vec<(u64, K)> {
        let mut popped = Vec::with_capacity(batch_n.min(self.tokens.len()));

        for _ in 0..batch_n {
            let oldest = match self.tokens.keys().next() {
                Some(token) => *token,
                None => break,
            };
            if let Some(key) = self.tokens.remove(&oldest) {
                popped.push((oldest, key));
            }
        }

        popped
    }

    #[cfg(test)]
    pub(crate) fn iter(&self) -> impl Iterator<Item = (&u64, &K)> {
        self.tokens.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_strictly_monotonic() {
        let a = next_token();
        let b = next_token();
        let c = next_token();
        assert!(a < b && b < c);
    }

    #[test]
    fn concurrent_tokens_are_distinct() {
        let handles = (0..8)
            .map(|_| std::thread::spawn(|| (0..1000).map(|_| next_token()).collect::<Vec<_>>()))
            .collect::<Vec<_>>();

        let mut all = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect::<Vec<_>>();

        let total = all.len();
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), total);
    }

    #[test]
    fn pop_oldest_returns_ascending_tokens() {
        let mut index = LruIndex::new();
        index.insert(30, "c");
        index.insert(10, "a");
        index.insert(20, "b");

        assert_eq!(index.pop_oldest(2), vec![(10, "a"), (20, "b")]);
        assert_eq!(index.len(), 1);

        // Requesting more than remains drains the index without error.
        assert_eq!(index.pop_oldest(5), vec![(30, "c")]);
        assert!(index.is_empty());
        assert_eq!(index.pop_oldest(5), vec![]);
    }

    #[test]
    fn delete_removes_a_single_token() {
        let mut index = LruIndex::new();
        index.insert(1, "a");
        index.insert(2, "b");

        assert_eq!(index.delete(1), Some("a"));
        assert_eq!(index.delete(1), None);
        assert_eq!(index.pop_oldest(2), vec![(2, "b")]);
    }
}
