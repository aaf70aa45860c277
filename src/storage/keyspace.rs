//! Primary Map and Order Index
//!
//! The store needs two access patterns over the same set of keys: O(1) point
//! lookups and ordered range scans. Both live in [`Keyspace`] so that every
//! insertion and removal touches them together and the two never disagree
//! about which keys exist.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                       Keyspace                           │
//! │                                                          │
//! │   records: HashMap<Arc<str>, Record>   (point lookups)   │
//! │   order:   BTreeSet<Arc<str>>          (range scans)     │
//! │                                                          │
//! │   Both hold clones of the same Arc<str> per key.         │
//! └──────────────────────────────────────────────────────────┘
//! ```

use crate::storage::record::{Expiry, Record};
use bytes::Bytes;
use std::collections::{BTreeSet, HashMap};
use std::ops::Bound;
use std::sync::Arc;

/// Key → record map coupled with a sorted index over the same keys.
#[derive(Debug, Default)]
pub struct Keyspace {
    records: HashMap<Arc<str>, Record>,
    order: BTreeSet<Arc<str>>,
}

impl Keyspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites a key and returns its new generation.
    ///
    /// A new key starts at generation 1; an existing key has its value and
    /// expiry replaced and its generation bumped.
    pub fn upsert(&mut self, key: &str, value: Bytes, expires: Expiry) -> u64 {
        if let Some(record) = self.records.get_mut(key) {
            record.value = value;
            record.expires = expires;
            record.generation += 1;
            return record.generation;
        }

        let shared: Arc<str> = Arc::from(key);
        self.order.insert(Arc::clone(&shared));
        self.records.insert(
            shared,
            Record {
                value,
                expires,
                generation: 1,
            },
        );
        debug_assert_eq!(self.records.len(), self.order.len());
        1
    }

    /// Returns the shared handle for a stored key.
    pub fn key_handle(&self, key: &str) -> Option<Arc<str>> {
        self.records
            .get_key_value(key)
            .map(|(shared, _)| Arc::clone(shared))
    }

    #[inline]
    pub fn get(&self, key: &str) -> Option<&Record> {
        self.records.get(key)
    }

    /// Removes a key from both structures, returning what was stored.
    pub fn remove(&mut self, key: &str) -> Option<(Arc<str>, Record)> {
        let removed = self.records.remove_entry(key)?;
        self.order.remove(key);
        debug_assert_eq!(self.records.len(), self.order.len());
        Some(removed)
    }

    /// Iterates keys strictly greater than `start` in ascending order,
    /// joined with their records.
    pub fn range_after<'a>(
        &'a self,
        start: &str,
    ) -> impl Iterator<Item = (&'a str, &'a Record)> + 'a {
        self.order
            .range::<str, _>((Bound::Excluded(start), Bound::Unbounded))
            .filter_map(move |key| self.records.get(&**key).map(|record| (&**key, record)))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of keys in the sorted index. Always equal to [`len`](Self::len).
    #[cfg(test)]
    fn indexed_len(&self) -> usize {
        self.order.len()
    }
}
