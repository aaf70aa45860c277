//! Expiration Queue
//!
//! A min-heap of expiration candidates. Every set with a finite TTL pushes a
//! [`QueueEntry`] tagged with the generation the key had at that moment.
//! Nothing is ever removed from the queue when a key is overwritten or
//! deleted; instead the entry goes stale and is dropped when it reaches the
//! top and fails validation against the keyspace.
//!
//! ```text
//!   push(("k", 10, gen=1))      set k ttl=10
//!   push(("k", 14, gen=2))      set k ttl=12 (gen=1 entry is now stale)
//!
//!   heap top → ("k", 10, gen=1) → keyspace says gen=2 → discard
//!           → ("k", 14, gen=2) → matches             → evict
//! ```
//!
//! The queue itself knows nothing about the keyspace. Validation is done by
//! the engine, which owns both.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::sync::Arc;

/// A snapshot of a key's expiry taken when it was set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEntry {
    pub expires_at: u64,
    pub generation: u64,
    pub key: Arc<str>,
}

impl QueueEntry {
    pub fn new(expires_at: u64, generation: u64, key: Arc<str>) -> Self {
        Self {
            expires_at,
            generation,
            key,
        }
    }
}

// Expiration time decides the order. The remaining fields only make the
// ordering total; callers must not rely on how ties are broken.
impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.expires_at
            .cmp(&other.expires_at)
            .then_with(|| self.generation.cmp(&other.generation))
            .then_with(|| self.key.cmp(&other.key))
    }
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Min-heap of [`QueueEntry`] ordered by expiration time.
#[derive(Debug, Default)]
pub struct ExpirationQueue {
    heap: BinaryHeap<Reverse<QueueEntry>>,
}

impl ExpirationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn push(&mut self, entry: QueueEntry) {
        self.heap.push(Reverse(entry));
    }

    /// Earliest expiration time in the queue, stale entries included.
    #[inline]
    pub fn next_deadline(&self) -> Option<u64> {
        self.heap.peek().map(|Reverse(entry)| entry.expires_at)
    }

    /// Pops the earliest entry if it is due at `now`.
    ///
    /// Returns `None` when the queue is empty or its earliest entry still
    /// lies in the future; in that case nothing is removed.
    pub fn pop_due(&mut self, now: u64) -> Option<QueueEntry> {
        if self.next_deadline()? > now {
            return None;
        }
        self.heap.pop().map(|Reverse(entry)| entry)
    }

    /// Number of queued entries, including stale ones.
    #[inline]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(expires_at: u64, generation: u64, key: &str) -> QueueEntry {
        QueueEntry::new(expires_at, generation, Arc::from(key))
    }

    #[test]
    fn test_pops_in_expiration_order() {
        let mut queue = ExpirationQueue::new();
        queue.push(entry(30, 1, "c"));
        queue.push(entry(10, 1, "a"));
        queue.push(entry(20, 1, "b"));

        assert_eq!(queue.next_deadline(), Some(10));
        assert_eq!(queue.pop_due(100).unwrap().key.as_ref(), "a");
        assert_eq!(queue.pop_due(100).unwrap().key.as_ref(), "b");
        assert_eq!(queue.pop_due(100).unwrap().key.as_ref(), "c");
        assert!(queue.pop_due(100).is_none());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_future_entries_are_not_popped() {
        let mut queue = ExpirationQueue::new();
        queue.push(entry(5, 1, "k"));

        assert!(queue.pop_due(4).is_none());
        assert_eq!(queue.len(), 1);

        let popped = queue.pop_due(5).unwrap();
        assert_eq!(popped, entry(5, 1, "k"));
        assert_eq!(queue.len(), 0);
    }

    #[test]
    fn test_same_key_may_be_queued_repeatedly() {
        let mut queue = ExpirationQueue::new();
        queue.push(entry(7, 1, "k"));
        queue.push(entry(9, 2, "k"));
        queue.push(entry(7, 3, "k"));

        assert_eq!(queue.len(), 3);

        let mut popped = Vec::new();
        while let Some(e) = queue.pop_due(u64::MAX) {
            popped.push((e.expires_at, e.generation));
        }
        assert_eq!(popped.len(), 3);
        assert_eq!(popped[2], (9, 2));
    }

    #[test]
    fn test_empty_queue() {
        let mut queue = ExpirationQueue::new();
        assert_eq!(queue.next_deadline(), None);
        assert!(queue.pop_due(u64::MAX).is_none());
    }
}
