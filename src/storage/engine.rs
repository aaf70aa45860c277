//! Storage Engine with TTL Support
//!
//! This module implements [`KvStorage`], the in-memory store at the heart of
//! ttlkv. It keeps key-value records with optional expiry, answers ordered
//! range queries, and lets callers reclaim expired records one at a time.
//!
//! ## Design Decisions
//!
//! 1. **Lazy Expiry**: Reads check expiry themselves. An expired record is
//!    invisible immediately but stays in memory until reclaimed.
//! 2. **Expiration Queue with Generations**: Overwrites and removals never
//!    touch the queue. Each queued entry carries the key's generation, and a
//!    mismatch on pop marks it stale.
//! 3. **Injected Clock**: "now" comes from a [`Clock`] handed in at
//!    construction and is read fresh by every operation that needs it.
//! 4. **No Internal Locking**: The engine is a plain single-owner structure.
//!    Share it behind a mutex (see [`SharedStorage`](super::SharedStorage)).
//!
//! ## Layout
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        KvStorage                            │
//! │                                                             │
//! │  ┌───────────────────────────────┐   ┌───────────────────┐  │
//! │  │           Keyspace            │   │  ExpirationQueue  │  │
//! │  │  HashMap<key, Record>         │   │  min-heap of      │  │
//! │  │  BTreeSet<key>                │   │  (at, gen, key)   │  │
//! │  └───────────────────────────────┘   └───────────────────┘  │
//! │                 ▲                              │            │
//! │                 └──── validate on pop ─────────┘            │
//! └─────────────────────────────────────────────────────────────┘
//! ```

use crate::clock::{Clock, SystemClock};
use crate::storage::expiry_queue::{ExpirationQueue, QueueEntry};
use crate::storage::keyspace::Keyspace;
use crate::storage::record::Expiry;
use bytes::Bytes;
use tracing::{debug, trace};

/// The main storage engine for ttlkv.
///
/// # Example
///
/// ```
/// use ttlkv::clock::ManualClock;
/// use ttlkv::storage::KvStorage;
/// use bytes::Bytes;
///
/// let clock = ManualClock::new();
/// let mut storage = KvStorage::new(clock.clone());
///
/// storage.set("session", "abc123", 60);
/// assert_eq!(storage.get("session"), Some(Bytes::from("abc123")));
///
/// clock.advance(60);
/// assert_eq!(storage.get("session"), None);
///
/// // The record is still held until reclaimed
/// assert_eq!(
///     storage.remove_one_expired_entry(),
///     Some(("session".to_string(), Bytes::from("abc123")))
/// );
/// assert!(storage.is_empty());
/// ```
#[derive(Debug)]
pub struct KvStorage<C = SystemClock> {
    /// Time source for every expiry decision
    clock: C,

    /// Primary Map and Order Index
    keyspace: Keyspace,

    /// Expiration candidates, possibly stale
    queue: ExpirationQueue,

    /// Statistics: total set operations
    set_count: u64,

    /// Statistics: removals that found a key
    remove_count: u64,

    /// Statistics: expired records reclaimed
    reclaimed_count: u64,

    /// Statistics: stale queue entries dropped
    stale_count: u64,
}

impl Default for KvStorage<SystemClock> {
    fn default() -> Self {
        Self::new(SystemClock::new())
    }
}

impl<C: Clock> KvStorage<C> {
    /// Creates an empty store driven by `clock`.
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            keyspace: Keyspace::new(),
            queue: ExpirationQueue::new(),
            set_count: 0,
            remove_count: 0,
            reclaimed_count: 0,
            stale_count: 0,
        }
    }

    /// Creates a store pre-populated from `(key, value, ttl_secs)` triples.
    ///
    /// Entries are applied in order exactly as repeated [`set`](Self::set)
    /// calls would be, so a later duplicate key overrides an earlier one.
    pub fn with_entries<I, K, V>(entries: I, clock: C) -> Self
    where
        I: IntoIterator<Item = (K, V, u32)>,
        K: AsRef<str>,
        V: Into<Bytes>,
    {
        let mut storage = Self::new(clock);
        for (key, value, ttl_secs) in entries {
            storage.set(key.as_ref(), value, ttl_secs);
        }
        storage
    }

    /// Returns the clock driving this store.
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Sets a key-value pair that expires `ttl_secs` seconds from now.
    ///
    /// A TTL of `0` means the key never expires. Overwriting a key replaces
    /// its value and expiry and bumps its generation, which leaves any older
    /// expiration entries for it stale.
    pub fn set(&mut self, key: &str, value: impl Into<Bytes>, ttl_secs: u32) {
        self.set_count += 1;

        let expires = Expiry::from_ttl(self.clock.now(), ttl_secs);
        let generation = self.keyspace.upsert(key, value.into(), expires);

        if let Some(deadline) = expires.deadline() {
            if let Some(shared) = self.keyspace.key_handle(key) {
                self.queue.push(QueueEntry::new(deadline, generation, shared));
            }
        }

        trace!(key, generation, ?expires, "set");
    }

    /// Deletes a key.
    ///
    /// # Returns
    ///
    /// Returns `true` if the key was deleted, `false` if it didn't exist.
    /// Pending expiration entries for the key are left to go stale.
    pub fn remove(&mut self, key: &str) -> bool {
        if self.keyspace.remove(key).is_some() {
            self.remove_count += 1;
            trace!(key, "removed");
            true
        } else {
            false
        }
    }

    /// Gets the value for a key.
    ///
    /// Returns `None` if the key doesn't exist or has expired. An expired
    /// record is not removed here; see
    /// [`remove_one_expired_entry`](Self::remove_one_expired_entry).
    pub fn get(&self, key: &str) -> Option<Bytes> {
        let now = self.clock.now();
        self.keyspace
            .get(key)
            .filter(|record| !record.is_expired(now))
            .map(|record| record.value.clone())
    }

    /// Returns up to `count` live pairs whose keys sort strictly after
    /// `start`, in ascending key order.
    ///
    /// `start` does not have to exist. Expired records are skipped without
    /// counting towards `count`.
    pub fn get_many_sorted(&self, start: &str, count: usize) -> Vec<(String, Bytes)> {
        if count == 0 {
            return Vec::new();
        }

        let now = self.clock.now();
        self.keyspace
            .range_after(start)
            .filter(|(_, record)| !record.is_expired(now))
            .take(count)
            .map(|(key, record)| (key.to_string(), record.value.clone()))
            .collect()
    }

    /// Reclaims a single expired record.
    ///
    /// Walks the expiration queue from its earliest entry, dropping entries
    /// whose key was removed or set again since they were queued. The first
    /// entry that still matches its key's current record is evicted and its
    /// pair returned.
    ///
    /// # Returns
    ///
    /// `None` when nothing is due yet. Calling this in a loop drains every
    /// currently expired record, one per call.
    pub fn remove_one_expired_entry(&mut self) -> Option<(String, Bytes)> {
        let now = self.clock.now();

        while let Some(candidate) = self.queue.pop_due(now) {
            // Removed, or set again since this entry was queued
            let is_current = self.keyspace.get(&candidate.key).is_some_and(|record| {
                record.generation == candidate.generation
                    && record.expires == Expiry::At(candidate.expires_at)
            });
            if !is_current {
                self.discard_stale(&candidate);
                continue;
            }

            if let Some((key, record)) = self.keyspace.remove(&candidate.key) {
                self.reclaimed_count += 1;
                debug!(
                    key = %key,
                    expired_at = candidate.expires_at,
                    now,
                    "Reclaimed expired entry"
                );
                return Some((key.to_string(), record.value));
            }
        }

        None
    }

    fn discard_stale(&mut self, candidate: &QueueEntry) {
        self.stale_count += 1;
        trace!(
            key = %candidate.key,
            generation = candidate.generation,
            "Discarded stale expiration entry"
        );
    }

    /// Gets the remaining lifetime of a live key.
    ///
    /// # Returns
    ///
    /// - `Some(RemainingTtl::Persistent)` if the key never expires
    /// - `Some(RemainingTtl::Expires(secs))` with seconds left otherwise
    /// - `None` if the key doesn't exist or has expired
    pub fn ttl(&self, key: &str) -> Option<RemainingTtl> {
        let now = self.clock.now();
        let record = self.keyspace.get(key)?;
        match record.expires {
            Expiry::Never => Some(RemainingTtl::Persistent),
            Expiry::At(at) if at > now => Some(RemainingTtl::Expires(at - now)),
            Expiry::At(_) => None,
        }
    }

    /// Number of stored records, including expired ones not yet reclaimed.
    pub fn len(&self) -> usize {
        self.keyspace.len()
    }

    /// Returns true if no records are stored.
    pub fn is_empty(&self) -> bool {
        self.keyspace.is_empty()
    }

    /// Number of queued expiration entries, stale ones included.
    pub fn pending_expirations(&self) -> usize {
        self.queue.len()
    }

    /// Returns storage statistics.
    pub fn stats(&self) -> StorageStats {
        StorageStats {
            keys: self.keyspace.len() as u64,
            pending_expirations: self.queue.len() as u64,
            set_ops: self.set_count,
            remove_ops: self.remove_count,
            reclaimed: self.reclaimed_count,
            stale_discarded: self.stale_count,
        }
    }
}

/// Remaining lifetime of a live key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemainingTtl {
    /// The key never expires
    Persistent,
    /// The key expires after this many more seconds
    Expires(u64),
}

/// Storage statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StorageStats {
    /// Number of records currently stored (expired-but-unreclaimed included)
    pub keys: u64,
    /// Number of queued expiration entries
    pub pending_expirations: u64,
    /// Total set operations
    pub set_ops: u64,
    /// Total successful removals
    pub remove_ops: u64,
    /// Total expired records reclaimed
    pub reclaimed: u64,
    /// Total stale expiration entries dropped
    pub stale_discarded: u64,
}
