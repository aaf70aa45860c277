//! Storage Engine Module
//!
//! This module provides the core storage functionality for ttlkv: a
//! key-value store with per-entry TTL, ordered range scans, and lazy
//! reclamation of expired entries, plus an optional background reclaimer.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       KvStorage                             │
//! │  ┌──────────────────────────┐   ┌──────────────────────┐    │
//! │  │ Keyspace                 │   │ ExpirationQueue      │    │
//! │  │  Primary Map + Order Idx │   │  (may hold stale     │    │
//! │  │                          │   │   entries)           │    │
//! │  └──────────────────────────┘   └──────────────────────┘    │
//! └─────────────────────────────────────────────────────────────┘
//!                            ▲
//!                            │ Arc<Mutex<_>>
//!              ┌─────────────┴─────────────┐
//!              │     ExpiryReclaimer       │
//!              │  (Background Tokio Task)  │
//!              └───────────────────────────┘
//! ```
//!
//! ## Features
//!
//! - **TTL Support**: Keys can have a time-to-live in whole seconds
//! - **Lazy Expiry**: Expired keys are hidden from reads immediately
//! - **Incremental Reclamation**: Expired keys are evicted one per call
//! - **Sorted Scans**: Range reads over keys in ascending order
//!
//! ## Example
//!
//! ```
//! use ttlkv::clock::ManualClock;
//! use ttlkv::storage::KvStorage;
//! use bytes::Bytes;
//!
//! let clock = ManualClock::new();
//! let mut storage = KvStorage::with_entries(
//!     [("a", "va", 0), ("b", "vb", 0), ("d", "vd", 0), ("e", "ve", 0)],
//!     clock,
//! );
//!
//! let page = storage.get_many_sorted("c", 2);
//! assert_eq!(page[0], ("d".to_string(), Bytes::from("vd")));
//! assert_eq!(page[1], ("e".to_string(), Bytes::from("ve")));
//!
//! assert!(storage.remove("a"));
//! assert_eq!(storage.get("a"), None);
//! ```

pub mod engine;
pub mod expiry_queue;
pub mod keyspace;
pub mod reclaim;
pub mod record;

// Re-export commonly used types
pub use engine::{KvStorage, RemainingTtl, StorageStats};
pub use reclaim::{
    lock, reclaim_batch, shared, start_expiry_reclaimer, ExpiryReclaimer, ReclaimConfig,
    SharedStorage,
};
pub use record::{Expiry, Record};
