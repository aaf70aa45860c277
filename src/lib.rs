//! # ttlkv - An In-Memory Key-Value Store with TTL
//!
//! ttlkv keeps key-value records in memory with an optional per-entry
//! time-to-live, answers ordered range queries over live keys, and lets the
//! caller reclaim expired records incrementally, one per call, without
//! scanning the whole store.
//!
//! ## Features
//!
//! - **TTL Support**: Keys expire a whole number of seconds after being set
//! - **Lazy Expiry**: Reads hide expired keys immediately without mutating
//! - **Incremental Reclamation**: An expiration queue finds expired keys
//!   without a full scan; stale queue entries are skipped by generation
//! - **Sorted Range Reads**: Iterate live keys in ascending order
//! - **Injectable Clock**: Tests control time deterministically
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                               ttlkv                                     │
//! │                                                                         │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐                  │
//! │  │  Console    │───>│  Command    │───>│  Command    │                  │
//! │  │  (stdin)    │    │  Parser     │    │  Handler    │                  │
//! │  └─────────────┘    └─────────────┘    └──────┬──────┘                  │
//! │                                               │                         │
//! │                                               ▼                         │
//! │                     ┌──────────────────────────────────────────────┐    │
//! │                     │       Arc<Mutex<KvStorage<C: Clock>>>        │    │
//! │                     │  ┌──────────────────┐ ┌───────────────────┐  │    │
//! │                     │  │ Keyspace         │ │ ExpirationQueue   │  │    │
//! │                     │  │ map + sorted idx │ │ (lazy, stale ok)  │  │    │
//! │                     │  └──────────────────┘ └───────────────────┘  │    │
//! │                     └──────────────────────────────────────────────┘    │
//! │                                               ▲                         │
//! │                     ┌─────────────────────────┴───────────────────────┐ │
//! │                     │           ExpiryReclaimer                       │ │
//! │                     │      (Background Tokio Task)                    │ │
//! │                     └─────────────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```
//! use ttlkv::clock::ManualClock;
//! use ttlkv::storage::KvStorage;
//!
//! let clock = ManualClock::new();
//! let mut storage = KvStorage::with_entries(
//!     [("k1", "v1", 1), ("k2", "v2", 1), ("k3", "v3", 0)],
//!     clock.clone(),
//! );
//!
//! assert!(storage.remove("k3"));
//! assert_eq!(storage.get("k3"), None);
//!
//! clock.advance(2);
//! assert!(storage.remove_one_expired_entry().is_some());
//! assert!(storage.remove_one_expired_entry().is_some());
//! assert!(storage.remove_one_expired_entry().is_none());
//! ```
//!
//! ## Module Overview
//!
//! - [`clock`]: The time source abstraction and its implementations
//! - [`storage`]: The storage engine and the background reclaimer
//! - [`commands`]: Console command parsing and execution
//! - [`error`]: Error types for configuration and console input
//!
//! ## Design Highlights
//!
//! ### Generations Instead of Queue Rewrites
//!
//! Every set of a key bumps its generation. Expiration queue entries carry
//! the generation they were queued with, so an overwrite or removal never has
//! to find and delete old queue entries. They are recognised as stale and
//! dropped when they reach the front.
//!
//! ### Single Owner, External Locking
//!
//! [`KvStorage`](storage::KvStorage) is a plain `&mut self` structure with no
//! internal locks. Sharing it across tasks goes through
//! [`SharedStorage`](storage::SharedStorage).

pub mod clock;
pub mod commands;
pub mod error;
pub mod storage;

// Re-export commonly used types for convenience
pub use clock::{Clock, ManualClock, SystemClock};
pub use commands::{Command, CommandHandler, Reply};
pub use error::{CommandError, ConfigError};
pub use storage::{
    start_expiry_reclaimer, ExpiryReclaimer, KvStorage, ReclaimConfig, SharedStorage,
};

/// Version of ttlkv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
