//! Stored records and their expiration times.

use bytes::Bytes;

/// When a record stops being visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Expiry {
    /// The record never expires.
    Never,
    /// The record expires at this absolute time (seconds, same epoch as the
    /// store's clock).
    At(u64),
}

impl Expiry {
    /// Computes the expiry for a TTL given in seconds, where `0` means
    /// "never expires".
    #[inline]
    pub fn from_ttl(now: u64, ttl_secs: u32) -> Self {
        if ttl_secs == 0 {
            Expiry::Never
        } else {
            Expiry::At(now.saturating_add(u64::from(ttl_secs)))
        }
    }

    /// Returns the absolute deadline, if any.
    #[inline]
    pub fn deadline(self) -> Option<u64> {
        match self {
            Expiry::Never => None,
            Expiry::At(at) => Some(at),
        }
    }

    /// A finite expiry is reached once `now` catches up with it.
    #[inline]
    pub fn is_expired(self, now: u64) -> bool {
        match self {
            Expiry::Never => false,
            Expiry::At(at) => at <= now,
        }
    }
}

/// The authoritative state kept for one key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// The stored payload
    pub value: Bytes,
    /// When this record expires
    pub expires: Expiry,
    /// Bumped on every set of the key; the first set yields 1
    pub generation: u64,
}

impl Record {
    #[inline]
    pub fn is_expired(&self, now: u64) -> bool {
        self.expires.is_expired(now)
    }
}
