//! Time Sources
//!
//! The store never reads the wall clock directly. Instead it is handed a
//! [`Clock`] at construction and asks it for "now" on every operation that
//! compares against an expiration time.
//!
//! Two implementations are provided:
//!
//! - [`SystemClock`]: seconds elapsed since the clock was created, backed by
//!   [`std::time::Instant`] so it never goes backwards.
//! - [`ManualClock`]: a shared counter that only moves when told to. Clones
//!   observe the same time, so a test can keep one handle and give another
//!   to the store.
//!
//! ## Example
//!
//! ```
//! use ttlkv::clock::{Clock, ManualClock};
//!
//! let clock = ManualClock::new();
//! let handle = clock.clone();
//!
//! handle.advance(5);
//! assert_eq!(clock.now(), 5);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// A monotonic source of "now", in whole seconds since an arbitrary epoch.
///
/// Implementations must be non-decreasing across calls. The store only adds
/// TTL offsets to the returned value and compares timestamps; it performs no
/// calendar logic.
pub trait Clock {
    /// Returns the current time in seconds.
    fn now(&self) -> u64;
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> u64 {
        (**self).now()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> u64 {
        (**self).now()
    }
}

/// Real monotonic time, counted from the moment the clock was created.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    #[inline]
    fn now(&self) -> u64 {
        self.origin.elapsed().as_secs()
    }
}

/// A clock that only advances when asked to.
///
/// Cloning yields another handle to the same underlying time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    secs: Arc<AtomicU64>,
}

impl ManualClock {
    /// Creates a clock reading zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a clock starting at `secs`.
    pub fn starting_at(secs: u64) -> Self {
        Self {
            secs: Arc::new(AtomicU64::new(secs)),
        }
    }

    /// Moves time forward by `secs`, saturating at `u64::MAX`.
    pub fn advance(&self, secs: u64) {
        let _ = self
            .secs
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |now| {
                Some(now.saturating_add(secs))
            });
    }

    /// Moves time to `secs`. Earlier values are ignored so the clock stays
    /// monotonic.
    pub fn set(&self, secs: u64) {
        self.secs.fetch_max(secs, Ordering::Relaxed);
    }
}

impl Clock for ManualClock {
    #[inline]
    fn now(&self) -> u64 {
        self.secs.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_shared_between_clones() {
        let clock = ManualClock::new();
        let other = clock.clone();

        assert_eq!(clock.now(), 0);
        other.advance(3);
        assert_eq!(clock.now(), 3);
        clock.advance(2);
        assert_eq!(other.now(), 5);
    }

    #[test]
    fn test_manual_clock_never_goes_backwards() {
        let clock = ManualClock::starting_at(10);

        clock.set(4);
        assert_eq!(clock.now(), 10);

        clock.set(12);
        assert_eq!(clock.now(), 12);
    }

    #[test]
    fn test_manual_clock_advance_saturates() {
        let clock = ManualClock::starting_at(u64::MAX - 1);
        clock.advance(10);
        assert_eq!(clock.now(), u64::MAX);
    }

    #[test]
    fn test_system_clock_starts_near_zero() {
        let clock = SystemClock::new();
        let first = clock.now();
        let second = clock.now();

        assert!(first <= 1);
        assert!(second >= first);
    }

    #[test]
    fn test_clock_through_arc_and_reference() {
        fn read<C: Clock>(clock: C) -> u64 {
            clock.now()
        }

        let clock = Arc::new(ManualClock::starting_at(7));
        assert_eq!(read(Arc::clone(&clock)), 7);
        assert_eq!(read(&*clock), 7);
    }
}
