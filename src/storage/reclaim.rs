//! Background Expiry Reclaimer
//!
//! The storage engine never evicts on its own. Expired records stay in
//! memory until someone calls
//! [`remove_one_expired_entry`](crate::storage::KvStorage::remove_one_expired_entry).
//! This module provides a Tokio task that does so periodically for a store
//! shared behind a mutex.
//!
//! ## Design
//!
//! The reclaimer:
//! 1. Sleeps for a configurable interval (default: 100ms)
//! 2. Locks the store and reclaims up to `max_per_sweep` expired entries
//! 3. Releases the lock so foreground operations are never starved
//! 4. Logs what it reclaimed
//!
//! ## Adaptive Frequency
//!
//! If a sweep used its whole budget there is probably more to reclaim, so the
//! interval is halved. If a sweep found nothing, the interval doubles.

use crate::clock::Clock;
use crate::error::ConfigError;
use crate::storage::KvStorage;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, trace};

/// A store shared between the reclaimer and foreground callers.
pub type SharedStorage<C> = Arc<Mutex<KvStorage<C>>>;

/// Wraps a store for sharing.
pub fn shared<C: Clock>(storage: KvStorage<C>) -> SharedStorage<C> {
    Arc::new(Mutex::new(storage))
}

/// Locks a shared store, recovering it if the lock was poisoned.
pub fn lock<C>(storage: &SharedStorage<C>) -> MutexGuard<'_, KvStorage<C>> {
    storage.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Configuration for the expiry reclaimer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReclaimConfig {
    /// Base interval between sweeps (default: 100ms)
    pub base_interval: Duration,

    /// Minimum interval between sweeps (default: 10ms)
    pub min_interval: Duration,

    /// Maximum interval between sweeps (default: 1s)
    pub max_interval: Duration,

    /// Most entries reclaimed while holding the lock once (default: 128)
    pub max_per_sweep: usize,
}

impl Default for ReclaimConfig {
    fn default() -> Self {
        Self {
            base_interval: Duration::from_millis(100),
            min_interval: Duration::from_millis(10),
            max_interval: Duration::from_secs(1),
            max_per_sweep: 128,
        }
    }
}

impl ReclaimConfig {
    /// Checks that the configuration can drive a reclaimer.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_per_sweep == 0 {
            return Err(ConfigError::ZeroBatch);
        }
        if self.min_interval.is_zero() || self.base_interval.is_zero() || self.max_interval.is_zero()
        {
            return Err(ConfigError::ZeroInterval);
        }
        if self.min_interval > self.base_interval || self.base_interval > self.max_interval {
            return Err(ConfigError::IntervalOrder {
                min: self.min_interval,
                base: self.base_interval,
                max: self.max_interval,
            });
        }
        Ok(())
    }

    /// Interval to use after a sweep that reclaimed `reclaimed` entries.
    fn next_interval(&self, current: Duration, reclaimed: usize) -> Duration {
        if reclaimed >= self.max_per_sweep {
            (current / 2).max(self.min_interval)
        } else if reclaimed == 0 {
            (current * 2).min(self.max_interval)
        } else {
            current
        }
    }
}

/// A handle to the running reclaimer.
///
/// When this handle is dropped, the reclaimer task will be stopped.
#[derive(Debug)]
pub struct ExpiryReclaimer {
    /// Sender to signal shutdown
    shutdown_tx: watch::Sender<bool>,
}

impl ExpiryReclaimer {
    /// Starts the reclaimer as a background task on the current Tokio
    /// runtime.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `config` fails [`ReclaimConfig::validate`].
    ///
    /// # Example
    ///
    /// ```ignore
    /// use ttlkv::storage::{shared, ExpiryReclaimer, KvStorage, ReclaimConfig};
    ///
    /// let storage = shared(KvStorage::default());
    /// let reclaimer = ExpiryReclaimer::start(storage.clone(), ReclaimConfig::default())?;
    ///
    /// // Reclaimer runs in the background...
    ///
    /// // Dropping the handle stops it
    /// drop(reclaimer);
    /// ```
    pub fn start<C>(storage: SharedStorage<C>, config: ReclaimConfig) -> Result<Self, ConfigError>
    where
        C: Clock + Send + 'static,
    {
        config.validate()?;
        Ok(Self::spawn(storage, config))
    }

    fn spawn<C>(storage: SharedStorage<C>, config: ReclaimConfig) -> Self
    where
        C: Clock + Send + 'static,
    {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        tokio::spawn(reclaim_loop(storage, config, shutdown_rx));

        info!("Background expiry reclaimer started");

        Self { shutdown_tx }
    }

    /// Stops the reclaimer.
    ///
    /// This is called automatically when the handle is dropped.
    pub fn stop(&self) {
        if !self.shutdown_tx.send_replace(true) {
            info!("Background expiry reclaimer stopped");
        }
    }
}

impl Drop for ExpiryReclaimer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Reclaims up to `budget` expired entries, returning how many were found.
pub fn reclaim_batch<C: Clock>(storage: &SharedStorage<C>, budget: usize) -> usize {
    let mut guard = lock(storage);
    let mut reclaimed = 0;
    while reclaimed < budget && guard.remove_one_expired_entry().is_some() {
        reclaimed += 1;
    }
    reclaimed
}

/// The main reclaimer loop.
async fn reclaim_loop<C>(
    storage: SharedStorage<C>,
    config: ReclaimConfig,
    mut shutdown_rx: watch::Receiver<bool>,
) where
    C: Clock + Send + 'static,
{
    let mut current_interval = config.base_interval;

    loop {
        tokio::select! {
            _ = tokio::time::sleep(current_interval) => {}
            result = shutdown_rx.changed() => {
                if result.is_err() || *shutdown_rx.borrow() {
                    debug!("Expiry reclaimer received shutdown signal");
                    return;
                }
            }
        }

        let reclaimed = reclaim_batch(&storage, config.max_per_sweep);

        let next_interval = config.next_interval(current_interval, reclaimed);
        if next_interval < current_interval {
            debug!(
                reclaimed,
                new_interval_ms = next_interval.as_millis(),
                "Sweep budget exhausted, speeding up reclaimer"
            );
        } else if next_interval > current_interval {
            trace!(
                new_interval_ms = next_interval.as_millis(),
                "Nothing to reclaim, slowing down reclaimer"
            );
        }
        current_interval = next_interval;

        if reclaimed > 0 {
            let keys_remaining = lock(&storage).len();
            debug!(reclaimed, keys_remaining, "Expired keys reclaimed");
        }
    }
}

/// Starts the expiry reclaimer with default configuration.
pub fn start_expiry_reclaimer<C>(storage: SharedStorage<C>) -> ExpiryReclaimer
where
    C: Clock + Send + 'static,
{
    ExpiryReclaimer::spawn(storage, ReclaimConfig::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use bytes::Bytes;
    use tokio_test::{assert_err, assert_ok};

    fn fast_config() -> ReclaimConfig {
        ReclaimConfig {
            base_interval: Duration::from_millis(10),
            min_interval: Duration::from_millis(5),
            max_interval: Duration::from_millis(20),
            max_per_sweep: 16,
        }
    }

    #[test]
    fn test_config_validation() {
        assert_ok!(ReclaimConfig::default().validate());
        assert_ok!(fast_config().validate());

        let zero_batch = ReclaimConfig {
            max_per_sweep: 0,
            ..Default::default()
        };
        assert_eq!(zero_batch.validate(), Err(ConfigError::ZeroBatch));

        let zero_interval = ReclaimConfig {
            min_interval: Duration::ZERO,
            ..Default::default()
        };
        assert_eq!(zero_interval.validate(), Err(ConfigError::ZeroInterval));

        let inverted = ReclaimConfig {
            base_interval: Duration::from_secs(5),
            ..Default::default()
        };
        assert_err!(inverted.validate());
    }

    #[test]
    fn test_next_interval_adapts() {
        let config = ReclaimConfig::default();
        let base = config.base_interval;

        assert_eq!(config.next_interval(base, 128), Duration::from_millis(50));
        assert_eq!(config.next_interval(base, 0), Duration::from_millis(200));
        assert_eq!(config.next_interval(base, 3), base);

        assert_eq!(
            config.next_interval(Duration::from_millis(12), 500),
            config.min_interval
        );
        assert_eq!(
            config.next_interval(Duration::from_millis(800), 0),
            config.max_interval
        );
    }

    #[test]
    fn test_reclaim_batch_respects_budget() {
        let clock = ManualClock::new();
        let storage = shared(KvStorage::new(clock.clone()));
        {
            let mut guard = lock(&storage);
            for i in 0..10 {
                guard.set(&format!("key{}", i), "v", 1);
            }
        }

        clock.advance(1);
        assert_eq!(reclaim_batch(&storage, 4), 4);
        assert_eq!(lock(&storage).len(), 6);
        assert_eq!(reclaim_batch(&storage, 100), 6);
        assert_eq!(reclaim_batch(&storage, 100), 0);
    }

    #[test]
    fn test_start_rejects_invalid_config() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let _guard = runtime.enter();

        let storage = shared(KvStorage::new(ManualClock::new()));
        let config = ReclaimConfig {
            max_per_sweep: 0,
            ..fast_config()
        };
        assert_eq!(
            ExpiryReclaimer::start(storage, config).unwrap_err(),
            ConfigError::ZeroBatch
        );
    }

    #[tokio::test]
    async fn test_reclaimer_cleans_expired_keys() {
        let clock = ManualClock::new();
        let storage = shared(KvStorage::new(clock.clone()));
        {
            let mut guard = lock(&storage);
            for i in 0..10 {
                guard.set(&format!("key{}", i), "value", 1);
            }
            guard.set("persistent", "value", 0);
            assert_eq!(guard.len(), 11);
        }

        let _reclaimer = ExpiryReclaimer::start(Arc::clone(&storage), fast_config()).unwrap();

        clock.advance(1);
        tokio::time::sleep(Duration::from_millis(200)).await;

        let guard = lock(&storage);
        assert_eq!(guard.len(), 1);
        assert_eq!(guard.get("persistent"), Some(Bytes::from("value")));
        assert_eq!(guard.stats().reclaimed, 10);
    }

    #[tokio::test]
    async fn test_reclaimer_stops_on_drop() {
        let clock = ManualClock::new();
        let storage = shared(KvStorage::new(clock.clone()));

        {
            let _reclaimer =
                ExpiryReclaimer::start(Arc::clone(&storage), fast_config()).unwrap();
            tokio::time::sleep(Duration::from_millis(30)).await;
            // Reclaimer is dropped here
        }

        lock(&storage).set("key", "value", 1);
        clock.advance(1);
        tokio::time::sleep(Duration::from_millis(100)).await;

        // Nothing reclaimed the record, but reads already hide it
        let guard = lock(&storage);
        assert_eq!(guard.len(), 1);
        assert_eq!(guard.get("key"), None);
    }

    #[tokio::test]
    async fn test_reclaimer_drains_more_than_one_budget() {
        let clock = ManualClock::new();
        let storage = shared(KvStorage::new(clock.clone()));
        {
            let mut guard = lock(&storage);
            for i in 0..200 {
                guard.set(&format!("key{}", i), "value", 1);
            }
        }

        let _reclaimer = start_expiry_reclaimer(Arc::clone(&storage));

        clock.advance(1);
        tokio::time::sleep(Duration::from_millis(600)).await;

        assert!(lock(&storage).is_empty());
    }
}
