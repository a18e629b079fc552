//! Process-local attempt store with per-identity locking and bounded size.
//!
//! Each identity maps to its own `tokio::sync::Mutex`, so a lease on one
//! identity never blocks another. The map itself is a [`DashMap`]; its shard
//! locks are only held for the lookup, never across an `.await`.
//!
//! # Eviction
//!
//! Entries are removed by [`InMemoryAttemptStore::evict_idle`] when they are
//! not leased and either hold a clear record or have not been touched for
//! `idle_ttl`. When the table is full, inserting a new identity first sweeps,
//! then drops the least recently touched entries whose last failure is older
//! than `failure_retention`. Entries that are still inside that window are
//! never evicted under pressure; the table grows past `max_entries` instead.
//!
//! A removed slot is marked retired while its mutex is held. A task that
//! cloned the slot before removal sees the flag after locking and retries
//! against the live map, so no update lands on a detached record.

use std::{
    ops::{Deref, DerefMut},
    sync::Arc,
};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::{
    Error,
    clock::Clock,
    repositories::{AttemptRecord, AttemptStore},
};

#[derive(Debug, Clone)]
pub struct AttemptStoreConfig {
    /// Soft cap on tracked identities
    pub max_entries: usize,
    /// Untouched entries older than this are dropped by the sweep
    pub idle_ttl: Duration,
    /// Entries with a failure newer than this survive capacity pressure
    pub failure_retention: Duration,
}

impl Default for AttemptStoreConfig {
    fn default() -> Self {
        Self {
            max_entries: 100_000,
            idle_ttl: Duration::hours(24),
            failure_retention: Duration::minutes(30),
        }
    }
}

impl AttemptStoreConfig {
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries.max(1);
        self
    }

    pub fn with_idle_ttl(mut self, idle_ttl: Duration) -> Self {
        self.idle_ttl = idle_ttl;
        self
    }

    pub fn with_failure_retention(mut self, failure_retention: Duration) -> Self {
        self.failure_retention = failure_retention;
        self
    }
}

#[derive(Debug)]
struct Slot {
    record: AttemptRecord,
    last_touched: DateTime<Utc>,
    retired: bool,
}

impl Slot {
    fn new(now: DateTime<Utc>) -> Self {
        Self {
            record: AttemptRecord::default(),
            last_touched: now,
            retired: false,
        }
    }

    fn failure_is_recent(&self, now: DateTime<Utc>, retention: Duration) -> bool {
        self.record
            .last_failure_at
            .is_some_and(|at| now - at < retention)
    }
}

/// Exclusive handle on one identity's [`AttemptRecord`].
pub struct AttemptLease {
    guard: OwnedMutexGuard<Slot>,
}

impl Deref for AttemptLease {
    type Target = AttemptRecord;

    fn deref(&self) -> &Self::Target {
        &self.guard.record
    }
}

impl DerefMut for AttemptLease {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.guard.record
    }
}

pub struct InMemoryAttemptStore {
    slots: DashMap<String, Arc<Mutex<Slot>>>,
    clock: Arc<dyn Clock>,
    config: AttemptStoreConfig,
}

impl InMemoryAttemptStore {
    pub fn new(config: AttemptStoreConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            slots: DashMap::new(),
            clock,
            config,
        }
    }

    pub fn config(&self) -> &AttemptStoreConfig {
        &self.config
    }

    fn slot_for(&self, identity: &str) -> Arc<Mutex<Slot>> {
        if let Some(slot) = self.slots.get(identity) {
            return slot.clone();
        }

        if self.slots.len() >= self.config.max_entries {
            self.make_room();
        }

        let now = self.clock.now();
        self.slots
            .entry(identity.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(Slot::new(now))))
            .clone()
    }

    fn sweep(&self, now: DateTime<Utc>) -> usize {
        let idle_ttl = self.config.idle_ttl;
        let mut removed = 0;

        self.slots.retain(|_, slot| {
            // Leased entries are in use.
            let Ok(mut slot) = slot.try_lock() else {
                return true;
            };
            if slot.record.is_clear() || now - slot.last_touched >= idle_ttl {
                slot.retired = true;
                removed += 1;
                false
            } else {
                true
            }
        });

        removed
    }

    fn make_room(&self) {
        let now = self.clock.now();
        let swept = self.sweep(now);

        let len = self.slots.len();
        if len < self.config.max_entries {
            tracing::debug!(swept, "Attempt table swept under capacity pressure");
            return;
        }

        let retention = self.config.failure_retention;
        let mut candidates: Vec<(String, DateTime<Utc>)> = self
            .slots
            .iter()
            .filter_map(|entry| {
                let slot = entry.value().try_lock().ok()?;
                (!slot.failure_is_recent(now, retention))
                    .then(|| (entry.key().clone(), slot.last_touched))
            })
            .collect();
        candidates.sort_by_key(|(_, last_touched)| *last_touched);

        let mut excess = len + 1 - self.config.max_entries;
        for (identity, _) in candidates {
            if excess == 0 {
                break;
            }
            let evicted = self.slots.remove_if(&identity, |_, slot| {
                let Ok(mut slot) = slot.try_lock() else {
                    return false;
                };
                if slot.failure_is_recent(now, retention) {
                    return false;
                }
                slot.retired = true;
                true
            });
            if evicted.is_some() {
                excess -= 1;
            }
        }

        if excess > 0 {
            tracing::warn!(
                tracked = self.slots.len(),
                max_entries = self.config.max_entries,
                "Attempt table is full of recently failed identities, growing past its cap"
            );
        }
    }
}

#[async_trait]
impl AttemptStore for InMemoryAttemptStore {
    type Lease = AttemptLease;

    async fn acquire(&self, identity: &str) -> Result<AttemptLease, Error> {
        loop {
            let mut guard = self.slot_for(identity).lock_owned().await;
            if guard.retired {
                continue;
            }
            guard.last_touched = self.clock.now();
            return Ok(AttemptLease { guard });
        }
    }

    async fn peek(&self, identity: &str) -> Result<Option<AttemptRecord>, Error> {
        loop {
            let Some(slot) = self.slots.get(identity).map(|slot| slot.clone()) else {
                return Ok(None);
            };
            let slot = slot.lock().await;
            if !slot.retired {
                return Ok(Some(slot.record));
            }
        }
    }

    async fn remove(&self, identity: &str) -> Result<Option<AttemptRecord>, Error> {
        loop {
            let Some(slot) = self.slots.get(identity).map(|slot| slot.clone()) else {
                return Ok(None);
            };
            let mut guard = slot.lock().await;
            if guard.retired {
                continue;
            }
            guard.retired = true;
            let record = guard.record;
            drop(guard);
            self.slots
                .remove_if(identity, |_, current| Arc::ptr_eq(current, &slot));
            return Ok(Some(record));
        }
    }

    async fn evict_idle(&self, now: DateTime<Utc>) -> Result<usize, Error> {
        Ok(self.sweep(now))
    }

    fn len(&self) -> usize {
        self.slots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn store_with(config: AttemptStoreConfig) -> (InMemoryAttemptStore, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        (InMemoryAttemptStore::new(config, clock.clone()), clock)
    }

    async fn fail(store: &InMemoryAttemptStore, clock: &ManualClock, identity: &str) {
        let mut lease = store.acquire(identity).await.unwrap();
        lease.record_failure(clock.now());
    }

    #[tokio::test]
    async fn test_acquire_creates_clear_record() {
        let (store, _) = store_with(AttemptStoreConfig::default());
        let lease = store.acquire("a@x.com").await.unwrap();
        assert!(lease.is_clear());
        drop(lease);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_lease_writes_are_visible() {
        let (store, clock) = store_with(AttemptStoreConfig::default());
        fail(&store, &clock, "a@x.com").await;
        fail(&store, &clock, "a@x.com").await;

        let record = store.peek("a@x.com").await.unwrap().unwrap();
        assert_eq!(record.failure_count, 2);
        assert!(store.peek("b@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_sweep_drops_clear_and_idle_entries() {
        let config = AttemptStoreConfig::default().with_idle_ttl(Duration::hours(1));
        let (store, clock) = store_with(config);

        drop(store.acquire("clear@x.com").await.unwrap());
        fail(&store, &clock, "failed@x.com").await;

        assert_eq!(store.evict_idle(clock.now()).await.unwrap(), 1);
        assert!(store.peek("failed@x.com").await.unwrap().is_some());

        clock.advance(Duration::hours(2));
        assert_eq!(store.evict_idle(clock.now()).await.unwrap(), 1);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_sweep_keeps_leased_entries() {
        let (store, clock) = store_with(AttemptStoreConfig::default());
        let lease = store.acquire("busy@x.com").await.unwrap();

        assert_eq!(store.evict_idle(clock.now()).await.unwrap(), 0);
        assert_eq!(store.len(), 1);
        drop(lease);
    }

    #[tokio::test]
    async fn test_retired_slot_is_retried() {
        let (store, clock) = store_with(AttemptStoreConfig::default());
        fail(&store, &clock, "a@x.com").await;

        // Simulate a task that looked the slot up before it was removed.
        let stale = store.slot_for("a@x.com");
        store.remove("a@x.com").await.unwrap();
        assert!(stale.lock().await.retired);

        let lease = store.acquire("a@x.com").await.unwrap();
        assert!(lease.is_clear());
    }

    #[tokio::test]
    async fn test_capacity_evicts_oldest_stale_entries() {
        let config = AttemptStoreConfig::default()
            .with_max_entries(2)
            .with_failure_retention(Duration::minutes(30));
        let (store, clock) = store_with(config);

        fail(&store, &clock, "old@x.com").await;
        clock.advance(Duration::minutes(40));
        fail(&store, &clock, "stale@x.com").await;
        clock.advance(Duration::minutes(40));

        drop(store.acquire("new@x.com").await.unwrap());

        assert_eq!(store.len(), 2);
        assert!(store.peek("old@x.com").await.unwrap().is_none());
        assert!(store.peek("stale@x.com").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_capacity_never_evicts_recent_failures() {
        let config = AttemptStoreConfig::default().with_max_entries(2);
        let (store, clock) = store_with(config);

        fail(&store, &clock, "one@x.com").await;
        fail(&store, &clock, "two@x.com").await;
        drop(store.acquire("three@x.com").await.unwrap());

        assert_eq!(store.len(), 3);
        assert_eq!(
            store.peek("one@x.com").await.unwrap().unwrap().failure_count,
            1
        );
    }

    #[tokio::test]
    async fn test_remove_returns_record() {
        let (store, clock) = store_with(AttemptStoreConfig::default());
        fail(&store, &clock, "a@x.com").await;

        let removed = store.remove("a@x.com").await.unwrap().unwrap();
        assert_eq!(removed.failure_count, 1);
        assert!(store.remove("a@x.com").await.unwrap().is_none());
        assert!(store.is_empty());
    }
}
