//! Storage interface for login attempt bookkeeping.
//!
//! The login guard never touches an [`AttemptRecord`] without holding its
//! lease, so a store implementation only has to make [`AttemptStore::acquire`]
//! exclusive per identity. Leases for different identities must not block
//! each other.

use std::ops::DerefMut;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::Error;

/// Failure history for one identity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttemptRecord {
    /// Consecutive failed verifications since the last reset
    pub failure_count: u32,
    /// When the most recent counted failure happened
    pub last_failure_at: Option<DateTime<Utc>>,
}

impl AttemptRecord {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn record_failure(&mut self, at: DateTime<Utc>) {
        self.failure_count = self.failure_count.saturating_add(1);
        self.last_failure_at = Some(at);
    }

    pub fn is_clear(&self) -> bool {
        self.failure_count == 0
    }
}

/// Per-identity attempt records with exclusive leases.
#[async_trait]
pub trait AttemptStore: Send + Sync + 'static {
    /// Exclusive access to one identity's record, released on drop.
    type Lease: DerefMut<Target = AttemptRecord> + Send;

    /// Wait for and take the lease on `identity`, creating a clear record if none exists.
    async fn acquire(&self, identity: &str) -> Result<Self::Lease, Error>;

    /// Snapshot the record for `identity`, waiting for any in-flight attempt to finish.
    async fn peek(&self, identity: &str) -> Result<Option<AttemptRecord>, Error>;

    /// Drop the record for `identity`, returning what it held.
    async fn remove(&self, identity: &str) -> Result<Option<AttemptRecord>, Error>;

    /// Remove entries that no longer carry useful state as of `now`.
    async fn evict_idle(&self, now: DateTime<Utc>) -> Result<usize, Error>;

    /// Number of identities currently tracked
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
