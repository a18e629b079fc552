//! Login throttling for brute force mitigation.
//!
//! [`LoginGuard`] wraps a credential check with per-identity failure
//! bookkeeping:
//!
//! - an identity with fewer than `max_failed_attempts` consecutive failures
//!   goes straight to the credential check
//! - once the limit is reached, attempts fail with
//!   [`AuthError::TooManyAttempts`] without running the check, until
//!   `lockout_period` has passed since the last failure
//! - the first attempt after the lockout period starts from a clear record
//! - a successful check clears the record from any state
//!
//! The whole read-check-write sequence runs under the identity's lease from
//! the [`AttemptStore`], so concurrent attempts for the same identity are
//! serialized while different identities proceed in parallel. Expiry is
//! evaluated lazily on the next attempt; there is no timer per identity.
//!
//! # Example
//!
//! ```rust,ignore
//! let guard = LoginGuard::new(store, Arc::new(SystemClock), LoginGuardConfig::default());
//!
//! let user = guard
//!     .attempt_login("user@example.com", || passwords.verify("user@example.com", "hunter2"))
//!     .await?;
//! ```

use std::{future::Future, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::{
    Error,
    clock::Clock,
    error::{AuthError, ValidationError},
    repositories::{AttemptRecord, AttemptStore},
};

/// How often the background task sweeps the attempt store
pub const EVICTION_INTERVAL: std::time::Duration = std::time::Duration::from_secs(600);

#[derive(Debug, Clone)]
pub struct LoginGuardConfig {
    /// When false every attempt goes straight to the credential check
    pub enabled: bool,
    /// Consecutive failures that lock an identity
    pub max_failed_attempts: u32,
    /// How long a locked identity stays locked after its last failure
    pub lockout_period: Duration,
}

impl Default for LoginGuardConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_failed_attempts: 5,
            lockout_period: Duration::minutes(30),
        }
    }
}

impl LoginGuardConfig {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    pub fn with_max_failed_attempts(mut self, max_failed_attempts: u32) -> Self {
        self.max_failed_attempts = max_failed_attempts.max(1);
        self
    }

    pub fn with_lockout_period(mut self, lockout_period: Duration) -> Self {
        self.lockout_period = lockout_period;
        self
    }
}

/// Read-only view of an identity's throttling state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LockoutStatus {
    pub identity: String,
    pub failed_attempts: u32,
    pub is_locked: bool,
    pub locked_until: Option<DateTime<Utc>>,
}

impl LockoutStatus {
    /// Seconds until the lock expires, rounded up, or `None` if not locked.
    pub fn retry_after_seconds(&self, now: DateTime<Utc>) -> Option<u64> {
        self.locked_until.map(|until| retry_after(until - now))
    }
}

/// Something that can check a secret for an identity.
///
/// `Ok(None)` means the secret was wrong and counts toward the lockout.
/// Errors are passed through untouched and never counted.
#[async_trait]
pub trait CredentialVerifier: Send + Sync + 'static {
    type Principal: Send;

    async fn verify(&self, identity: &str, secret: &str)
    -> Result<Option<Self::Principal>, Error>;
}

fn retry_after(remaining: Duration) -> u64 {
    let millis = remaining.num_milliseconds().max(0) as u64;
    millis.div_ceil(1000).max(1)
}

pub struct LoginGuard<S: AttemptStore> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    config: LoginGuardConfig,
}

impl<S: AttemptStore> LoginGuard<S> {
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>, config: LoginGuardConfig) -> Self {
        Self {
            store,
            clock,
            config,
        }
    }

    pub fn config(&self) -> &LoginGuardConfig {
        &self.config
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Run `check` for `identity` unless the identity is locked out.
    ///
    /// `check` resolves to `Ok(Some(payload))` on success and `Ok(None)` when
    /// the credentials are wrong. Any `Err` from `check` is returned as is
    /// and leaves the failure count alone.
    ///
    /// # Errors
    ///
    /// - [`AuthError::TooManyAttempts`] while the identity is locked
    /// - [`AuthError::InvalidCredentials`] when `check` reports a wrong secret
    /// - [`ValidationError::MissingField`] for an empty identity
    pub async fn attempt_login<T, F, Fut>(&self, identity: &str, check: F) -> Result<T, Error>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<Option<T>, Error>> + Send,
        T: Send,
    {
        if identity.is_empty() {
            return Err(ValidationError::MissingField("Email is required".to_string()).into());
        }

        if !self.config.enabled {
            return check()
                .await?
                .ok_or(Error::Auth(AuthError::InvalidCredentials));
        }

        let mut record = self.store.acquire(identity).await?;

        if record.failure_count >= self.config.max_failed_attempts {
            let locked_since = record.last_failure_at.unwrap_or(DateTime::UNIX_EPOCH);
            let elapsed = self.clock.now() - locked_since;

            if elapsed < self.config.lockout_period {
                let retry_after = retry_after(self.config.lockout_period - elapsed);
                tracing::debug!(
                    identity,
                    retry_after,
                    "Rejected login attempt for locked identity"
                );
                return Err(AuthError::TooManyAttempts { retry_after }.into());
            }

            tracing::info!(identity, "Lockout expired, clearing failed attempts");
            record.reset();
        }

        match check().await? {
            Some(payload) => {
                record.reset();
                Ok(payload)
            }
            None => {
                record.record_failure(self.clock.now());
                let failed_attempts = record.failure_count;

                if failed_attempts >= self.config.max_failed_attempts {
                    tracing::warn!(
                        identity,
                        failed_attempts,
                        lockout_minutes = self.config.lockout_period.num_minutes(),
                        "Identity locked after too many failed login attempts"
                    );
                } else {
                    tracing::debug!(identity, failed_attempts, "Failed login attempt");
                }

                Err(AuthError::InvalidCredentials.into())
            }
        }
    }

    /// [`attempt_login`](Self::attempt_login) with a [`CredentialVerifier`].
    pub async fn attempt_login_with<V>(
        &self,
        verifier: &V,
        identity: &str,
        secret: &str,
    ) -> Result<V::Principal, Error>
    where
        V: CredentialVerifier,
    {
        self.attempt_login(identity, || verifier.verify(identity, secret))
            .await
    }

    /// Current throttling state of `identity`.
    ///
    /// An expired lock is reported as unlocked even though the stored count
    /// is only cleared by the next attempt.
    pub async fn lockout_status(&self, identity: &str) -> Result<LockoutStatus, Error> {
        if !self.config.enabled {
            return Ok(LockoutStatus {
                identity: identity.to_string(),
                failed_attempts: 0,
                is_locked: false,
                locked_until: None,
            });
        }

        let record = self.store.peek(identity).await?.unwrap_or_default();
        Ok(self.status_of(identity, &record))
    }

    /// Clear the record for `identity` regardless of its state.
    ///
    /// Returns `true` if the identity was locked.
    pub async fn unlock(&self, identity: &str) -> Result<bool, Error> {
        let was_locked = self
            .store
            .remove(identity)
            .await?
            .is_some_and(|record| self.status_of(identity, &record).is_locked);

        if was_locked {
            tracing::info!(identity, "Identity unlocked");
        }

        Ok(was_locked)
    }

    /// Spawn a task that sweeps the attempt store every [`EVICTION_INTERVAL`]
    /// until `shutdown` changes.
    pub fn start_eviction_task(
        &self,
        mut shutdown: tokio::sync::watch::Receiver<bool>,
    ) -> tokio::task::JoinHandle<()> {
        let store = Arc::clone(&self.store);
        let clock = Arc::clone(&self.clock);

        tokio::spawn(async move {
            let mut interval_timer = tokio::time::interval(EVICTION_INTERVAL);

            loop {
                tokio::select! {
                    _ = interval_timer.tick() => {
                        match store.evict_idle(clock.now()).await {
                            Ok(count) if count > 0 => {
                                tracing::info!(count, "Evicted idle login attempt records");
                            }
                            Err(e) => {
                                tracing::warn!(error = %e, "Failed to evict login attempt records");
                            }
                            _ => {}
                        }
                    }
                    _ = shutdown.changed() => {
                        tracing::info!("Shutting down login attempt eviction task");
                        break;
                    }
                }
            }
        })
    }

    fn status_of(&self, identity: &str, record: &AttemptRecord) -> LockoutStatus {
        let locked_until = (record.failure_count >= self.config.max_failed_attempts)
            .then(|| {
                record
                    .last_failure_at
                    .map(|at| at + self.config.lockout_period)
            })
            .flatten()
            .filter(|until| *until > self.clock.now());

        LockoutStatus {
            identity: identity.to_string(),
            failed_attempts: record.failure_count,
            is_locked: locked_until.is_some(),
            locked_until,
        }
    }
}
