/**
 * Persistent-Store Connection Manager
 *
 * Owns the single process-wide link to the persistent store and keeps it
 * alive.
 *
 * # Retry Policy
 *
 * - Initial connection: failed attempt `n` schedules attempt `n + 1` after
 *   `base_delay * n`. Once the counter exceeds `max_retries` the manager
 *   raises a fatal condition; the binary exits on it.
 * - After the link has been up once: a drop schedules a reconnect on the
 *   fixed `reconnect_delay`, and further failures keep retrying on that
 *   delay with no ceiling.
 *
 * # Drop Detection
 *
 * sqlx pools do not emit disconnect events, so `spawn_liveness_monitor`
 * probes the link periodically and feeds failures into `on_error` and
 * `on_dropped`.
 */

use async_trait::async_trait;
use futures_util::future::{BoxFuture, FutureExt};
use parking_lot::{Mutex, RwLock};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::backend::error::StoreError;
use crate::backend::store::backoff::{BackoffScheduler, ScheduledRetry};
use crate::backend::store::connector::{StoreConnector, StoreOptions};
use crate::backend::store::state::{FailureOutcome, StoreConnectionState, StorePhase};

/// Shortest interval the liveness monitor will probe at
pub const MIN_PROBE_INTERVAL: Duration = Duration::from_millis(100);

/// Retry parameters for the store link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub reconnect_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            base_delay: Duration::from_millis(2000),
            reconnect_delay: Duration::from_millis(2000),
        }
    }
}

/// Readiness surface consumed by the health check
#[async_trait]
pub trait StoreHealth: Send + Sync {
    fn is_ready(&self) -> bool;

    async fn probe(&self) -> Result<(), StoreError>;
}

struct Inner<C: StoreConnector> {
    connector: C,
    options: StoreOptions,
    policy: RetryPolicy,
    scheduler: BackoffScheduler,
    state: Mutex<StoreConnectionState>,
    handle: RwLock<Option<C::Handle>>,
    pending: Mutex<Option<ScheduledRetry>>,
    monitor: Mutex<Option<JoinHandle<()>>>,
    fatal: watch::Sender<Option<StoreError>>,
}

/// Resilient connection manager for the persistent store
///
/// Cheap to clone; all clones share one state machine.
pub struct StoreConnectionManager<C: StoreConnector> {
    inner: Arc<Inner<C>>,
}

impl<C: StoreConnector> Clone for StoreConnectionManager<C> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<C: StoreConnector> StoreConnectionManager<C> {
    pub fn new(connector: C, options: StoreOptions, policy: RetryPolicy) -> Self {
        let (fatal, _) = watch::channel(None);
        Self {
            inner: Arc::new(Inner {
                connector,
                options,
                scheduler: BackoffScheduler::new(policy.base_delay),
                policy,
                state: Mutex::new(StoreConnectionState::new()),
                handle: RwLock::new(None),
                pending: Mutex::new(None),
                monitor: Mutex::new(None),
                fatal,
            }),
        }
    }

    /// Establish the store link
    ///
    /// A no-op when the link is already up or an attempt is in flight. A
    /// failed attempt schedules its own retry and still returns `Ok`; only
    /// exceeding the initial retry ceiling returns an error, which is also
    /// published through [`fatal`](Self::fatal).
    pub fn connect(&self) -> BoxFuture<'static, Result<(), StoreError>> {
        let manager = self.clone();
        async move { manager.attempt().await }.boxed()
    }

    async fn attempt(&self) -> Result<(), StoreError> {
        if !self.inner.state.lock().begin_connect() {
            tracing::debug!("[Store] Already connected or connecting, skipping attempt");
            return Ok(());
        }

        tracing::info!("[Store] Connecting to persistent store...");

        let err = match self.inner.connector.establish(&self.inner.options).await {
            Ok(handle) => {
                *self.inner.handle.write() = Some(handle);
                self.inner.state.lock().on_connected();
                tracing::info!("[Store] Connected to persistent store");
                return Ok(());
            }
            Err(err) => err,
        };

        let outcome = self.inner.state.lock().on_failure(self.inner.policy.max_retries);
        match outcome {
            FailureOutcome::Retry { attempt } => {
                let retry = self.inner.scheduler.schedule(attempt, self.retry_action());
                tracing::warn!(
                    attempt,
                    max_retries = self.inner.policy.max_retries,
                    delay_ms = retry.delay().as_millis() as u64,
                    error = %err,
                    "[Store] Connection failed, retrying"
                );
                self.set_pending(retry);
                Ok(())
            }
            FailureOutcome::Reconnect => {
                let retry = BackoffScheduler::schedule_after(
                    self.inner.policy.reconnect_delay,
                    self.retry_action(),
                );
                tracing::warn!(
                    delay_ms = retry.delay().as_millis() as u64,
                    error = %err,
                    "[Store] Reconnect failed, trying again"
                );
                self.set_pending(retry);
                Ok(())
            }
            FailureOutcome::Fatal { retries } => {
                let fatal = StoreError::RetriesExhausted {
                    retries,
                    message: err.to_string(),
                };
                tracing::error!(error = %fatal, "[Store] Connection failed after retries");
                self.inner.fatal.send_replace(Some(fatal.clone()));
                Err(fatal)
            }
        }
    }

    fn retry_action(&self) -> impl FnOnce() -> BoxFuture<'static, ()> + Send + 'static {
        let manager = self.clone();
        move || {
            async move {
                // Failures are logged and rescheduled inside the attempt.
                let _ = manager.connect().await;
            }
            .boxed()
        }
    }

    fn set_pending(&self, retry: ScheduledRetry) {
        if let Some(previous) = self.inner.pending.lock().replace(retry) {
            if !previous.is_finished() {
                previous.cancel();
            }
        }
    }

    /// The driver reported that an established link went away
    pub fn on_dropped(&self) {
        if !self.inner.state.lock().on_dropped() {
            tracing::debug!("[Store] Drop reported while not connected, ignoring");
            return;
        }

        if let Some(handle) = self.inner.handle.write().take() {
            let manager = self.clone();
            tokio::spawn(async move {
                manager.inner.connector.close(handle).await;
            });
        }

        let delay = self.inner.policy.reconnect_delay;
        tracing::warn!(
            delay_ms = delay.as_millis() as u64,
            "[Store] Persistent store disconnected, attempting reconnect"
        );
        let retry = BackoffScheduler::schedule_after(delay, self.retry_action());
        self.set_pending(retry);
    }

    /// The driver reported an error; a fatal one is followed by `on_dropped`
    pub fn on_error(&self, err: &StoreError) {
        tracing::error!(error = %err, "[Store] Persistent store error");
    }

    pub fn is_ready(&self) -> bool {
        self.inner.state.lock().is_ready()
    }

    pub fn phase(&self) -> StorePhase {
        self.inner.state.lock().phase()
    }

    pub fn retries(&self) -> u32 {
        self.inner.state.lock().retries()
    }

    /// The established link, if any
    pub fn handle(&self) -> Option<C::Handle> {
        self.inner.handle.read().clone()
    }

    /// Probe the established link
    pub async fn probe(&self) -> Result<(), StoreError> {
        let handle = self.handle().ok_or(StoreError::NotReady)?;
        self.inner.connector.ping(&handle).await
    }

    /// Resolves once the initial connection has been given up on
    pub async fn fatal(&self) -> StoreError {
        let mut rx = self.inner.fatal.subscribe();
        loop {
            if let Some(err) = rx.borrow_and_update().clone() {
                return err;
            }
            if rx.changed().await.is_err() {
                return std::future::pending().await;
            }
        }
    }

    /// Probe the link every `interval` while connected and report failures
    /// as a drop
    ///
    /// Intervals below [`MIN_PROBE_INTERVAL`] are raised to it.
    pub fn spawn_liveness_monitor(&self, interval: Duration) {
        if interval < MIN_PROBE_INTERVAL {
            tracing::warn!(
                requested_ms = interval.as_millis() as u64,
                "[Store] Probe interval too short, using {}ms",
                MIN_PROBE_INTERVAL.as_millis()
            );
        }
        let interval = interval.max(MIN_PROBE_INTERVAL);
        let weak: Weak<Inner<C>> = Arc::downgrade(&self.inner);

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                let manager = StoreConnectionManager { inner };
                if !manager.is_ready() {
                    continue;
                }
                if let Err(err) = manager.probe().await {
                    manager.on_error(&err);
                    manager.on_dropped();
                }
            }
        });

        if let Some(previous) = self.inner.monitor.lock().replace(task) {
            previous.abort();
        }
    }

    /// Cancel any pending retry and stop the liveness monitor
    pub fn shutdown(&self) {
        if let Some(retry) = self.inner.pending.lock().take() {
            retry.cancel();
        }
        if let Some(monitor) = self.inner.monitor.lock().take() {
            monitor.abort();
        }
        tracing::info!("[Store] Connection manager shut down");
    }
}

#[async_trait]
impl<C: StoreConnector> StoreHealth for StoreConnectionManager<C> {
    fn is_ready(&self) -> bool {
        StoreConnectionManager::is_ready(self)
    }

    async fn probe(&self) -> Result<(), StoreError> {
        StoreConnectionManager::probe(self).await
    }
}
