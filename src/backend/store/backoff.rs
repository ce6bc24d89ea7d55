//! # Backoff Scheduler
//!
//! Schedules one delayed invocation of a retry action without blocking the
//! caller. Attempt `n` (starting at 1) waits `base_delay * n`.
//!
//! Timers run on tokio's clock, so tests can pause time and advance it
//! deterministically instead of sleeping.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use chatpulse::backend::store::BackoffScheduler;
//! use std::time::Duration;
//!
//! # async fn example() {
//! let scheduler = BackoffScheduler::new(Duration::from_millis(2000));
//! let retry = scheduler.schedule(3, || async {
//!     // runs after 6000ms
//! });
//! retry.cancel();
//! # }
//! ```

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

/// Linear backoff on top of a fixed base delay
#[derive(Debug, Clone)]
pub struct BackoffScheduler {
    base_delay: Duration,
}

impl BackoffScheduler {
    pub fn new(base_delay: Duration) -> Self {
        Self { base_delay }
    }

    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// Delay before attempt `attempt`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }

    /// Run `action` once after the delay for `attempt`
    pub fn schedule<F, Fut>(&self, attempt: u32, action: F) -> ScheduledRetry
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self::schedule_after(self.delay_for(attempt), action)
    }

    /// Run `action` once after a fixed delay
    pub fn schedule_after<F, Fut>(delay: Duration, action: F) -> ScheduledRetry
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let cancelled = Arc::new(Notify::new());
        let signal = cancelled.clone();

        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(delay) => action().await,
                _ = signal.notified() => {
                    tracing::debug!("[Store] Scheduled retry cancelled");
                }
            }
        });

        ScheduledRetry {
            delay,
            cancelled,
            handle,
        }
    }
}

/// Handle to a pending retry
///
/// Cancelling only prevents the action from starting; an action that is
/// already running completes normally.
#[derive(Debug)]
pub struct ScheduledRetry {
    delay: Duration,
    cancelled: Arc<Notify>,
    handle: JoinHandle<()>,
}

impl ScheduledRetry {
    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn cancel(&self) {
        self.cancelled.notify_one();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}
