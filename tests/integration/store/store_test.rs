//! Store connection manager integration tests
//!
//! Run on tokio's paused clock so the retry schedule is observed exactly.

use async_trait::async_trait;
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use chatpulse::backend::error::StoreError;
use chatpulse::backend::store::{
    RetryPolicy, StoreConnectionManager, StoreConnector, StoreOptions, StorePhase,
};

/// Replays a fixed script of attempt results, succeeding once it runs out
#[derive(Clone, Default)]
struct ScriptedConnector {
    script: Arc<Mutex<VecDeque<bool>>>,
    attempts: Arc<Mutex<Vec<Instant>>>,
}

impl ScriptedConnector {
    fn new(script: impl IntoIterator<Item = bool>) -> Self {
        Self {
            script: Arc::new(Mutex::new(script.into_iter().collect())),
            attempts: Arc::default(),
        }
    }

    fn push(&self, results: impl IntoIterator<Item = bool>) {
        self.script.lock().extend(results);
    }

    fn attempt_count(&self) -> usize {
        self.attempts.lock().len()
    }

    /// Milliseconds between consecutive attempts
    fn gaps_ms(&self, from: usize) -> Vec<u128> {
        let attempts = self.attempts.lock();
        attempts[from..]
            .windows(2)
            .map(|pair| (pair[1] - pair[0]).as_millis())
            .collect()
    }
}

#[async_trait]
impl StoreConnector for ScriptedConnector {
    type Handle = ();

    async fn establish(&self, _options: &StoreOptions) -> Result<(), StoreError> {
        self.attempts.lock().push(Instant::now());
        let ok = self.script.lock().pop_front().unwrap_or(true);
        if ok {
            Ok(())
        } else {
            Err(StoreError::connect("connection refused"))
        }
    }

    async fn ping(&self, _handle: &()) -> Result<(), StoreError> {
        Ok(())
    }
}

fn options() -> StoreOptions {
    StoreOptions {
        url: "postgres://localhost/chat".to_string(),
        connect_timeout: Duration::from_secs(30),
        idle_timeout: Duration::from_secs(30),
        min_connections: 10,
        max_connections: 50,
    }
}

async fn wait_until_ready(manager: &StoreConnectionManager<ScriptedConnector>) {
    while !manager.is_ready() {
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}

#[tokio::test(start_paused = true)]
async fn test_initial_retries_back_off_linearly_then_fatal() {
    let connector = ScriptedConnector::new(std::iter::repeat(false).take(100));
    let manager = StoreConnectionManager::new(connector.clone(), options(), RetryPolicy::default());

    manager.connect().await.unwrap();
    let fatal = manager.fatal().await;

    assert!(matches!(fatal, StoreError::RetriesExhausted { retries: 5, .. }));
    assert_eq!(connector.attempt_count(), 6);
    assert_eq!(connector.gaps_ms(0), vec![2000, 4000, 6000, 8000, 10000]);
    assert_eq!(manager.phase(), StorePhase::Disconnected);

    // Nothing else is scheduled after the fatal condition
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(connector.attempt_count(), 6);
}

#[tokio::test(start_paused = true)]
async fn test_recovery_before_limit_resets_counter() {
    let connector = ScriptedConnector::new([false, false, false, true]);
    let manager = StoreConnectionManager::new(connector.clone(), options(), RetryPolicy::default());

    manager.connect().await.unwrap();
    wait_until_ready(&manager).await;

    assert_eq!(connector.gaps_ms(0), vec![2000, 4000, 6000]);
    assert_eq!(manager.retries(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_reconnect_after_drop_never_gives_up() {
    let connector = ScriptedConnector::new([true]);
    let manager = StoreConnectionManager::new(connector.clone(), options(), RetryPolicy::default());

    manager.connect().await.unwrap();
    assert!(manager.is_ready());

    // More consecutive failures than the initial limit allows
    connector.push(std::iter::repeat(false).take(8));
    manager.on_dropped();
    assert!(!manager.is_ready());

    wait_until_ready(&manager).await;

    assert_eq!(connector.attempt_count(), 10);
    assert!(connector.gaps_ms(1).iter().all(|gap| *gap == 2000));
    assert!(tokio::time::timeout(Duration::from_secs(1), manager.fatal())
        .await
        .is_err());
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_cancels_pending_retry() {
    let connector = ScriptedConnector::new([false]);
    let manager = StoreConnectionManager::new(connector.clone(), options(), RetryPolicy::default());

    manager.connect().await.unwrap();
    manager.shutdown();

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(connector.attempt_count(), 1);
    assert!(!manager.is_ready());
}
