/**
 * Store Connector
 *
 * The seam between the connection manager and the database driver. The
 * manager owns retry and state; a connector only knows how to open a link,
 * probe it, and close it.
 *
 * `PgConnector` is the production implementation on top of a sqlx
 * PostgreSQL pool.
 */

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

use crate::backend::error::StoreError;

/// Bounds applied when establishing the store link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOptions {
    pub url: String,
    /// Upper bound on establishing the link
    pub connect_timeout: Duration,
    /// Idle pooled sockets are closed after this long and reopened on demand
    pub idle_timeout: Duration,
    pub min_connections: u32,
    pub max_connections: u32,
}

/// Opens, probes, and closes links to the persistent store
#[async_trait]
pub trait StoreConnector: Send + Sync + 'static {
    type Handle: Clone + Send + Sync + 'static;

    async fn establish(&self, options: &StoreOptions) -> Result<Self::Handle, StoreError>;

    /// Lightweight liveness check against an established link
    async fn ping(&self, handle: &Self::Handle) -> Result<(), StoreError>;

    async fn close(&self, _handle: Self::Handle) {}
}

/// PostgreSQL connector backed by a sqlx pool
#[derive(Debug, Clone, Default)]
pub struct PgConnector;

#[async_trait]
impl StoreConnector for PgConnector {
    type Handle = PgPool;

    async fn establish(&self, options: &StoreOptions) -> Result<PgPool, StoreError> {
        let pool_options = PgPoolOptions::new()
            .min_connections(options.min_connections)
            .max_connections(options.max_connections)
            .acquire_timeout(options.connect_timeout)
            .idle_timeout(Some(options.idle_timeout));

        match tokio::time::timeout(options.connect_timeout, pool_options.connect(&options.url)).await {
            Ok(Ok(pool)) => Ok(pool),
            Ok(Err(e)) => Err(StoreError::connect(e.to_string())),
            Err(_) => Err(StoreError::Timeout {
                after: options.connect_timeout,
            }),
        }
    }

    async fn ping(&self, handle: &PgPool) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(handle)
            .await
            .map(|_| ())
            .map_err(|e| StoreError::ping(e.to_string()))
    }

    async fn close(&self, handle: PgPool) {
        handle.close().await;
    }
}
