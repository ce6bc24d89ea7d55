/**
 * Server Configuration
 *
 * Turns the flat `AppConfig` into the typed settings the backend components
 * take: store connection bounds, the retry policy, and the CORS layer.
 */

use axum::http::{header, HeaderValue, Method};
use tower_http::cors::CorsLayer;

use crate::backend::store::{RetryPolicy, StoreOptions};
use crate::shared::{AppConfig, ConfigError};

/// Store connection bounds from configuration
pub fn store_options(config: &AppConfig) -> StoreOptions {
    StoreOptions {
        url: config.database_url.clone(),
        connect_timeout: config.connect_timeout,
        idle_timeout: config.idle_timeout,
        min_connections: config.min_pool,
        max_connections: config.max_pool,
    }
}

/// Store retry policy from configuration
pub fn retry_policy(config: &AppConfig) -> RetryPolicy {
    RetryPolicy {
        max_retries: config.max_retries,
        base_delay: config.retry_base,
        reconnect_delay: config.reconnect_delay,
    }
}

/// CORS restricted to the configured client origin, with credentials
pub fn cors_layer(config: &AppConfig) -> Result<CorsLayer, ConfigError> {
    let origin = HeaderValue::from_str(&config.client_url).map_err(|_| ConfigError::InvalidValue {
        key: "CLIENT_URL",
        value: config.client_url.clone(),
    })?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]))
}
