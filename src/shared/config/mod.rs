//! Application configuration module
//!
//! Server, CORS, and persistent-store settings. Values come from the process
//! environment (after `.env` is loaded by the binary) or from the builder in
//! tests.
//!
//! | Variable                   | Default                 |
//! |----------------------------|-------------------------|
//! | `SERVER_PORT`              | `8080`                  |
//! | `CLIENT_URL`               | `http://localhost:5173` |
//! | `DATABASE_URL`             | required                |
//! | `STORE_CONNECT_TIMEOUT_MS` | `30000`                 |
//! | `STORE_IDLE_TIMEOUT_MS`    | `30000`                 |
//! | `STORE_MIN_POOL`           | `10`                    |
//! | `STORE_MAX_POOL`           | `50`                    |
//! | `STORE_MAX_RETRIES`        | `5`                     |
//! | `STORE_RETRY_BASE_MS`      | `2000`                  |
//! | `STORE_RECONNECT_DELAY_MS` | `2000`                  |
//! | `STORE_PROBE_INTERVAL_MS`  | `15000`                 |

use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_SERVER_PORT: u16 = 8080;
pub const DEFAULT_CLIENT_URL: &str = "http://localhost:5173";
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(30_000);
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_millis(30_000);
pub const DEFAULT_MIN_POOL: u32 = 10;
pub const DEFAULT_MAX_POOL: u32 = 50;
pub const DEFAULT_MAX_RETRIES: u32 = 5;
pub const DEFAULT_RETRY_BASE: Duration = Duration::from_millis(2_000);
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(2_000);
pub const DEFAULT_PROBE_INTERVAL: Duration = Duration::from_millis(15_000);

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Port the HTTP/WebSocket server binds on
    pub server_port: u16,
    /// Origin allowed by CORS
    pub client_url: String,
    /// Connection string for the persistent store
    pub database_url: String,
    /// Bound on establishing a store connection
    pub connect_timeout: Duration,
    /// Idle store sockets are closed after this long
    pub idle_timeout: Duration,
    pub min_pool: u32,
    pub max_pool: u32,
    /// Ceiling on failed initial-connect attempts before giving up
    pub max_retries: u32,
    /// Initial-connect retry `n` waits `retry_base * n`
    pub retry_base: Duration,
    /// Fixed delay before reconnecting after an established link drops
    pub reconnect_delay: Duration,
    /// How often the store link is probed while connected
    pub probe_interval: Duration,
}

impl AppConfig {
    /// Create a new AppConfigBuilder
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }

    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = AppConfig::builder();

        if let Some(port) = parse_var::<u16, _>(&lookup, "SERVER_PORT")? {
            builder = builder.server_port(port);
        }
        if let Some(url) = lookup("CLIENT_URL") {
            builder = builder.client_url(url);
        }
        if let Some(url) = lookup("DATABASE_URL") {
            builder = builder.database_url(url);
        }
        if let Some(ms) = parse_var::<u64, _>(&lookup, "STORE_CONNECT_TIMEOUT_MS")? {
            builder = builder.connect_timeout(Duration::from_millis(ms));
        }
        if let Some(ms) = parse_var::<u64, _>(&lookup, "STORE_IDLE_TIMEOUT_MS")? {
            builder = builder.idle_timeout(Duration::from_millis(ms));
        }
        if let Some(n) = parse_var::<u32, _>(&lookup, "STORE_MIN_POOL")? {
            builder = builder.min_pool(n);
        }
        if let Some(n) = parse_var::<u32, _>(&lookup, "STORE_MAX_POOL")? {
            builder = builder.max_pool(n);
        }
        if let Some(n) = parse_var::<u32, _>(&lookup, "STORE_MAX_RETRIES")? {
            builder = builder.max_retries(n);
        }
        if let Some(ms) = parse_var::<u64, _>(&lookup, "STORE_RETRY_BASE_MS")? {
            builder = builder.retry_base(Duration::from_millis(ms));
        }
        if let Some(ms) = parse_var::<u64, _>(&lookup, "STORE_RECONNECT_DELAY_MS")? {
            builder = builder.reconnect_delay(Duration::from_millis(ms));
        }
        if let Some(ms) = parse_var::<u64, _>(&lookup, "STORE_PROBE_INTERVAL_MS")? {
            builder = builder.probe_interval(Duration::from_millis(ms));
        }

        builder.build()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database_url.trim().is_empty() {
            return Err(ConfigError::MissingValue("DATABASE_URL"));
        }
        if self.min_pool > self.max_pool {
            return Err(ConfigError::InvalidPoolRange {
                min: self.min_pool,
                max: self.max_pool,
            });
        }
        if self.max_pool == 0 {
            return Err(ConfigError::InvalidValue {
                key: "STORE_MAX_POOL",
                value: "0".to_string(),
            });
        }
        if self.retry_base.is_zero() {
            return Err(ConfigError::InvalidValue {
                key: "STORE_RETRY_BASE_MS",
                value: "0".to_string(),
            });
        }
        if self.reconnect_delay.is_zero() {
            return Err(ConfigError::InvalidValue {
                key: "STORE_RECONNECT_DELAY_MS",
                value: "0".to_string(),
            });
        }
        if self.probe_interval.is_zero() {
            return Err(ConfigError::InvalidValue {
                key: "STORE_PROBE_INTERVAL_MS",
                value: "0".to_string(),
            });
        }
        Ok(())
    }
}

fn parse_var<T, F>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { key, value: raw }),
    }
}

/// Builder for AppConfig
#[derive(Debug)]
pub struct AppConfigBuilder {
    server_port: u16,
    client_url: String,
    database_url: Option<String>,
    connect_timeout: Duration,
    idle_timeout: Duration,
    min_pool: u32,
    max_pool: u32,
    max_retries: u32,
    retry_base: Duration,
    reconnect_delay: Duration,
    probe_interval: Duration,
}

impl Default for AppConfigBuilder {
    fn default() -> Self {
        Self {
            server_port: DEFAULT_SERVER_PORT,
            client_url: DEFAULT_CLIENT_URL.to_string(),
            database_url: None,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            min_pool: DEFAULT_MIN_POOL,
            max_pool: DEFAULT_MAX_POOL,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_base: DEFAULT_RETRY_BASE,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            probe_interval: DEFAULT_PROBE_INTERVAL,
        }
    }
}

impl AppConfigBuilder {
    pub fn server_port(mut self, port: u16) -> Self {
        self.server_port = port;
        self
    }

    pub fn client_url(mut self, url: impl Into<String>) -> Self {
        self.client_url = url.into();
        self
    }

    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = Some(url.into());
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    pub fn min_pool(mut self, n: u32) -> Self {
        self.min_pool = n;
        self
    }

    pub fn max_pool(mut self, n: u32) -> Self {
        self.max_pool = n;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.max_retries = n;
        self
    }

    pub fn retry_base(mut self, delay: Duration) -> Self {
        self.retry_base = delay;
        self
    }

    pub fn reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    pub fn probe_interval(mut self, interval: Duration) -> Self {
        self.probe_interval = interval;
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<AppConfig, ConfigError> {
        let config = AppConfig {
            server_port: self.server_port,
            client_url: self.client_url,
            database_url: self
                .database_url
                .ok_or(ConfigError::MissingValue("DATABASE_URL"))?,
            connect_timeout: self.connect_timeout,
            idle_timeout: self.idle_timeout,
            min_pool: self.min_pool,
            max_pool: self.max_pool,
            max_retries: self.max_retries,
            retry_base: self.retry_base,
            reconnect_delay: self.reconnect_delay,
            probe_interval: self.probe_interval,
        };
        config.validate()?;
        Ok(config)
    }
}

/// Configuration errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
    #[error("missing value: {0}")]
    MissingValue(&'static str),
    #[error("invalid pool range: min {min} exceeds max {max}")]
    InvalidPoolRange { min: u32, max: u32 },
}
