//! Typed configuration for every tunable the request manager uses.
//!
//! Defaults reproduce the constants the manager was designed against. A
//! deployment can override any of them from `block-sync.toml` or from the
//! environment (`BLOCKSYNC_REQUEST_TIMEOUT_SECS=20`, etc.).

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RequestManagerConfig {
    /// How long an outstanding request waits before it is retried.
    #[serde(with = "secs")]
    pub request_timeout: Duration,

    /// How long a `PendingBlock` may exist before it is given up on.
    #[serde(with = "secs")]
    pub expiration: Duration,

    /// Maximum outbound data requests (headers + hashes combined) per tick.
    pub request_quota_per_second: u32,

    /// Minimum spacing between inventory requests when there is pending work.
    #[serde(with = "secs")]
    pub min_inventory_request_interval: Duration,

    /// Maximum spacing between inventory requests regardless of pending work.
    #[serde(with = "secs")]
    pub max_inventory_request_interval: Duration,

    /// Scheduler tick period.
    #[serde(with = "secs")]
    pub scheduler_tick_interval: Duration,

    /// Whether log lines should be tagged with this node's own id.
    pub log_self_id: bool,
}

impl Default for RequestManagerConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
            expiration: Duration::from_secs(300),
            request_quota_per_second: 100,
            min_inventory_request_interval: Duration::from_secs(3),
            max_inventory_request_interval: Duration::from_secs(30),
            scheduler_tick_interval: Duration::from_secs(1),
            log_self_id: false,
        }
    }
}

impl RequestManagerConfig {
    /// Loads configuration layered as: built-in defaults, then
    /// `block-sync.toml` if present, then `BLOCKSYNC_*` environment
    /// variables. Returns validated defaults if no file is present.
    pub fn load(config_path: impl AsRef<Path>) -> Result<Self, ConfigLoadError> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        let config_path = config_path.as_ref();
        if config_path.exists() {
            info!(path = %config_path.display(), "loading block-sync configuration");
            builder = builder.add_source(File::from(config_path));
        } else {
            warn!(path = %config_path.display(), "no block-sync config file found, using defaults");
        }

        builder = builder.add_source(
            Environment::with_prefix("BLOCKSYNC")
                .separator("_")
                .try_parsing(true),
        );

        let config: RequestManagerConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.request_quota_per_second == 0 {
            return Err(ConfigLoadError::Invalid(
                "request_quota_per_second must be greater than zero".into(),
            ));
        }
        if self.min_inventory_request_interval > self.max_inventory_request_interval {
            return Err(ConfigLoadError::Invalid(
                "min_inventory_request_interval must not exceed max_inventory_request_interval".into(),
            ));
        }
        Ok(())
    }
}

mod secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
