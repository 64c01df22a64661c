//! Search core configuration via `agora.toml`
//!
//! Every field has a default, so an empty file (or no file) is a valid
//! configuration. Stopwords and ranking weights are deliberately absent:
//! they are part of the index format and the ranking contract.

use crate::worker::PoolOptions;
use agora_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Config file name
pub const CONFIG_FILE_NAME: &str = "agora.toml";

/// Search core configuration loaded from `agora.toml`.
///
/// # Example
///
/// ```toml
/// workers = 4
/// queue_depth = 4096
/// op_timeout_ms = 5000
/// max_limit = 1000
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Index worker threads.
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Change events that may wait before submission pushes back.
    #[serde(default = "default_queue_depth")]
    pub queue_depth: usize,
    /// Replays of a change event after a retryable failure.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Linear backoff unit between replays, in milliseconds.
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
    /// Deadline for one operation in milliseconds; 0 disables it.
    #[serde(default = "default_op_timeout_ms")]
    pub op_timeout_ms: u64,
    /// Ids per domain-store batch fetch during hydration.
    #[serde(default = "default_hydrate_batch_size")]
    pub hydrate_batch_size: usize,
    /// Cap on results per query; 0 disables it.
    #[serde(default = "default_max_limit")]
    pub max_limit: usize,
}

fn default_workers() -> usize {
    4
}

fn default_queue_depth() -> usize {
    4096
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    50
}

fn default_op_timeout_ms() -> u64 {
    5000
}

fn default_hydrate_batch_size() -> usize {
    64
}

fn default_max_limit() -> usize {
    1000
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            queue_depth: default_queue_depth(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
            op_timeout_ms: default_op_timeout_ms(),
            hydrate_batch_size: default_hydrate_batch_size(),
            max_limit: default_max_limit(),
        }
    }
}

impl SearchConfig {
    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# Agora search core configuration
#
# Index worker threads draining the change-event queue (default: 4)
workers = 4

# Change events that may wait in the queue before submit reports
# backpressure (default: 4096)
queue_depth = 4096

# Replays of a change event after a store failure (default: 3).
# Attempt n waits n * retry_backoff_ms first.
max_retries = 3
retry_backoff_ms = 50

# Deadline for a single index or query operation in milliseconds.
# 0 = no deadline (default: 5000)
op_timeout_ms = 5000

# Ids per domain-store batch fetch when hydrating results (default: 64)
hydrate_batch_size = 64

# Cap on results per query. A query limit of 0 means "as many as allowed".
# 0 = no cap (default: 1000)
max_limit = 1000
"#
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if `workers`, `queue_depth` or `hydrate_batch_size`
    /// is zero.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("workers", self.workers),
            ("queue_depth", self.queue_depth),
            ("hydrate_batch_size", self.hydrate_batch_size),
        ] {
            if value == 0 {
                return Err(Error::InvalidConfig(format!(
                    "'{}' must be at least 1 in {}",
                    name, CONFIG_FILE_NAME
                )));
            }
        }
        Ok(())
    }

    /// Per-operation deadline, if any
    pub fn op_timeout(&self) -> Option<Duration> {
        (self.op_timeout_ms > 0).then(|| Duration::from_millis(self.op_timeout_ms))
    }

    /// Effective result count for a caller-supplied limit; 0 = unlimited.
    pub fn effective_limit(&self, limit: usize) -> usize {
        match (limit, self.max_limit) {
            (0, cap) => cap,
            (n, 0) => n,
            (n, cap) => n.min(cap),
        }
    }

    /// Worker pool settings derived from this config
    pub fn pool_options(&self) -> PoolOptions {
        PoolOptions {
            workers: self.workers,
            queue_depth: self.queue_depth,
            max_retries: self.max_retries,
            retry_backoff: Duration::from_millis(self.retry_backoff_ms),
            op_timeout: self.op_timeout(),
        }
    }

    /// Read, parse and validate config from a file path.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::InvalidConfig(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: SearchConfig = toml::from_str(&content).map_err(|e| {
            Error::InvalidConfig(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Write the default config file if it does not already exist.
    ///
    /// Returns `Ok(())` whether the file was created or already existed.
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|e| {
                Error::InvalidConfig(format!(
                    "Failed to write default config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Serialization(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| {
            Error::InvalidConfig(format!(
                "Failed to write config file '{}': {}",
                path.display(),
                e
            ))
        })
    }
}
