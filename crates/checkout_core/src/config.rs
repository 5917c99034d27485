use std::time::Duration;

use serde::{Deserialize, Serialize};

/// The remote service allows this many concurrent requests per session.
pub const DEFAULT_CONCURRENCY_LIMIT: usize = 10;
const DEFAULT_RETRY_COUNT: u32 = 2;
const DEFAULT_BASE_DELAY_MS: u64 = 1_000;
const DEFAULT_MAX_DELAY_MS: u64 = 5_000;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("library code is empty")]
    MissingLibrary,
    #[error("circulation desk code is empty")]
    MissingCircDesk,
    #[error("concurrency limit must be at least 1")]
    ZeroConcurrency,
    #[error("max delay ({max_ms}ms) is shorter than base delay ({base_ms}ms)")]
    DelayBounds { base_ms: u64, max_ms: u64 },
}

/// Immutable parameters for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchConfig {
    pub library: String,
    pub circ_desk: String,
    #[serde(default = "default_concurrency_limit")]
    pub concurrency_limit: usize,
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl BatchConfig {
    pub fn new(library: impl Into<String>, circ_desk: impl Into<String>) -> Self {
        Self {
            library: library.into(),
            circ_desk: circ_desk.into(),
            concurrency_limit: DEFAULT_CONCURRENCY_LIMIT,
            retry_count: DEFAULT_RETRY_COUNT,
            base_delay_ms: DEFAULT_BASE_DELAY_MS,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
        }
    }

    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.library.trim().is_empty() {
            return Err(ConfigError::MissingLibrary);
        }
        if self.circ_desk.trim().is_empty() {
            return Err(ConfigError::MissingCircDesk);
        }
        if self.concurrency_limit == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        if self.max_delay_ms < self.base_delay_ms {
            return Err(ConfigError::DelayBounds {
                base_ms: self.base_delay_ms,
                max_ms: self.max_delay_ms,
            });
        }
        Ok(())
    }
}

fn default_concurrency_limit() -> usize {
    DEFAULT_CONCURRENCY_LIMIT
}

fn default_retry_count() -> u32 {
    DEFAULT_RETRY_COUNT
}

fn default_base_delay_ms() -> u64 {
    DEFAULT_BASE_DELAY_MS
}

fn default_max_delay_ms() -> u64 {
    DEFAULT_MAX_DELAY_MS
}
