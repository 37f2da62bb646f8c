//! Retry policy configuration.

use serde::Deserialize;
use serde::Serialize;
use snafu::ResultExt;
use snafu::Snafu;

use crate::constants::DEFAULT_INITIAL_BACKOFF_MS;
use crate::constants::DEFAULT_MAX_BACKOFF_MS;
use crate::constants::DEFAULT_MAX_RETRY_ATTEMPTS;

mod defaults {
    use super::*;

    pub fn max_attempts() -> u32 { DEFAULT_MAX_RETRY_ATTEMPTS }
    pub fn initial_backoff_ms() -> u64 { DEFAULT_INITIAL_BACKOFF_MS }
    pub fn max_backoff_ms() -> u64 { DEFAULT_MAX_BACKOFF_MS }
}

/// Errors from loading or validating a [`RetryConfig`].
#[derive(Debug, Snafu)]
pub enum RetryConfigError {
    /// The TOML document could not be parsed.
    #[snafu(display("failed to parse retry config: {source}"))]
    Parse {
        /// Underlying TOML error.
        source: toml::de::Error,
    },

    /// `max_attempts` was zero.
    #[snafu(display("max_attempts must be at least 1"))]
    ZeroAttempts,

    /// The initial backoff exceeds the cap.
    #[snafu(display("initial_backoff_ms ({initial}) exceeds max_backoff_ms ({max})"))]
    BackoffOrder {
        /// Configured initial backoff.
        initial: u64,
        /// Configured cap.
        max: u64,
    },
}

/// How [`run`](crate::run) retries transactions that fail with a retryable error.
///
/// The backoff doubles after each failed attempt, capped at `max_backoff_ms`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts, the first one included.
    #[serde(default = "defaults::max_attempts")]
    pub max_attempts: u32,

    /// Sleep after the first failed attempt, in milliseconds.
    #[serde(default = "defaults::initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Upper bound on the sleep between attempts, in milliseconds.
    #[serde(default = "defaults::max_backoff_ms")]
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: defaults::max_attempts(),
            initial_backoff_ms: defaults::initial_backoff_ms(),
            max_backoff_ms: defaults::max_backoff_ms(),
        }
    }
}

impl RetryConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, RetryConfigError> {
        let config: Self = toml::from_str(s).context(ParseSnafu)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the invariants the retry loop relies on.
    pub fn validate(&self) -> Result<(), RetryConfigError> {
        if self.max_attempts == 0 {
            return Err(RetryConfigError::ZeroAttempts);
        }
        if self.initial_backoff_ms > self.max_backoff_ms {
            return Err(RetryConfigError::BackoffOrder {
                initial: self.initial_backoff_ms,
                max: self.max_backoff_ms,
            });
        }
        Ok(())
    }

    /// Backoff to sleep after `backoff_ms`, doubled and capped.
    pub(crate) fn next_backoff_ms(&self, backoff_ms: u64) -> u64 {
        backoff_ms.saturating_mul(2).min(self.max_backoff_ms)
    }
}
