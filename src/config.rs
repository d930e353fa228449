//! Configuration types for oh-no-again

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Retry behavior for a single operation
///
/// Durations serialize as integer milliseconds, so a JSON config reads
/// `{"retries": 3, "delay": 300, "timeout": 1000}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts (default: 3)
    ///
    /// Zero disables retrying entirely: the batch orchestrator then calls the
    /// transport exactly once, and [`run_with_retry`](crate::retry::run_with_retry)
    /// rejects the configuration.
    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Base backoff delay; attempt `i` waits `delay * 2^i` before the next (default: 300ms)
    #[serde(default = "default_delay", with = "duration_ms_serde")]
    pub delay: Duration,

    /// Time budget for each attempt (default: 1000ms)
    #[serde(default = "default_timeout", with = "duration_ms_serde")]
    pub timeout: Duration,

    /// Stretch each backoff delay by a random factor in `[1, 2]` (default: false)
    #[serde(default)]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            retries: default_retries(),
            delay: default_delay(),
            timeout: default_timeout(),
            jitter: false,
        }
    }
}

impl RetryConfig {
    /// Check the settings that would make every attempt fail
    pub fn validate(&self) -> Result<()> {
        if self.timeout.is_zero() {
            return Err(Error::config("timeout", "timeout must be greater than zero"));
        }
        Ok(())
    }
}

/// Batch orchestrator options: retry settings plus result and failure policy
///
/// Field names follow the camelCase option names (`failFast`, `returnMeta`).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchConfig {
    /// Retry settings applied to every item
    #[serde(flatten)]
    pub retry: RetryConfig,

    /// Stop at the first item that fails after all its attempts (default: false)
    ///
    /// Groups not yet started never run; items of the group in flight are
    /// left to finish on their own.
    #[serde(default)]
    pub fail_fast: bool,

    /// Wrap each outcome as `{item, result|error, success}` instead of the bare body (default: false)
    #[serde(default)]
    pub return_meta: bool,
}

impl BatchConfig {
    /// Validate the nested retry settings
    pub fn validate(&self) -> Result<()> {
        self.retry.validate()
    }
}

fn default_retries() -> u32 {
    3
}

fn default_delay() -> Duration {
    Duration::from_millis(300)
}

fn default_timeout() -> Duration {
    Duration::from_millis(1000)
}

// Duration <-> integer milliseconds
mod duration_ms_serde {
    use serde::ser::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis = u64::try_from(duration.as_millis())
            .map_err(|_| S::Error::custom("duration does not fit in u64 milliseconds"))?;
        serializer.serialize_u64(millis)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
