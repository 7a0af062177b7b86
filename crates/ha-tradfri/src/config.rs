//! Configuration for the `tradfri:` section

use crate::error::ConfigError;
use crate::observe::RetryPolicy;
use serde::Deserialize;
use std::time::Duration;

/// Tradfri platform configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TradfriConfig {
    /// Gateway address
    pub host: String,
    /// Also expose gateway groups as lights
    #[serde(default = "default_true")]
    pub allow_tradfri_groups: bool,
    #[serde(default)]
    pub observe: ObserveConfig,
}

fn default_true() -> bool {
    true
}

/// Retry settings of the observe loop
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ObserveConfig {
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
    /// Consecutive failures before the entity is marked unavailable
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

fn default_initial_backoff_ms() -> u64 {
    500
}

fn default_max_backoff_ms() -> u64 {
    30_000
}

fn default_max_attempts() -> u32 {
    10
}

impl Default for ObserveConfig {
    fn default() -> Self {
        Self {
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            max_attempts: default_max_attempts(),
        }
    }
}

impl ObserveConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            initial_backoff: Duration::from_millis(self.initial_backoff_ms),
            max_backoff: Duration::from_millis(self.max_backoff_ms),
            max_attempts: self.max_attempts,
        }
    }
}

impl TradfriConfig {
    /// Parse and validate the section from a YAML value
    pub fn from_yaml(value: serde_yaml::Value) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_value(value)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(invalid("host", "must not be empty"));
        }
        if self.observe.max_attempts == 0 {
            return Err(invalid("observe.max_attempts", "must be at least 1"));
        }
        if self.observe.initial_backoff_ms > self.observe.max_backoff_ms {
            return Err(invalid(
                "observe.initial_backoff_ms",
                "must not exceed observe.max_backoff_ms",
            ));
        }
        Ok(())
    }
}

fn invalid(key: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}
