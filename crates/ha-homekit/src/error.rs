//! Error types for the HomeKit bridge

use ha_service_registry::ServiceError;
use thiserror::Error;

/// Errors raised while building or driving accessories
#[derive(Debug, Error)]
pub enum AccessoryError {
    /// The host rejected the service call an accessory issued
    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("no accessory with aid {0}")]
    UnknownAccessory(u64),

    #[error("unknown HomeKit service '{0}'")]
    UnknownService(String),

    #[error("accessory {aid} has no characteristic '{characteristic}'")]
    UnknownCharacteristic { aid: u64, characteristic: String },

    #[error("invalid value {value} for characteristic '{characteristic}'")]
    InvalidValue {
        characteristic: String,
        value: serde_json::Value,
    },

    #[error("no accessory type registered as '{0}'")]
    UnknownType(String),
}

/// Errors in the `homekit:` configuration section
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse homekit configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid configuration value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },
}
