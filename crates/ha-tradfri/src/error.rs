//! Error types for the Tradfri platform

use ha_components::LightError;
use ha_core::EntityIdError;
use thiserror::Error;

/// Errors talking to the gateway or interpreting what it sent
#[derive(Debug, Error)]
pub enum TradfriError {
    /// The gateway client failed to run a command
    #[error("gateway request failed: {0}")]
    Gateway(String),

    #[error("device {0} has no light control")]
    NotALight(u64),

    #[error("unexpected gateway response to {command}: {response}")]
    UnexpectedResponse { command: String, response: String },

    #[error(transparent)]
    EntityId(#[from] EntityIdError),
}

impl From<TradfriError> for LightError {
    fn from(err: TradfriError) -> Self {
        LightError::device(err)
    }
}

/// Errors in the `tradfri:` configuration section
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse tradfri configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid configuration value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },
}
