//! IKEA Tradfri platform for Home Assistant
//!
//! Wraps the devices and groups of a Tradfri gateway as light entities.
//! Commands are translated to gateway commands and run through a
//! [`GatewayApi`]; state arrives through per-entity observe loops that
//! retry with backoff and mark the entity unavailable when the gateway
//! stops answering.

mod api;
mod command;
mod config;
mod device;
mod error;
mod group;
mod light;
mod observe;
mod platform;

pub use api::{GatewayApi, SharedGatewayApi};
pub use command::{Command, GroupAction, LightAction, Response};
pub use config::{ObserveConfig, TradfriConfig};
pub use device::{Device, Group, LightControl, LightData};
pub use error::{ConfigError, TradfriError};
pub use group::TradfriGroup;
pub use light::{denormalize_xy, normalize_xy, TradfriLight, MAX_DIMMER, SUPPORTED_FEATURES};
pub use observe::RetryPolicy;
pub use platform::async_setup_platform;

/// Domain name of the integration and its configuration section
pub const DOMAIN: &str = "tradfri";
