//! HomeKit bridge for Home Assistant
//!
//! Exposes Home Assistant entities as HomeKit accessories. Each accessory
//! type translates between its HomeKit characteristics and the services and
//! states of the entity it mirrors:
//!
//! - [`Switch`]: `switch`, `remote`, `input_boolean`, and `script` entities
//!   as a HomeKit switch, calling `turn_on`/`turn_off` on client writes.
//!
//! [`HomeKit`] owns the accessories of one bridge and keeps them in sync.

pub mod accessories;
mod config;
pub mod consts;
mod error;
mod homekit;
mod type_switches;
mod types;

pub use accessories::{Accessory, Characteristic, HomeAccessory, Service};
pub use config::{EntityConfig, EntityFilter, HomeKitConfig};
pub use error::{AccessoryError, ConfigError};
pub use homekit::{accessory_type_for, get_accessory, HomeKit};
pub use type_switches::{Switch, TYPE_SWITCH};
pub use types::{AccessoryFactory, AccessoryTypes};

/// Domain name of the integration and its configuration section
pub const DOMAIN: &str = "homekit";
