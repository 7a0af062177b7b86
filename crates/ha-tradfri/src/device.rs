//! Device and group handles as reported by the gateway

use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

fn default_min_mireds() -> u16 {
    250
}

fn default_max_mireds() -> u16 {
    454
}

/// A device paired with the gateway
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: u64,
    pub name: String,
    /// Whether the gateway can currently reach the device
    #[serde(default = "default_true")]
    pub reachable: bool,
    /// Present on bulbs and panels, absent on remotes and sensors
    #[serde(default)]
    pub light_control: Option<LightControl>,
}

impl Device {
    pub fn has_light_control(&self) -> bool {
        self.light_control.is_some()
    }
}

/// Capabilities and per-light state of a lighting device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightControl {
    #[serde(default)]
    pub can_set_dimmer: bool,
    #[serde(default)]
    pub can_set_color: bool,
    #[serde(default)]
    pub can_set_mireds: bool,
    #[serde(default)]
    pub can_set_kelvin: bool,
    #[serde(default = "default_min_mireds")]
    pub min_mireds: u16,
    #[serde(default = "default_max_mireds")]
    pub max_mireds: u16,
    #[serde(default)]
    pub lights: Vec<LightData>,
}

/// State of one light of a device
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LightData {
    #[serde(default)]
    pub state: bool,
    /// Brightness on the device scale, 0-254
    #[serde(default)]
    pub dimmer: u8,
    /// Color temperature in mireds
    #[serde(default)]
    pub color_temp: Option<u16>,
    /// Hex RGB as reported by color-capable bulbs
    #[serde(default)]
    pub hex_color: Option<String>,
    /// Chromaticity on the device scale, 0-65535
    #[serde(default)]
    pub xy_color: Option<(u32, u32)>,
}

/// A group of devices switched together
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub state: bool,
    #[serde(default)]
    pub dimmer: u8,
}
