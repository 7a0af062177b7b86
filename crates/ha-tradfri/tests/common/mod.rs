//! Shared helpers for Tradfri integration tests
#![allow(dead_code)]

pub mod mock_gateway;

pub use mock_gateway::MockGateway;

use ha_tradfri::Device;
use serde_json::{json, Value};
use std::time::Duration;

/// Poll `condition` every 10ms until it holds, panicking after 10s
pub async fn wait_for(mut condition: impl FnMut() -> bool) {
    for _ in 0..1000 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition was not met in time");
}

pub fn device(value: Value) -> Device {
    serde_json::from_value(value).unwrap()
}

/// A color bulb that reports a hex color, like the CWS range
pub fn color_bulb(id: u64, name: &str, can_set_kelvin: bool) -> Device {
    device(json!({
        "id": id,
        "name": name,
        "light_control": {
            "can_set_dimmer": true,
            "can_set_color": true,
            "can_set_kelvin": can_set_kelvin,
            "lights": [{"state": false, "dimmer": 0, "hex_color": "f1e0b5", "xy_color": [30138, 26909]}]
        }
    }))
}

/// A white spectrum bulb without hex color
pub fn white_bulb(id: u64, name: &str, state: bool, dimmer: u8) -> Device {
    device(json!({
        "id": id,
        "name": name,
        "light_control": {
            "can_set_dimmer": true,
            "can_set_mireds": true,
            "lights": [{"state": state, "dimmer": dimmer, "color_temp": 370}]
        }
    }))
}
