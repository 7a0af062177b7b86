//! Platform discovery against a mock gateway

mod common;

use common::{color_bulb, device, white_bulb, MockGateway};
use ha_components::{HomeAssistant, LightComponent};
use ha_tradfri::{async_setup_platform, Group, ObserveConfig, TradfriConfig, TradfriError};
use serde_json::json;
use std::sync::Arc;

fn config(allow_tradfri_groups: bool) -> TradfriConfig {
    TradfriConfig {
        host: "192.168.1.10".to_string(),
        allow_tradfri_groups,
        observe: ObserveConfig::default(),
    }
}

fn gateway() -> Arc<MockGateway> {
    let gateway = MockGateway::new();
    gateway.add_device(device(json!({"id": 65536, "name": "TRADFRI remote control"})));
    gateway.add_device(color_bulb(65537, "Living Room", true));
    gateway.add_device(white_bulb(65538, "Hallway", true, 200));
    gateway.add_group(Group {
        id: 131073,
        name: "Kitchen".to_string(),
        state: false,
        dimmer: 0,
    });
    gateway
}

#[tokio::test]
async fn test_setup_adds_lights_and_groups() {
    let hass = HomeAssistant::new();
    let lights = LightComponent::new(hass.states.clone());

    let ids = async_setup_platform(gateway(), &config(true), &lights)
        .await
        .unwrap();

    let ids: Vec<String> = ids.iter().map(ToString::to_string).collect();
    assert_eq!(ids, vec!["light.living_room", "light.hallway", "light.kitchen"]);
    assert!(lights.entity("light.tradfri_remote_control").is_none());

    let hallway = hass.states.get("light.hallway").unwrap();
    assert_eq!(hallway.state, "on");
    assert_eq!(hallway.attribute::<u8>("brightness"), Some(200));
    assert_eq!(hallway.attribute::<u16>("min_mireds"), Some(250));
    assert_eq!(hass.states.get_state("light.kitchen").as_deref(), Some("off"));
}

#[tokio::test]
async fn test_groups_can_be_disabled() {
    let hass = HomeAssistant::new();
    let lights = LightComponent::new(hass.states.clone());

    let ids = async_setup_platform(gateway(), &config(false), &lights)
        .await
        .unwrap();

    assert_eq!(ids.len(), 2);
    assert!(!hass.states.contains("light.kitchen"));
}

#[tokio::test]
async fn test_unreachable_gateway_fails_setup() {
    let hass = HomeAssistant::new();
    let lights = LightComponent::new(hass.states.clone());
    let gateway = gateway();
    gateway.set_offline(true);

    let result = async_setup_platform(gateway, &config(true), &lights).await;

    assert!(matches!(result, Err(TradfriError::Gateway(_))));
    assert!(hass.states.all().is_empty());
}

#[tokio::test]
async fn test_device_without_lights_is_skipped() {
    let hass = HomeAssistant::new();
    let lights = LightComponent::new(hass.states.clone());
    let gateway = MockGateway::new();
    gateway.add_device(white_bulb(65538, "Hallway", true, 200));
    gateway.add_device(device(json!({
        "id": 65539,
        "name": "TRADFRI driver",
        "light_control": {"lights": []}
    })));

    let ids = async_setup_platform(gateway, &config(false), &lights)
        .await
        .unwrap();

    let ids: Vec<String> = ids.iter().map(ToString::to_string).collect();
    assert_eq!(ids, vec!["light.hallway"]);
    assert_eq!(hass.states.all().len(), 1);
}
