//! Observe loop: pushed updates, backoff, and the terminal unavailable state

mod common;

use common::{wait_for, white_bulb, MockGateway};
use ha_components::{HomeAssistant, LightComponent, LightEntity};
use ha_tradfri::{Group, Response, RetryPolicy, TradfriGroup, TradfriLight};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

fn policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        initial_backoff: Duration::from_millis(100),
        max_backoff: Duration::from_millis(1000),
        max_attempts,
    }
}

fn setup() -> (HomeAssistant, Arc<LightComponent>, Arc<MockGateway>) {
    let hass = HomeAssistant::new();
    let lights = LightComponent::new(hass.states.clone());
    (hass, lights, MockGateway::new())
}

#[tokio::test(start_paused = true)]
async fn test_pushed_update_is_written() {
    let (hass, lights, gateway) = setup();
    gateway.script_observe(Ok(Response::Device(white_bulb(65538, "Hallway", true, 50))));
    let bulb = TradfriLight::new(white_bulb(65538, "Hallway", false, 0), gateway.clone())
        .unwrap()
        .with_retry_policy(policy(3));

    lights.add_entities([Arc::new(bulb) as Arc<dyn LightEntity>]).unwrap();

    wait_for(|| hass.states.get_state("light.hallway").as_deref() == Some("on")).await;
    let state = hass.states.get("light.hallway").unwrap();
    assert_eq!(state.attribute::<u8>("brightness"), Some(50));
    assert_eq!(state.attribute::<u16>("color_temp"), Some(370));

    // The loop subscribes again after every update
    wait_for(|| gateway.observe_calls() == 2).await;
}

#[tokio::test(start_paused = true)]
async fn test_failures_back_off_then_recover() {
    let (hass, lights, gateway) = setup();
    for _ in 0..3 {
        gateway.script_observe(Err("request timed out"));
    }
    gateway.script_observe(Ok(Response::Device(white_bulb(65538, "Hallway", true, 80))));
    let bulb = Arc::new(
        TradfriLight::new(white_bulb(65538, "Hallway", false, 0), gateway.clone())
            .unwrap()
            .with_retry_policy(policy(4)),
    );

    let started = Instant::now();
    lights.add_entities([bulb.clone() as Arc<dyn LightEntity>]).unwrap();
    wait_for(|| hass.states.get_state("light.hallway").as_deref() == Some("on")).await;

    // 100ms + 200ms + 400ms of backoff before the fourth attempt
    assert!(started.elapsed() >= Duration::from_millis(700));
    assert!(bulb.available());
    assert_eq!(bulb.brightness(), Some(80));
}

#[tokio::test(start_paused = true)]
async fn test_success_resets_the_failure_count() {
    let (hass, lights, gateway) = setup();
    gateway.script_observe(Err("timeout"));
    gateway.script_observe(Err("timeout"));
    gateway.script_observe(Ok(Response::Device(white_bulb(65538, "Hallway", true, 10))));
    gateway.script_observe(Err("timeout"));
    gateway.script_observe(Err("timeout"));
    gateway.script_observe(Ok(Response::Device(white_bulb(65538, "Hallway", false, 10))));
    let bulb = Arc::new(
        TradfriLight::new(white_bulb(65538, "Hallway", true, 0), gateway.clone())
            .unwrap()
            .with_retry_policy(policy(3)),
    );

    lights.add_entities([bulb.clone() as Arc<dyn LightEntity>]).unwrap();
    wait_for(|| gateway.observe_calls() == 7).await;

    assert!(bulb.available());
    assert_eq!(hass.states.get_state("light.hallway").as_deref(), Some("off"));
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_retries_mark_unavailable() {
    let (hass, lights, gateway) = setup();
    for _ in 0..5 {
        gateway.script_observe(Err("gateway unreachable"));
    }
    let bulb = Arc::new(
        TradfriLight::new(white_bulb(65538, "Hallway", true, 120), gateway.clone())
            .unwrap()
            .with_retry_policy(policy(3)),
    );

    lights.add_entities([bulb.clone() as Arc<dyn LightEntity>]).unwrap();
    assert_eq!(hass.states.get_state("light.hallway").as_deref(), Some("on"));

    wait_for(|| hass.states.get_state("light.hallway").as_deref() == Some("unavailable")).await;
    assert!(!bulb.available());

    // The loop has ended; nothing is retried after the terminal state
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(gateway.observe_calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_group_follows_the_same_loop() {
    let (hass, lights, gateway) = setup();
    gateway.script_observe(Ok(Response::Group(Group {
        id: 131073,
        name: "Kitchen".to_string(),
        state: true,
        dimmer: 254,
    })));
    gateway.script_observe(Err("timeout"));
    let group = TradfriGroup::new(
        Group {
            id: 131073,
            name: "Kitchen".to_string(),
            state: false,
            dimmer: 0,
        },
        gateway.clone(),
    )
    .with_retry_policy(policy(1));

    lights.add_entities([Arc::new(group) as Arc<dyn LightEntity>]).unwrap();

    wait_for(|| hass.states.get_state("light.kitchen").as_deref() == Some("unavailable")).await;
    assert_eq!(gateway.observe_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_stopping_the_component_ends_observation() {
    let (hass, lights, gateway) = setup();
    for _ in 0..5 {
        gateway.script_observe(Err("timeout"));
    }
    let bulb = TradfriLight::new(white_bulb(65538, "Hallway", true, 120), gateway.clone())
        .unwrap()
        .with_retry_policy(policy(5));

    lights.add_entities([Arc::new(bulb) as Arc<dyn LightEntity>]).unwrap();
    wait_for(|| gateway.observe_calls() == 1).await;

    lights.stop();
    tokio::time::sleep(Duration::from_secs(60)).await;

    assert_eq!(gateway.observe_calls(), 1);
    assert_eq!(hass.states.get_state("light.hallway").as_deref(), Some("on"));
}
