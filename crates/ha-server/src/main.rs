//! Home Assistant Rust Server
//!
//! Main entry point: loads `configuration.yaml` (or the path given as the
//! first argument), wires the core, and starts the configured integrations.

mod config;

use anyhow::Result;
use config::{CoreConfig, DEFAULT_CONFIG_PATH};
use ha_components::{HomeAssistant, LightComponent};
use ha_homekit::{HomeKit, HomeKitConfig};
use ha_tradfri::TradfriConfig;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("Starting Home Assistant (Rust)");

    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let config = if path.exists() {
        CoreConfig::load(&path)?
    } else {
        warn!("{} not found, starting without integrations", path.display());
        CoreConfig::default()
    };

    let hass = HomeAssistant::new();
    let lights = LightComponent::new(hass.states.clone());
    lights.register_services(&hass.services);

    if let Some(section) = config.tradfri {
        let tradfri = TradfriConfig::from_yaml(section)?;
        // The CoAP client is provided by a separate transport crate
        warn!(
            "No Tradfri gateway client available for {}, lights will not be added",
            tradfri.host
        );
    }

    let homekit = match config.homekit {
        Some(section) => {
            let homekit = HomeKit::new(hass.clone(), HomeKitConfig::from_yaml(section)?)?;
            homekit.start();
            Some(homekit)
        }
        None => None,
    };

    info!("Home Assistant is running");

    tokio::signal::ctrl_c().await?;
    info!("Shutting down...");

    if let Some(homekit) = homekit {
        homekit.stop();
    }
    lights.stop();

    Ok(())
}
