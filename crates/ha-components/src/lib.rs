//! Home Assistant Built-in Components
//!
//! Host-side components that integrations plug into: the `HomeAssistant`
//! instance handed to integrations and the `light` component, which light
//! platforms such as Tradfri register entities with.

pub mod color;
mod hass;
pub mod light;

pub use hass::HomeAssistant;
pub use light::{
    light_state_attributes, LightComponent, LightEntity, LightError, LightStateWriter,
    TurnOffParams, TurnOnParams,
};
