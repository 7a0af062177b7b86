//! Light Component
//!
//! The host side of every light integration: the `LightEntity` contract a
//! platform implements, the options `light.turn_on` accepts, the writer that
//! turns an entity into a state machine entry, and the service handlers that
//! route `light.turn_on` / `light.turn_off` to the targeted entities.

use async_trait::async_trait;
use dashmap::DashMap;
use ha_core::{
    Context, EntityId, EntityIdError, ServiceCall, State, ATTR_FRIENDLY_NAME,
    ATTR_SUPPORTED_FEATURES, SERVICE_TURN_OFF, SERVICE_TURN_ON, STATE_OFF, STATE_ON,
    STATE_UNAVAILABLE,
};
use ha_service_registry::{ServiceError, ServiceRegistry, ServiceResult};
use ha_state_machine::StateMachine;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Domain name for the light component
pub const DOMAIN: &str = "light";

pub const SUPPORT_BRIGHTNESS: u32 = 1;
pub const SUPPORT_COLOR_TEMP: u32 = 2;
pub const SUPPORT_EFFECT: u32 = 4;
pub const SUPPORT_FLASH: u32 = 8;
pub const SUPPORT_COLOR: u32 = 16;
pub const SUPPORT_TRANSITION: u32 = 32;

pub const ATTR_BRIGHTNESS: &str = "brightness";
pub const ATTR_COLOR_TEMP: &str = "color_temp";
pub const ATTR_MIN_MIREDS: &str = "min_mireds";
pub const ATTR_MAX_MIREDS: &str = "max_mireds";
pub const ATTR_HS_COLOR: &str = "hs_color";
pub const ATTR_XY_COLOR: &str = "xy_color";

/// Error returned by a light entity command
#[derive(Debug, Error)]
pub enum LightError {
    /// The device or gateway behind the entity rejected the command
    #[error("light command failed: {0}")]
    Device(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl LightError {
    /// Wrap any device-side error
    pub fn device(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Device(Box::new(err))
    }
}

/// Options accepted by `light.turn_on`
///
/// Every field is optional; unknown keys in the service data (such as
/// `entity_id`) are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TurnOnParams {
    /// Brightness on the host scale, 0-255
    #[serde(default)]
    pub brightness: Option<u8>,
    /// Hue (0-360) and saturation (0-100)
    #[serde(default)]
    pub hs_color: Option<(f64, f64)>,
    /// CIE xy chromaticity, each 0.0-1.0
    #[serde(default)]
    pub xy_color: Option<(f64, f64)>,
    #[serde(default)]
    pub rgb_color: Option<(u8, u8, u8)>,
    /// Color temperature in mireds
    #[serde(default)]
    pub color_temp: Option<u16>,
    /// Transition duration in seconds
    #[serde(default)]
    pub transition: Option<f64>,
}

/// Options accepted by `light.turn_off`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TurnOffParams {
    #[serde(default)]
    pub transition: Option<f64>,
}

/// What the host needs from a light platform entity
#[async_trait]
pub trait LightEntity: Send + Sync {
    /// Display name; also the seed for the generated entity id
    fn name(&self) -> String;

    fn available(&self) -> bool {
        true
    }

    /// Whether the host has to refresh the state itself after a command.
    /// Push-based platforms return false and write state when notified.
    fn should_poll(&self) -> bool {
        true
    }

    /// Bitmask of the `SUPPORT_*` flags
    fn supported_features(&self) -> u32;

    fn is_on(&self) -> bool;

    /// Brightness on the host scale
    fn brightness(&self) -> Option<u8> {
        None
    }

    /// Color temperature in mireds
    fn color_temp(&self) -> Option<u16> {
        None
    }

    fn min_mireds(&self) -> Option<u16> {
        None
    }

    fn max_mireds(&self) -> Option<u16> {
        None
    }

    fn xy_color(&self) -> Option<(f64, f64)> {
        None
    }

    fn hs_color(&self) -> Option<(f64, f64)> {
        None
    }

    async fn turn_on(&self, params: TurnOnParams) -> Result<(), LightError>;

    async fn turn_off(&self, params: TurnOffParams) -> Result<(), LightError>;

    /// Called once the entity has an id and an initial state. Push-based
    /// platforms start their subscriptions here and keep `writer` to report
    /// later changes. A returned task is owned by the component and aborted
    /// by [`LightComponent::stop`].
    fn added_to_hass(self: Arc<Self>, writer: LightStateWriter) -> Option<JoinHandle<()>> {
        let _ = writer;
        None
    }
}

/// Build the state attributes the host stores for a light
///
/// Color and brightness attributes are only present while the light is on,
/// mireds bounds only when color temperature is supported.
pub fn light_state_attributes(light: &dyn LightEntity) -> HashMap<String, serde_json::Value> {
    let features = light.supported_features();
    let mut attributes = HashMap::new();

    attributes.insert(ATTR_FRIENDLY_NAME.to_string(), json!(light.name()));
    attributes.insert(ATTR_SUPPORTED_FEATURES.to_string(), json!(features));

    if features & SUPPORT_COLOR_TEMP != 0 {
        if let Some(min) = light.min_mireds() {
            attributes.insert(ATTR_MIN_MIREDS.to_string(), json!(min));
        }
        if let Some(max) = light.max_mireds() {
            attributes.insert(ATTR_MAX_MIREDS.to_string(), json!(max));
        }
    }

    if light.is_on() {
        if let Some(brightness) = light.brightness() {
            attributes.insert(ATTR_BRIGHTNESS.to_string(), json!(brightness));
        }
        if let Some(mireds) = light.color_temp() {
            attributes.insert(ATTR_COLOR_TEMP.to_string(), json!(mireds));
        }
        if let Some((h, s)) = light.hs_color() {
            attributes.insert(ATTR_HS_COLOR.to_string(), json!([h, s]));
        }
        if let Some((x, y)) = light.xy_color() {
            attributes.insert(ATTR_XY_COLOR.to_string(), json!([x, y]));
        }
    }

    attributes
}

/// Writes one light's current state into the state machine
///
/// This is the "schedule state update" hook handed to entities: calling
/// `write` re-reads every property and stores the result.
#[derive(Clone)]
pub struct LightStateWriter {
    entity_id: EntityId,
    states: Arc<StateMachine>,
}

impl LightStateWriter {
    pub fn new(entity_id: EntityId, states: Arc<StateMachine>) -> Self {
        Self { entity_id, states }
    }

    pub fn entity_id(&self) -> &EntityId {
        &self.entity_id
    }

    /// Re-read the entity and store its state
    pub fn write(&self, light: &dyn LightEntity) -> State {
        self.write_in_context(light, Context::new())
    }

    /// Like `write`, attributing the change to `context`
    pub fn write_in_context(&self, light: &dyn LightEntity, context: Context) -> State {
        let state = if !light.available() {
            STATE_UNAVAILABLE
        } else if light.is_on() {
            STATE_ON
        } else {
            STATE_OFF
        };

        debug!(entity_id = %self.entity_id, state, "Writing light state");
        self.states.set(
            self.entity_id.clone(),
            state,
            light_state_attributes(light),
            context,
        )
    }
}

struct RegisteredLight {
    entity: Arc<dyn LightEntity>,
    writer: LightStateWriter,
}

/// Owns every light entity added by a platform
pub struct LightComponent {
    entities: DashMap<String, RegisteredLight>,
    states: Arc<StateMachine>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl LightComponent {
    pub fn new(states: Arc<StateMachine>) -> Arc<Self> {
        Arc::new(Self {
            entities: DashMap::new(),
            states,
            tasks: Mutex::new(Vec::new()),
        })
    }

    /// Add platform entities
    ///
    /// Each entity gets an id generated from its name, an initial state in
    /// the state machine, and then its `added_to_hass` hook. Must run inside
    /// a Tokio runtime since entities may spawn tasks from that hook.
    pub fn add_entities(
        &self,
        entities: impl IntoIterator<Item = Arc<dyn LightEntity>>,
    ) -> Result<Vec<EntityId>, EntityIdError> {
        let mut added = Vec::new();

        for entity in entities {
            let entity_id = EntityId::generate(DOMAIN, &entity.name(), |candidate| {
                let key = candidate.to_string();
                self.entities.contains_key(&key) || self.states.contains(&key)
            })?;

            let writer = LightStateWriter::new(entity_id.clone(), self.states.clone());
            writer.write(entity.as_ref());

            self.entities.insert(
                entity_id.to_string(),
                RegisteredLight {
                    entity: entity.clone(),
                    writer: writer.clone(),
                },
            );
            if let Some(task) = entity.added_to_hass(writer) {
                if let Ok(mut tasks) = self.tasks.lock() {
                    tasks.push(task);
                }
            }

            debug!(entity_id = %entity_id, "Added light entity");
            added.push(entity_id);
        }

        if !added.is_empty() {
            info!("Added {} light entities", added.len());
        }
        Ok(added)
    }

    /// Abort every task entities started from `added_to_hass`
    pub fn stop(&self) {
        if let Ok(mut tasks) = self.tasks.lock() {
            for task in tasks.drain(..) {
                task.abort();
            }
        }
    }

    /// Look up an entity by id
    pub fn entity(&self, entity_id: &str) -> Option<Arc<dyn LightEntity>> {
        self.entities.get(entity_id).map(|r| r.entity.clone())
    }

    /// Register `light.turn_on` and `light.turn_off`
    pub fn register_services(self: &Arc<Self>, services: &ServiceRegistry) {
        let component = self.clone();
        services.register(DOMAIN, SERVICE_TURN_ON, move |call: ServiceCall| {
            let component = component.clone();
            async move { component.handle_turn_on(call).await }
        });

        let component = self.clone();
        services.register(DOMAIN, SERVICE_TURN_OFF, move |call: ServiceCall| {
            let component = component.clone();
            async move { component.handle_turn_off(call).await }
        });
    }

    async fn handle_turn_on(&self, call: ServiceCall) -> ServiceResult {
        let params: TurnOnParams = serde_json::from_value(call.service_data.clone())
            .map_err(|e| ServiceError::InvalidData(e.to_string()))?;

        for (entity, writer) in self.targets(&call) {
            entity
                .turn_on(params.clone())
                .await
                .map_err(|e| ServiceError::CallFailed(e.to_string()))?;
            if entity.should_poll() {
                writer.write_in_context(entity.as_ref(), call.context.child());
            }
        }
        Ok(())
    }

    async fn handle_turn_off(&self, call: ServiceCall) -> ServiceResult {
        let params: TurnOffParams = serde_json::from_value(call.service_data.clone())
            .map_err(|e| ServiceError::InvalidData(e.to_string()))?;

        for (entity, writer) in self.targets(&call) {
            entity
                .turn_off(params.clone())
                .await
                .map_err(|e| ServiceError::CallFailed(e.to_string()))?;
            if entity.should_poll() {
                writer.write_in_context(entity.as_ref(), call.context.child());
            }
        }
        Ok(())
    }

    /// Resolve the entities a call targets, skipping unknown ids.
    /// Handles are cloned out so no map guard is held across an await.
    fn targets(&self, call: &ServiceCall) -> Vec<(Arc<dyn LightEntity>, LightStateWriter)> {
        call.entity_ids()
            .into_iter()
            .filter_map(|entity_id| match self.entities.get(&entity_id) {
                Some(registered) => Some((registered.entity.clone(), registered.writer.clone())),
                None => {
                    warn!(entity_id = %entity_id, service = %call.service_id(), "Unknown light entity");
                    None
                }
            })
            .collect()
    }
}
