//! Switch accessory
//!
//! Bridges the HomeKit `On` characteristic to the generic `turn_on` and
//! `turn_off` services of the entity's domain. A write from HomeKit sets
//! `flag_target_state` so the state change it causes is not pushed back to
//! the characteristic it came from.

use crate::accessories::{Accessory, Characteristic, HomeAccessory};
use crate::consts::{CATEGORY_SWITCH, CHAR_ON, SERV_SWITCH};
use crate::error::AccessoryError;
use ha_components::HomeAssistant;
use ha_core::{Context, EntityId, State, ATTR_ENTITY_ID, SERVICE_TURN_OFF, SERVICE_TURN_ON};
use ha_service_registry::ServiceRegistry;
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Type name this accessory is registered under
pub const TYPE_SWITCH: &str = "Switch";

/// A HomeKit switch mirroring any on/off entity
pub struct Switch {
    accessory: HomeAccessory,
    services: Arc<ServiceRegistry>,
    entity_id: EntityId,
    domain: String,
    flag_target_state: AtomicBool,
    char_on: Arc<Characteristic>,
}

impl Switch {
    /// Create the accessory and hook `set_state` up to the `On` characteristic
    pub fn new(
        hass: &HomeAssistant,
        entity_id: EntityId,
        display_name: &str,
        aid: u64,
    ) -> Result<Arc<Self>, AccessoryError> {
        let mut accessory = HomeAccessory::new(display_name, entity_id.clone(), CATEGORY_SWITCH, aid)?;

        let serv_switch = accessory.add_preload_service(SERV_SWITCH)?;
        let char_on = serv_switch.get_characteristic(CHAR_ON).ok_or_else(|| {
            AccessoryError::UnknownCharacteristic {
                aid,
                characteristic: CHAR_ON.to_string(),
            }
        })?;
        char_on.set_value(Value::Bool(false), false)?;

        let switch = Arc::new(Self {
            accessory,
            services: hass.services.clone(),
            domain: entity_id.domain().to_string(),
            entity_id,
            flag_target_state: AtomicBool::new(false),
            char_on,
        });

        let weak = Arc::downgrade(&switch);
        switch.char_on.set_setter_callback(move |value: Value| {
            let weak = weak.clone();
            async move {
                let Some(switch) = weak.upgrade() else {
                    return Ok(());
                };
                let value = value.as_bool().ok_or_else(|| AccessoryError::InvalidValue {
                    characteristic: CHAR_ON.to_string(),
                    value: value.clone(),
                })?;
                switch.set_state(value).await
            }
        });

        Ok(switch)
    }

    /// Move the entity to `value` on behalf of a HomeKit client
    ///
    /// Errors from the service call are returned as is.
    pub async fn set_state(&self, value: bool) -> Result<(), AccessoryError> {
        debug!("{}: Set switch state to {}", self.entity_id, value);
        self.flag_target_state.store(true, Ordering::SeqCst);

        let service = if value { SERVICE_TURN_ON } else { SERVICE_TURN_OFF };
        let mut data = Map::new();
        data.insert(ATTR_ENTITY_ID.to_string(), Value::String(self.entity_id.to_string()));
        self.services
            .call(&self.domain, service, Value::Object(data), Context::new())
            .await?;
        Ok(())
    }

    /// Whether a HomeKit-originated command is waiting for its state change
    pub fn flag_target_state(&self) -> bool {
        self.flag_target_state.load(Ordering::SeqCst)
    }

    /// The `On` characteristic
    pub fn char_on(&self) -> &Arc<Characteristic> {
        &self.char_on
    }
}

impl Accessory for Switch {
    fn home_accessory(&self) -> &HomeAccessory {
        &self.accessory
    }

    fn update_state(&self, new_state: Option<&State>) {
        let Some(new_state) = new_state else {
            return;
        };

        let current_state = new_state.is_on();
        if !self.flag_target_state.load(Ordering::SeqCst) {
            debug!("{}: Set current state to {}", self.entity_id, current_state);
            if let Err(err) = self.char_on.set_value(Value::Bool(current_state), false) {
                warn!("{}: Failed to push state: {}", self.entity_id, err);
            }
        }

        self.flag_target_state.store(false, Ordering::SeqCst);
    }
}

/// Factory registered under [`TYPE_SWITCH`]
pub(crate) fn create_switch(
    hass: &HomeAssistant,
    entity_id: EntityId,
    display_name: &str,
    aid: u64,
) -> Result<Arc<dyn Accessory>, AccessoryError> {
    let switch: Arc<dyn Accessory> = Switch::new(hass, entity_id, display_name, aid)?;
    Ok(switch)
}
