//! The HomeKit bridge
//!
//! Picks the entities to expose, builds one accessory per entity, keeps each
//! accessory in sync with Home Assistant, and routes client writes to the
//! right characteristic. The HAP transport in front of `client_write` lives
//! outside this crate.

use crate::accessories::Accessory;
use crate::config::HomeKitConfig;
use crate::consts::BRIDGE_AID;
use crate::error::AccessoryError;
use crate::type_switches::TYPE_SWITCH;
use crate::types::AccessoryTypes;
use ha_components::HomeAssistant;
use ha_core::events::StateChangedData;
use ha_core::{State, ATTR_FRIENDLY_NAME};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Accessory type name for an entity, if its domain is supported
pub fn accessory_type_for(domain: &str) -> Option<&'static str> {
    match domain {
        "switch" | "remote" | "input_boolean" | "script" => Some(TYPE_SWITCH),
        _ => None,
    }
}

/// Display name HomeKit shows for a state
///
/// The configured name wins, then `friendly_name`, then the object id with
/// underscores turned into spaces.
fn display_name(state: &State, config: &HomeKitConfig) -> String {
    if let Some(name) = config.name_for(&state.entity_id) {
        return name.to_string();
    }
    state
        .attribute::<String>(ATTR_FRIENDLY_NAME)
        .unwrap_or_else(|| state.entity_id.object_id().replace('_', " "))
}

/// Build the accessory for one entity
///
/// Returns `Ok(None)` for domains HomeKit has no accessory type for.
pub fn get_accessory(
    hass: &HomeAssistant,
    types: &AccessoryTypes,
    state: &State,
    aid: u64,
    config: &HomeKitConfig,
) -> Result<Option<Arc<dyn Accessory>>, AccessoryError> {
    let Some(type_name) = accessory_type_for(state.entity_id.domain()) else {
        debug!("{}: No HomeKit accessory type for this domain", state.entity_id);
        return Ok(None);
    };

    let name = display_name(state, config);
    debug!("{}: Creating {} accessory '{}' with aid {}", state.entity_id, type_name, name, aid);
    types
        .create(type_name, hass, state.entity_id.clone(), &name, aid)
        .map(Some)
}

/// A bridge exposing a set of entities as HomeKit accessories
pub struct HomeKit {
    hass: HomeAssistant,
    config: HomeKitConfig,
    accessories: BTreeMap<u64, Arc<dyn Accessory>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl HomeKit {
    /// Build accessories for every current entity that passes the filter
    ///
    /// Aids are handed out from 2 upward in entity id order, so the same set
    /// of entities always gets the same aids.
    pub fn new(hass: HomeAssistant, config: HomeKitConfig) -> Result<Self, AccessoryError> {
        Self::with_types(hass, config, &AccessoryTypes::default())
    }

    /// Like `new`, with a caller-provided type registry
    pub fn with_types(
        hass: HomeAssistant,
        config: HomeKitConfig,
        types: &AccessoryTypes,
    ) -> Result<Self, AccessoryError> {
        let mut states: Vec<State> = hass
            .states
            .all()
            .into_iter()
            .filter(|s| config.filter.matches(&s.entity_id))
            .collect();
        states.sort_by(|a, b| a.entity_id.cmp(&b.entity_id));

        let mut accessories = BTreeMap::new();
        let mut next_aid = BRIDGE_AID + 1;
        for state in &states {
            if let Some(accessory) = get_accessory(&hass, types, state, next_aid, &config)? {
                accessories.insert(next_aid, accessory);
                next_aid += 1;
            }
        }

        info!("HomeKit bridge on port {} with {} accessories", config.port, accessories.len());
        Ok(Self {
            hass,
            config,
            accessories,
            tasks: Mutex::new(Vec::new()),
        })
    }

    pub fn config(&self) -> &HomeKitConfig {
        &self.config
    }

    pub fn accessory(&self, aid: u64) -> Option<Arc<dyn Accessory>> {
        self.accessories.get(&aid).cloned()
    }

    /// All accessories ordered by aid
    pub fn accessories(&self) -> impl Iterator<Item = &Arc<dyn Accessory>> {
        self.accessories.values()
    }

    /// Start mirroring Home Assistant state onto every accessory
    ///
    /// Each accessory receives the entity's current state before this
    /// returns, then every later STATE_CHANGED for that entity from its
    /// tracking task. Must run inside a Tokio runtime.
    pub fn start(&self) {
        let Ok(mut tasks) = self.tasks.lock() else {
            return;
        };
        if !tasks.is_empty() {
            debug!("HomeKit bridge already started");
            return;
        }

        for accessory in self.accessories.values() {
            // Subscribe before reading the current state so no change is lost
            let mut rx = self.hass.bus.subscribe_typed::<StateChangedData>();
            let entity_id = accessory.home_accessory().entity_id().clone();
            // Applied before spawning so a write right after start keeps its flag
            let current = self.hass.states.get(&entity_id.to_string());
            accessory.update_state(current.as_ref());
            let accessory = accessory.clone();

            tasks.push(tokio::spawn(async move {
                loop {
                    match rx.recv().await {
                        Ok(event) if event.data.entity_id == entity_id => {
                            accessory.update_state(event.data.new_state.as_ref());
                        }
                        Ok(_) => {}
                        Err(RecvError::Lagged(skipped)) => {
                            warn!("{}: Missed {} state changes", entity_id, skipped);
                        }
                        Err(RecvError::Closed) => break,
                    }
                }
            }));
        }
    }

    /// Stop mirroring state
    pub fn stop(&self) {
        if let Ok(mut tasks) = self.tasks.lock() {
            for task in tasks.drain(..) {
                task.abort();
            }
        }
    }

    /// Apply a write from a HomeKit client
    ///
    /// Errors from the characteristic's callback (a failed service call, for
    /// example) are returned to the caller.
    pub async fn client_write(
        &self,
        aid: u64,
        characteristic: &str,
        value: Value,
    ) -> Result<(), AccessoryError> {
        let accessory = self
            .accessories
            .get(&aid)
            .ok_or(AccessoryError::UnknownAccessory(aid))?;
        let target = accessory
            .home_accessory()
            .find_characteristic(characteristic)
            .ok_or_else(|| AccessoryError::UnknownCharacteristic {
                aid,
                characteristic: characteristic.to_string(),
            })?;

        target.client_update_value(value).await
    }
}

impl Drop for HomeKit {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ha_core::Context;
    use serde_json::json;
    use std::collections::HashMap;

    fn set(hass: &HomeAssistant, entity_id: &str, value: &str, name: Option<&str>) {
        let mut attributes = HashMap::new();
        if let Some(name) = name {
            attributes.insert(ATTR_FRIENDLY_NAME.to_string(), json!(name));
        }
        hass.states
            .set(entity_id.parse().unwrap(), value, attributes, Context::new());
    }

    #[test]
    fn test_accessory_type_for() {
        assert_eq!(accessory_type_for("switch"), Some("Switch"));
        assert_eq!(accessory_type_for("remote"), Some("Switch"));
        assert_eq!(accessory_type_for("input_boolean"), Some("Switch"));
        assert_eq!(accessory_type_for("script"), Some("Switch"));
        assert_eq!(accessory_type_for("sensor"), None);
    }

    #[test]
    fn test_aids_follow_entity_order() {
        let hass = HomeAssistant::new();
        set(&hass, "switch.zebra", "off", None);
        set(&hass, "sensor.temperature", "21", None);
        set(&hass, "input_boolean.away", "on", Some("Away Mode"));
        set(&hass, "switch.kitchen", "on", None);

        let homekit = HomeKit::new(hass, HomeKitConfig::default()).unwrap();

        let names: Vec<(u64, String)> = homekit
            .accessories()
            .map(|a| {
                let home = a.home_accessory();
                (home.aid(), home.display_name().to_string())
            })
            .collect();
        assert_eq!(
            names,
            vec![
                (2, "Away Mode".to_string()),
                (3, "kitchen".to_string()),
                (4, "zebra".to_string()),
            ]
        );
    }

    #[test]
    fn test_filter_and_name_override() {
        let hass = HomeAssistant::new();
        set(&hass, "switch.kitchen", "on", Some("Kitchen"));
        set(&hass, "switch.garage", "off", None);

        let config: HomeKitConfig = serde_yaml::from_str(
            r#"
filter:
  exclude_entities: [switch.garage]
entity_config:
  switch.kitchen:
    name: Coffee Maker
"#,
        )
        .unwrap();
        let homekit = HomeKit::new(hass, config).unwrap();

        let all: Vec<_> = homekit.accessories().collect();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].home_accessory().display_name(), "Coffee Maker");
    }

    #[tokio::test]
    async fn test_client_write_unknown_targets() {
        let hass = HomeAssistant::new();
        set(&hass, "switch.kitchen", "on", None);
        let homekit = HomeKit::new(hass, HomeKitConfig::default()).unwrap();

        assert!(matches!(
            homekit.client_write(9, "On", json!(true)).await,
            Err(AccessoryError::UnknownAccessory(9))
        ));
        assert!(matches!(
            homekit.client_write(2, "Brightness", json!(50)).await,
            Err(AccessoryError::UnknownCharacteristic { aid: 2, .. })
        ));
    }
}
