//! Registry of accessory types by name

use crate::accessories::Accessory;
use crate::error::AccessoryError;
use crate::type_switches::{create_switch, TYPE_SWITCH};
use ha_components::HomeAssistant;
use ha_core::EntityId;
use std::collections::HashMap;
use std::sync::Arc;

/// Builds an accessory from `(hass, entity_id, display_name, aid)`
pub type AccessoryFactory = fn(
    &HomeAssistant,
    EntityId,
    &str,
    u64,
) -> Result<Arc<dyn Accessory>, AccessoryError>;

/// Accessory constructors keyed by type name ("Switch", ...)
#[derive(Clone)]
pub struct AccessoryTypes {
    types: HashMap<&'static str, AccessoryFactory>,
}

impl AccessoryTypes {
    /// A registry with no types
    pub fn empty() -> Self {
        Self {
            types: HashMap::new(),
        }
    }

    pub fn register(&mut self, name: &'static str, factory: AccessoryFactory) {
        self.types.insert(name, factory);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Build an accessory of the named type
    pub fn create(
        &self,
        name: &str,
        hass: &HomeAssistant,
        entity_id: EntityId,
        display_name: &str,
        aid: u64,
    ) -> Result<Arc<dyn Accessory>, AccessoryError> {
        let factory = self
            .types
            .get(name)
            .ok_or_else(|| AccessoryError::UnknownType(name.to_string()))?;
        factory(hass, entity_id, display_name, aid)
    }
}

impl Default for AccessoryTypes {
    /// Every built-in accessory type
    fn default() -> Self {
        let mut types = Self::empty();
        types.register(TYPE_SWITCH, create_switch);
        types
    }
}
