//! Configuration for the `homekit:` section

use crate::consts::DEFAULT_PORT;
use crate::error::ConfigError;
use ha_core::EntityId;
use serde::Deserialize;
use std::collections::HashMap;

/// HomeKit bridge configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HomeKitConfig {
    /// Port of the accessory server
    #[serde(default = "default_port")]
    pub port: u16,
    /// Which entities get an accessory
    #[serde(default)]
    pub filter: EntityFilter,
    /// Per-entity overrides
    #[serde(default)]
    pub entity_config: HashMap<EntityId, EntityConfig>,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl Default for HomeKitConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            filter: EntityFilter::default(),
            entity_config: HashMap::new(),
        }
    }
}

impl HomeKitConfig {
    /// Parse and validate the section from a YAML value
    pub fn from_yaml(value: serde_yaml::Value) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_value(value)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidValue {
                key: "port".to_string(),
                reason: "must be between 1 and 65535".to_string(),
            });
        }
        Ok(())
    }

    /// Display name override for an entity
    pub fn name_for(&self, entity_id: &EntityId) -> Option<&str> {
        self.entity_config
            .get(entity_id)
            .and_then(|c| c.name.as_deref())
    }
}

/// Per-entity settings
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EntityConfig {
    #[serde(default)]
    pub name: Option<String>,
}

/// Include/exclude rules deciding which entities are exposed
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EntityFilter {
    #[serde(default)]
    pub include_domains: Vec<String>,
    #[serde(default)]
    pub include_entities: Vec<EntityId>,
    #[serde(default)]
    pub exclude_domains: Vec<String>,
    #[serde(default)]
    pub exclude_entities: Vec<EntityId>,
}

impl EntityFilter {
    /// Whether `entity_id` passes the filter
    ///
    /// Explicit entity lists win over domain lists. With include domains set
    /// only those domains pass; with only included entities nothing else
    /// passes; otherwise everything not excluded passes.
    pub fn matches(&self, entity_id: &EntityId) -> bool {
        if self.include_entities.contains(entity_id) {
            return true;
        }
        if self.exclude_entities.contains(entity_id) {
            return false;
        }

        let domain = entity_id.domain();
        if !self.include_domains.is_empty() {
            return self.include_domains.iter().any(|d| d == domain);
        }
        if !self.include_entities.is_empty() && self.exclude_domains.is_empty() {
            return false;
        }
        !self.exclude_domains.iter().any(|d| d == domain)
    }
}
