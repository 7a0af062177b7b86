//! Accessory model shared by every HomeKit accessory type
//!
//! An accessory is a list of services, a service a list of characteristics.
//! Characteristics hold the value HomeKit sees and, for writable ones, the
//! callback that runs when a HomeKit client writes to them.

use crate::consts::{
    characteristic_format, service_characteristics, CharFormat, CHAR_MANUFACTURER, CHAR_MODEL,
    CHAR_NAME, CHAR_SERIAL_NUMBER, MANUFACTURER, SERV_ACCESSORY_INFO,
};
use crate::error::AccessoryError;
use futures::future::BoxFuture;
use ha_core::{EntityId, State};
use serde_json::Value;
use std::future::Future;
use std::sync::{Arc, RwLock};
use tracing::debug;

/// Callback invoked when a HomeKit client writes a characteristic
pub type SetterCallback =
    Arc<dyn Fn(Value) -> BoxFuture<'static, Result<(), AccessoryError>> + Send + Sync>;

/// A single HomeKit value such as `On` or `Name`
pub struct Characteristic {
    display_name: String,
    format: CharFormat,
    value: RwLock<Value>,
    setter_callback: RwLock<Option<SetterCallback>>,
}

impl Characteristic {
    pub fn new(display_name: impl Into<String>, format: CharFormat) -> Self {
        Self {
            display_name: display_name.into(),
            format,
            value: RwLock::new(format.default_value()),
            setter_callback: RwLock::new(None),
        }
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Current value
    pub fn value(&self) -> Value {
        self.value
            .read()
            .map(|v| v.clone())
            .unwrap_or_else(|_| self.format.default_value())
    }

    /// Install the callback run on client writes, replacing any previous one
    pub fn set_setter_callback<F, Fut>(&self, callback: F)
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), AccessoryError>> + Send + 'static,
    {
        let callback: SetterCallback = Arc::new(move |value| {
            Box::pin(callback(value)) as BoxFuture<'static, Result<(), AccessoryError>>
        });
        if let Ok(mut slot) = self.setter_callback.write() {
            *slot = Some(callback);
        }
    }

    /// Update the value from the host side
    ///
    /// With `should_callback` false the setter callback is not run, so a
    /// state pushed from Home Assistant never turns into a command. With it
    /// true the callback is spawned onto the runtime and not awaited.
    pub fn set_value(&self, value: Value, should_callback: bool) -> Result<(), AccessoryError> {
        self.store(value.clone())?;

        if should_callback {
            if let Some(callback) = self.callback() {
                tokio::spawn(callback(value));
            }
        }
        Ok(())
    }

    /// Handle a write coming from a HomeKit client
    ///
    /// Stores the value, then awaits the setter callback; its error is
    /// returned to the caller.
    pub async fn client_update_value(&self, value: Value) -> Result<(), AccessoryError> {
        self.store(value.clone())?;
        debug!(characteristic = %self.display_name, %value, "Client updated value");

        match self.callback() {
            Some(callback) => callback(value).await,
            None => Ok(()),
        }
    }

    fn store(&self, value: Value) -> Result<(), AccessoryError> {
        if !self.format.accepts(&value) {
            return Err(AccessoryError::InvalidValue {
                characteristic: self.display_name.clone(),
                value,
            });
        }
        if let Ok(mut current) = self.value.write() {
            *current = value;
        }
        Ok(())
    }

    fn callback(&self) -> Option<SetterCallback> {
        self.setter_callback.read().ok().and_then(|c| c.clone())
    }
}

/// A HomeKit service: a named group of characteristics
pub struct Service {
    display_name: String,
    characteristics: Vec<Arc<Characteristic>>,
}

impl Service {
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn get_characteristic(&self, name: &str) -> Option<Arc<Characteristic>> {
        self.characteristics
            .iter()
            .find(|c| c.display_name() == name)
            .cloned()
    }

    pub fn characteristics(&self) -> &[Arc<Characteristic>] {
        &self.characteristics
    }
}

/// Build a service with every characteristic its definition requires
pub fn load_service(name: &str) -> Result<Service, AccessoryError> {
    let chars = service_characteristics(name)
        .ok_or_else(|| AccessoryError::UnknownService(name.to_string()))?;

    let characteristics = chars
        .iter()
        .map(|char_name| {
            let format = characteristic_format(char_name).unwrap_or(CharFormat::String);
            Arc::new(Characteristic::new(*char_name, format))
        })
        .collect();

    Ok(Service {
        display_name: name.to_string(),
        characteristics,
    })
}

/// The parts common to every accessory mirroring a Home Assistant entity
pub struct HomeAccessory {
    display_name: String,
    entity_id: EntityId,
    category: &'static str,
    aid: u64,
    services: Vec<Arc<Service>>,
}

impl HomeAccessory {
    /// Create an accessory with its AccessoryInformation service filled in
    pub fn new(
        display_name: impl Into<String>,
        entity_id: EntityId,
        category: &'static str,
        aid: u64,
    ) -> Result<Self, AccessoryError> {
        let mut accessory = Self {
            display_name: display_name.into(),
            entity_id,
            category,
            aid,
            services: Vec::new(),
        };

        let info = accessory.add_preload_service(SERV_ACCESSORY_INFO)?;
        let values = [
            (CHAR_NAME, accessory.display_name.clone()),
            (CHAR_MANUFACTURER, MANUFACTURER.to_string()),
            (CHAR_MODEL, category.to_string()),
            (CHAR_SERIAL_NUMBER, accessory.entity_id.to_string()),
        ];
        for (name, value) in values {
            if let Some(characteristic) = info.get_characteristic(name) {
                characteristic.set_value(Value::String(value), false)?;
            }
        }

        Ok(accessory)
    }

    /// Create the named service, attach it, and return it
    pub fn add_preload_service(&mut self, name: &str) -> Result<Arc<Service>, AccessoryError> {
        let service = Arc::new(load_service(name)?);
        self.services.push(service.clone());
        Ok(service)
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn entity_id(&self) -> &EntityId {
        &self.entity_id
    }

    pub fn category(&self) -> &'static str {
        self.category
    }

    pub fn aid(&self) -> u64 {
        self.aid
    }

    pub fn services(&self) -> &[Arc<Service>] {
        &self.services
    }

    pub fn get_service(&self, name: &str) -> Option<Arc<Service>> {
        self.services
            .iter()
            .find(|s| s.display_name() == name)
            .cloned()
    }

    /// Find a characteristic by name across all services
    pub fn find_characteristic(&self, name: &str) -> Option<Arc<Characteristic>> {
        self.services
            .iter()
            .find_map(|service| service.get_characteristic(name))
    }
}

/// Behavior every accessory type provides on top of `HomeAccessory`
pub trait Accessory: Send + Sync {
    fn home_accessory(&self) -> &HomeAccessory;

    /// Mirror a Home Assistant state change onto the characteristics.
    /// `None` means the entity was removed.
    fn update_state(&self, new_state: Option<&State>);
}
