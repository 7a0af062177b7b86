//! The host instance integrations are handed

use ha_event_bus::EventBus;
use ha_service_registry::ServiceRegistry;
use ha_state_machine::StateMachine;
use std::sync::Arc;

/// Bus, states, and services of one running instance
///
/// Every clone shares the same three parts.
#[derive(Clone)]
pub struct HomeAssistant {
    pub bus: Arc<EventBus>,
    /// Fires STATE_CHANGED on `bus` for every write
    pub states: Arc<StateMachine>,
    pub services: Arc<ServiceRegistry>,
}

impl HomeAssistant {
    pub fn new() -> Self {
        let bus = Arc::new(EventBus::new());
        Self {
            states: Arc::new(StateMachine::new(bus.clone())),
            services: Arc::new(ServiceRegistry::new()),
            bus,
        }
    }
}

impl Default for HomeAssistant {
    fn default() -> Self {
        Self::new()
    }
}
