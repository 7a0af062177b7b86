//! Core types for Home Assistant
//!
//! The fundamental types shared by the host framework and the integrations
//! built on it: EntityId, State, Event, Context, and ServiceCall, plus the
//! handful of constants every integration speaks in.

mod context;
mod entity_id;
mod event;
mod service_call;
mod state;

pub use context::Context;
pub use entity_id::{slugify, EntityId, EntityIdError};
pub use event::{Event, EventData, EventType};
pub use service_call::ServiceCall;
pub use state::State;

/// State value of an entity that is switched on
pub const STATE_ON: &str = "on";

/// State value of an entity that is switched off
pub const STATE_OFF: &str = "off";

/// State value of an entity the integration cannot reach
pub const STATE_UNAVAILABLE: &str = "unavailable";

/// Generic service to switch an entity on
pub const SERVICE_TURN_ON: &str = "turn_on";

/// Generic service to switch an entity off
pub const SERVICE_TURN_OFF: &str = "turn_off";

/// Service data key holding the targeted entity id(s)
pub const ATTR_ENTITY_ID: &str = "entity_id";

/// Attribute key for the display name of an entity
pub const ATTR_FRIENDLY_NAME: &str = "friendly_name";

/// Attribute key for the supported-feature bitmask of an entity
pub const ATTR_SUPPORTED_FEATURES: &str = "supported_features";

/// Standard event types used by Home Assistant
pub mod events {
    use super::*;

    /// Event type for state changes
    pub const STATE_CHANGED: &str = "state_changed";

    /// Data for STATE_CHANGED events
    #[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
    pub struct StateChangedData {
        pub entity_id: EntityId,
        pub old_state: Option<State>,
        pub new_state: Option<State>,
    }

    impl EventData for StateChangedData {
        fn event_type() -> &'static str {
            STATE_CHANGED
        }
    }
}
