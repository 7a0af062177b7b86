//! Service call type for invoking Home Assistant services

use crate::{Context, ATTR_ENTITY_ID};
use serde::{Deserialize, Serialize};

/// A call to a Home Assistant service such as `switch.turn_on`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceCall {
    /// The domain the service belongs to (e.g., "light", "switch")
    pub domain: String,

    /// The service name (e.g., "turn_on", "turn_off")
    pub service: String,

    /// Data passed to the service (entity_id, brightness, colors, ...)
    pub service_data: serde_json::Value,

    /// Context tracking who initiated this call
    pub context: Context,
}

impl ServiceCall {
    /// Create a new service call
    pub fn new(
        domain: impl Into<String>,
        service: impl Into<String>,
        service_data: serde_json::Value,
        context: Context,
    ) -> Self {
        Self {
            domain: domain.into(),
            service: service.into(),
            service_data,
            context,
        }
    }

    /// Get the full service identifier (domain.service)
    pub fn service_id(&self) -> String {
        format!("{}.{}", self.domain, self.service)
    }

    /// Get entity_id(s) from service data, accepting a string or a list
    pub fn entity_ids(&self) -> Vec<String> {
        match self.service_data.get(ATTR_ENTITY_ID) {
            Some(serde_json::Value::String(s)) => vec![s.clone()],
            Some(serde_json::Value::Array(arr)) => arr
                .iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect(),
            _ => vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_service_id() {
        let call = ServiceCall::new(
            "switch",
            "turn_on",
            json!({"entity_id": "switch.kitchen"}),
            Context::new(),
        );
        assert_eq!(call.service_id(), "switch.turn_on");
    }

    #[test]
    fn test_entity_ids_forms() {
        let single = ServiceCall::new(
            "light",
            "turn_off",
            json!({"entity_id": "light.desk"}),
            Context::new(),
        );
        assert_eq!(single.entity_ids(), vec!["light.desk"]);

        let many = ServiceCall::new(
            "light",
            "turn_off",
            json!({"entity_id": ["light.desk", "light.hall"]}),
            Context::new(),
        );
        assert_eq!(many.entity_ids(), vec!["light.desk", "light.hall"]);

        let none = ServiceCall::new("light", "turn_off", json!({}), Context::new());
        assert!(none.entity_ids().is_empty());
    }
}
