//! HomeKit service, characteristic, and category names

/// Default TCP port of the accessory server
pub const DEFAULT_PORT: u16 = 51827;

/// Accessory id of the bridge itself; bridged accessories start after it
pub const BRIDGE_AID: u64 = 1;

pub const MANUFACTURER: &str = "Home Assistant";

// #### Categories ####
pub const CATEGORY_BRIDGE: &str = "BRIDGE";
pub const CATEGORY_SWITCH: &str = "SWITCH";

// #### Services ####
pub const SERV_ACCESSORY_INFO: &str = "AccessoryInformation";
pub const SERV_SWITCH: &str = "Switch";

// #### Characteristics ####
pub const CHAR_MANUFACTURER: &str = "Manufacturer";
pub const CHAR_MODEL: &str = "Model";
pub const CHAR_NAME: &str = "Name";
pub const CHAR_ON: &str = "On";
pub const CHAR_SERIAL_NUMBER: &str = "SerialNumber";

/// Value format of a characteristic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharFormat {
    Bool,
    String,
}

impl CharFormat {
    /// Whether a JSON value is acceptable for this format
    pub fn accepts(self, value: &serde_json::Value) -> bool {
        match self {
            CharFormat::Bool => value.is_boolean(),
            CharFormat::String => value.is_string(),
        }
    }

    /// Value a fresh characteristic of this format starts with
    pub fn default_value(self) -> serde_json::Value {
        match self {
            CharFormat::Bool => serde_json::Value::Bool(false),
            CharFormat::String => serde_json::Value::String(String::new()),
        }
    }
}

const ACCESSORY_INFO_CHARS: &[&str] = &[CHAR_NAME, CHAR_MANUFACTURER, CHAR_MODEL, CHAR_SERIAL_NUMBER];
const SWITCH_CHARS: &[&str] = &[CHAR_ON];

/// Characteristics a service is created with
pub fn service_characteristics(service: &str) -> Option<&'static [&'static str]> {
    match service {
        SERV_ACCESSORY_INFO => Some(ACCESSORY_INFO_CHARS),
        SERV_SWITCH => Some(SWITCH_CHARS),
        _ => None,
    }
}

/// Format of a known characteristic
pub fn characteristic_format(characteristic: &str) -> Option<CharFormat> {
    match characteristic {
        CHAR_ON => Some(CharFormat::Bool),
        CHAR_NAME | CHAR_MANUFACTURER | CHAR_MODEL | CHAR_SERIAL_NUMBER => Some(CharFormat::String),
        _ => None,
    }
}
