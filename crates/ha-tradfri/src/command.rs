//! Commands sent to the gateway and what it answers

use crate::device::{Device, Group};
use crate::error::TradfriError;
use serde::Serialize;

/// A single request to the gateway
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    ListDevices,
    GetDevice { device_id: u64 },
    ListGroups,
    GetGroup { group_id: u64 },
    /// Resolves with the device once its state next changes
    ObserveDevice { device_id: u64 },
    /// Resolves with the group once its state next changes
    ObserveGroup { group_id: u64 },
    Light { device_id: u64, action: LightAction },
    Group { group_id: u64, action: GroupAction },
}

/// Changes applied to the first light of a device
///
/// `transition_time` is in tenths of a second.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum LightAction {
    SetState {
        state: bool,
    },
    SetDimmer {
        dimmer: u8,
        #[serde(skip_serializing_if = "Option::is_none")]
        transition_time: Option<u32>,
    },
    SetXyColor {
        color_x: u32,
        color_y: u32,
        #[serde(skip_serializing_if = "Option::is_none")]
        transition_time: Option<u32>,
    },
    SetRgbColor {
        red: u8,
        green: u8,
        blue: u8,
    },
    SetKelvinColor {
        kelvin: u32,
    },
    SetColorTemp {
        color_temp: u16,
        #[serde(skip_serializing_if = "Option::is_none")]
        transition_time: Option<u32>,
    },
}

/// Changes applied to every member of a group
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum GroupAction {
    /// 0 is off, 1 is on
    SetState { state: u8 },
    SetDimmer {
        dimmer: u8,
        #[serde(skip_serializing_if = "Option::is_none")]
        transition_time: Option<u32>,
    },
}

/// What the gateway answered
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// The command was applied, nothing to return
    Ack,
    DeviceIds(Vec<u64>),
    GroupIds(Vec<u64>),
    Device(Device),
    Group(Group),
}

impl Response {
    pub fn into_ids(self, command: &Command) -> Result<Vec<u64>, TradfriError> {
        match self {
            Response::DeviceIds(ids) | Response::GroupIds(ids) => Ok(ids),
            other => Err(other.unexpected(command)),
        }
    }

    pub fn into_device(self, command: &Command) -> Result<Device, TradfriError> {
        match self {
            Response::Device(device) => Ok(device),
            other => Err(other.unexpected(command)),
        }
    }

    pub fn into_group(self, command: &Command) -> Result<Group, TradfriError> {
        match self {
            Response::Group(group) => Ok(group),
            other => Err(other.unexpected(command)),
        }
    }

    fn unexpected(&self, command: &Command) -> TradfriError {
        TradfriError::UnexpectedResponse {
            command: format!("{:?}", command),
            response: format!("{:?}", self),
        }
    }
}
