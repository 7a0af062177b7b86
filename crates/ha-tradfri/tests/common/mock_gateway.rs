//! In-memory gateway
//!
//! Answers list/get commands from its device and group tables, records
//! every light and group command, and plays back scripted observe results.
//! Once the script runs out, observe commands never resolve.

use async_trait::async_trait;
use ha_tradfri::{Command, Device, GatewayApi, Group, GroupAction, LightAction, Response, TradfriError};
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Default)]
pub struct MockGateway {
    devices: Mutex<BTreeMap<u64, Device>>,
    groups: Mutex<BTreeMap<u64, Group>>,
    sent: Mutex<Vec<Command>>,
    observe_script: Mutex<VecDeque<Result<Response, String>>>,
    observe_calls: AtomicUsize,
    offline: AtomicBool,
}

impl MockGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add_device(&self, device: Device) {
        self.devices.lock().unwrap().insert(device.id, device);
    }

    pub fn add_group(&self, group: Group) {
        self.groups.lock().unwrap().insert(group.id, group);
    }

    /// Queue the result of the next observe command
    pub fn script_observe(&self, result: Result<Response, &str>) {
        self.observe_script
            .lock()
            .unwrap()
            .push_back(result.map_err(str::to_string));
    }

    /// Fail every command from now on
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn observe_calls(&self) -> usize {
        self.observe_calls.load(Ordering::SeqCst)
    }

    pub fn sent(&self) -> Vec<Command> {
        self.sent.lock().unwrap().clone()
    }

    /// Actions sent to one device, in order
    pub fn light_actions(&self, id: u64) -> Vec<LightAction> {
        self.sent()
            .into_iter()
            .filter_map(|command| match command {
                Command::Light { device_id, action } if device_id == id => Some(action),
                _ => None,
            })
            .collect()
    }

    /// Actions sent to one group, in order
    pub fn group_actions(&self, id: u64) -> Vec<GroupAction> {
        self.sent()
            .into_iter()
            .filter_map(|command| match command {
                Command::Group { group_id, action } if group_id == id => Some(action),
                _ => None,
            })
            .collect()
    }

    fn not_found(what: &str, id: u64) -> TradfriError {
        TradfriError::Gateway(format!("{} {} not found", what, id))
    }
}

#[async_trait]
impl GatewayApi for MockGateway {
    async fn execute(&self, command: Command) -> Result<Response, TradfriError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(TradfriError::Gateway("gateway offline".to_string()));
        }

        match command {
            Command::ListDevices => Ok(Response::DeviceIds(
                self.devices.lock().unwrap().keys().copied().collect(),
            )),
            Command::GetDevice { device_id } => self
                .devices
                .lock()
                .unwrap()
                .get(&device_id)
                .cloned()
                .map(Response::Device)
                .ok_or_else(|| Self::not_found("device", device_id)),
            Command::ListGroups => Ok(Response::GroupIds(
                self.groups.lock().unwrap().keys().copied().collect(),
            )),
            Command::GetGroup { group_id } => self
                .groups
                .lock()
                .unwrap()
                .get(&group_id)
                .cloned()
                .map(Response::Group)
                .ok_or_else(|| Self::not_found("group", group_id)),
            Command::ObserveDevice { .. } | Command::ObserveGroup { .. } => {
                self.observe_calls.fetch_add(1, Ordering::SeqCst);
                let next = self.observe_script.lock().unwrap().pop_front();
                match next {
                    Some(result) => result.map_err(TradfriError::Gateway),
                    None => std::future::pending().await,
                }
            }
            command @ (Command::Light { .. } | Command::Group { .. }) => {
                self.sent.lock().unwrap().push(command);
                Ok(Response::Ack)
            }
        }
    }
}
