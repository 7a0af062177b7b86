//! Tradfri groups as Home Assistant lights

use crate::api::SharedGatewayApi;
use crate::command::{Command, GroupAction, Response};
use crate::device::Group;
use crate::error::TradfriError;
use crate::light::{to_dimmer, to_transition_time, SUPPORTED_FEATURES};
use crate::observe::{spawn_observer, Observable, RetryPolicy};
use async_trait::async_trait;
use ha_components::{LightEntity, LightError, LightStateWriter, TurnOffParams, TurnOnParams};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use tokio::task::JoinHandle;
use tracing::debug;

/// A gateway group, switched and dimmed as one light
pub struct TradfriGroup {
    api: SharedGatewayApi,
    retry: RetryPolicy,
    group: RwLock<Group>,
    observe_exhausted: AtomicBool,
}

impl TradfriGroup {
    pub fn new(group: Group, api: SharedGatewayApi) -> Self {
        Self {
            api,
            retry: RetryPolicy::default(),
            group: RwLock::new(group),
            observe_exhausted: AtomicBool::new(false),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn group_id(&self) -> u64 {
        self.read(|g| g.id)
    }

    /// Replace the cached group
    pub fn refresh(&self, group: Group) {
        if let Ok(mut current) = self.group.write() {
            *current = group;
        }
    }

    fn read<R: Default>(&self, f: impl FnOnce(&Group) -> R) -> R {
        self.group.read().map(|g| f(&g)).unwrap_or_default()
    }

    async fn send(&self, action: GroupAction) -> Result<(), TradfriError> {
        let command = Command::Group {
            group_id: self.group_id(),
            action,
        };
        debug!("Sending {:?} to group {}", command, self.name());
        self.api.execute(command).await?;
        Ok(())
    }
}

#[async_trait]
impl LightEntity for TradfriGroup {
    fn name(&self) -> String {
        self.read(|g| g.name.clone())
    }

    fn available(&self) -> bool {
        !self.observe_exhausted.load(Ordering::SeqCst)
    }

    fn should_poll(&self) -> bool {
        false
    }

    fn supported_features(&self) -> u32 {
        SUPPORTED_FEATURES
    }

    fn is_on(&self) -> bool {
        self.read(|g| g.state)
    }

    fn brightness(&self) -> Option<u8> {
        self.read(|g| Some(g.dimmer))
    }

    async fn turn_on(&self, params: TurnOnParams) -> Result<(), LightError> {
        let action = match params.brightness {
            Some(brightness) => GroupAction::SetDimmer {
                dimmer: to_dimmer(brightness),
                transition_time: params.transition.map(to_transition_time),
            },
            None => GroupAction::SetState { state: 1 },
        };
        self.send(action).await.map_err(LightError::from)
    }

    async fn turn_off(&self, _params: TurnOffParams) -> Result<(), LightError> {
        self.send(GroupAction::SetState { state: 0 })
            .await
            .map_err(LightError::from)
    }

    fn added_to_hass(self: Arc<Self>, writer: LightStateWriter) -> Option<JoinHandle<()>> {
        Some(spawn_observer(self, writer))
    }
}

impl Observable for TradfriGroup {
    fn api(&self) -> &SharedGatewayApi {
        &self.api
    }

    fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    fn observe_command(&self) -> Command {
        Command::ObserveGroup {
            group_id: self.group_id(),
        }
    }

    fn apply_update(&self, response: Response) -> Result<(), TradfriError> {
        let group = response.into_group(&self.observe_command())?;
        self.refresh(group);
        Ok(())
    }

    fn mark_unavailable(&self) {
        self.observe_exhausted.store(true, Ordering::SeqCst);
    }
}
