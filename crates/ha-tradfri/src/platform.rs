//! Platform setup: discover gateway lights and groups

use crate::api::SharedGatewayApi;
use crate::command::Command;
use crate::config::TradfriConfig;
use crate::error::TradfriError;
use crate::group::TradfriGroup;
use crate::light::TradfriLight;
use ha_components::{LightComponent, LightEntity};
use ha_core::EntityId;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Add every light (and, if allowed, every group) on the gateway
///
/// Devices without light control, or whose light control lists no
/// lights, are skipped. Returns the entity ids the
/// light component assigned.
pub async fn async_setup_platform(
    api: SharedGatewayApi,
    config: &TradfriConfig,
    lights: &LightComponent,
) -> Result<Vec<EntityId>, TradfriError> {
    let retry = config.observe.retry_policy();
    let mut entities: Vec<Arc<dyn LightEntity>> = Vec::new();

    let command = Command::ListDevices;
    let device_ids = api.execute(command.clone()).await?.into_ids(&command)?;
    for device_id in device_ids {
        let command = Command::GetDevice { device_id };
        let device = api.execute(command.clone()).await?.into_device(&command)?;

        if !device.has_light_control() {
            debug!("Skipping Tradfri device {} ({}), not a light", device.name, device_id);
            continue;
        }
        let name = device.name.clone();
        match TradfriLight::new(device, api.clone()) {
            Ok(light) => entities.push(Arc::new(light.with_retry_policy(retry))),
            Err(TradfriError::NotALight(id)) => {
                warn!("Skipping Tradfri device {} ({}), it reports no lights", name, id);
            }
            Err(err) => return Err(err),
        }
    }
    let light_count = entities.len();

    if config.allow_tradfri_groups {
        let command = Command::ListGroups;
        let group_ids = api.execute(command.clone()).await?.into_ids(&command)?;
        for group_id in group_ids {
            let command = Command::GetGroup { group_id };
            let group = api.execute(command.clone()).await?.into_group(&command)?;
            entities.push(Arc::new(
                TradfriGroup::new(group, api.clone()).with_retry_policy(retry),
            ));
        }
    }

    info!(
        "Found {} Tradfri lights and {} groups on {}",
        light_count,
        entities.len() - light_count,
        config.host
    );
    lights.add_entities(entities).map_err(TradfriError::from)
}
