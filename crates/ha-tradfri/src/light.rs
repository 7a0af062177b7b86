//! Tradfri bulbs as Home Assistant lights

use crate::api::SharedGatewayApi;
use crate::command::{Command, LightAction, Response};
use crate::device::{Device, LightControl, LightData};
use crate::error::TradfriError;
use crate::observe::{spawn_observer, Observable, RetryPolicy};
use async_trait::async_trait;
use ha_components::color::{
    color_hs_to_rgb, color_rgb_to_xy, color_temperature_mired_to_kelvin,
};
use ha_components::light::{
    SUPPORT_BRIGHTNESS, SUPPORT_COLOR, SUPPORT_COLOR_TEMP, SUPPORT_TRANSITION,
};
use ha_components::{LightEntity, LightError, LightStateWriter, TurnOffParams, TurnOnParams};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use tokio::task::JoinHandle;
use tracing::debug;

/// Features every Tradfri light and group supports
pub const SUPPORTED_FEATURES: u32 = SUPPORT_BRIGHTNESS | SUPPORT_TRANSITION;

/// Highest dimmer value the gateway accepts
pub const MAX_DIMMER: u8 = 254;

const XY_SCALE: f64 = 65535.0;
const XY_BIAS: f64 = 0.56;

/// Host xy (0.0-1.0) to the gateway's 0-65535 scale
pub fn normalize_xy(x: f64, y: f64) -> (u32, u32) {
    (to_device_xy(x), to_device_xy(y))
}

/// Gateway xy back to the host scale
pub fn denormalize_xy(x: u32, y: u32) -> (f64, f64) {
    (f64::from(x) / XY_SCALE, f64::from(y) / XY_SCALE)
}

fn to_device_xy(value: f64) -> u32 {
    // Saturating cast: values outside 0.0-1.0 clamp to the device range
    ((value * XY_SCALE + XY_BIAS) as u32).min(XY_SCALE as u32)
}

/// Host brightness to gateway dimmer; only 255 is out of range
pub(crate) fn to_dimmer(brightness: u8) -> u8 {
    if brightness == 255 {
        MAX_DIMMER
    } else {
        brightness
    }
}

/// Transition seconds to gateway units (tenths of a second)
pub(crate) fn to_transition_time(seconds: f64) -> u32 {
    (seconds as u32).saturating_mul(10)
}

/// Everything read from the device on the last refresh
#[derive(Debug, Clone)]
struct LightSnapshot {
    device_id: u64,
    name: String,
    reachable: bool,
    control: LightControl,
    data: LightData,
    features: u32,
}

impl LightSnapshot {
    fn from_device(device: Device) -> Result<Self, TradfriError> {
        let id = device.id;
        let control = device.light_control.ok_or(TradfriError::NotALight(id))?;
        let data = control
            .lights
            .first()
            .cloned()
            .ok_or(TradfriError::NotALight(id))?;

        let mut features = SUPPORTED_FEATURES;
        if control.can_set_mireds {
            features |= SUPPORT_COLOR_TEMP;
        }
        if control.can_set_color {
            features |= SUPPORT_COLOR;
        }

        Ok(Self {
            device_id: id,
            name: device.name,
            reachable: device.reachable,
            control,
            data,
            features,
        })
    }
}

/// A Tradfri bulb or panel
///
/// Commands go straight to the gateway; the cached state only changes when
/// an observed update arrives.
pub struct TradfriLight {
    api: SharedGatewayApi,
    retry: RetryPolicy,
    snapshot: RwLock<LightSnapshot>,
    observe_exhausted: AtomicBool,
}

impl TradfriLight {
    /// Wrap a device; fails for devices without light control
    pub fn new(device: Device, api: SharedGatewayApi) -> Result<Self, TradfriError> {
        Ok(Self {
            api,
            retry: RetryPolicy::default(),
            snapshot: RwLock::new(LightSnapshot::from_device(device)?),
            observe_exhausted: AtomicBool::new(false),
        })
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn device_id(&self) -> u64 {
        self.read(|s| s.device_id)
    }

    /// Replace the cached state with a fresh device handle
    pub fn refresh(&self, device: Device) -> Result<(), TradfriError> {
        let snapshot = LightSnapshot::from_device(device)?;
        if let Ok(mut current) = self.snapshot.write() {
            *current = snapshot;
        }
        Ok(())
    }

    fn read<R: Default>(&self, f: impl FnOnce(&LightSnapshot) -> R) -> R {
        self.snapshot.read().map(|s| f(&s)).unwrap_or_default()
    }

    async fn send(&self, action: LightAction) -> Result<(), TradfriError> {
        let command = Command::Light {
            device_id: self.device_id(),
            action,
        };
        debug!("Sending {:?} to {}", command, self.name());
        self.api.execute(command).await?;
        Ok(())
    }

    async fn send_turn_on(&self, params: TurnOnParams) -> Result<(), TradfriError> {
        let (has_hex_color, can_set_kelvin) =
            self.read(|s| (s.data.hex_color.is_some(), s.control.can_set_kelvin));

        if let Some((hue, saturation)) = params.hs_color.filter(|_| has_hex_color) {
            let (red, green, blue) = color_hs_to_rgb(hue, saturation);
            self.send(LightAction::SetRgbColor { red, green, blue }).await?;
        } else if let Some(mireds) = params
            .color_temp
            .filter(|_| has_hex_color && can_set_kelvin)
        {
            let kelvin = color_temperature_mired_to_kelvin(mireds);
            self.send(LightAction::SetKelvinColor { kelvin }).await?;
        }

        let transition_time = params.transition.map(to_transition_time);
        // A brightness change carries the transition; the color change is immediate
        let color_transition = if params.brightness.is_some() {
            None
        } else {
            transition_time
        };

        let color_action = if let Some((x, y)) = params.xy_color {
            let (color_x, color_y) = normalize_xy(x, y);
            Some(LightAction::SetXyColor {
                color_x,
                color_y,
                transition_time: color_transition,
            })
        } else if let Some((red, green, blue)) = params.rgb_color {
            let (x, y) = color_rgb_to_xy(red, green, blue);
            let (color_x, color_y) = normalize_xy(x, y);
            Some(LightAction::SetXyColor {
                color_x,
                color_y,
                transition_time: color_transition,
            })
        } else {
            params.color_temp.map(|color_temp| LightAction::SetColorTemp {
                color_temp,
                transition_time: color_transition,
            })
        };
        if let Some(action) = color_action {
            self.send(action).await?;
        }

        match params.brightness {
            Some(brightness) => {
                self.send(LightAction::SetDimmer {
                    dimmer: to_dimmer(brightness),
                    transition_time,
                })
                .await
            }
            None => self.send(LightAction::SetState { state: true }).await,
        }
    }
}

#[async_trait]
impl LightEntity for TradfriLight {
    fn name(&self) -> String {
        self.read(|s| s.name.clone())
    }

    fn available(&self) -> bool {
        !self.observe_exhausted.load(Ordering::SeqCst) && self.read(|s| s.reachable)
    }

    fn should_poll(&self) -> bool {
        false
    }

    fn supported_features(&self) -> u32 {
        self.read(|s| s.features)
    }

    fn is_on(&self) -> bool {
        self.read(|s| s.data.state)
    }

    fn brightness(&self) -> Option<u8> {
        self.read(|s| Some(s.data.dimmer))
    }

    fn color_temp(&self) -> Option<u16> {
        self.read(|s| s.data.color_temp)
    }

    fn min_mireds(&self) -> Option<u16> {
        self.read(|s| Some(s.control.min_mireds))
    }

    fn max_mireds(&self) -> Option<u16> {
        self.read(|s| Some(s.control.max_mireds))
    }

    fn xy_color(&self) -> Option<(f64, f64)> {
        self.read(|s| {
            s.data
                .xy_color
                .filter(|_| s.control.can_set_color)
                .map(|(x, y)| denormalize_xy(x, y))
        })
    }

    async fn turn_on(&self, params: TurnOnParams) -> Result<(), LightError> {
        self.send_turn_on(params).await.map_err(LightError::from)
    }

    async fn turn_off(&self, _params: TurnOffParams) -> Result<(), LightError> {
        self.send(LightAction::SetState { state: false })
            .await
            .map_err(LightError::from)
    }

    fn added_to_hass(self: Arc<Self>, writer: LightStateWriter) -> Option<JoinHandle<()>> {
        Some(spawn_observer(self, writer))
    }
}

impl Observable for TradfriLight {
    fn api(&self) -> &SharedGatewayApi {
        &self.api
    }

    fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    fn observe_command(&self) -> Command {
        Command::ObserveDevice {
            device_id: self.device_id(),
        }
    }

    fn apply_update(&self, response: Response) -> Result<(), TradfriError> {
        let device = response.into_device(&self.observe_command())?;
        self.refresh(device)
    }

    fn mark_unavailable(&self) {
        self.observe_exhausted.store(true, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::GatewayApi;
    use serde_json::json;

    struct AckGateway;

    #[async_trait]
    impl GatewayApi for AckGateway {
        async fn execute(&self, _command: Command) -> Result<Response, TradfriError> {
            Ok(Response::Ack)
        }
    }

    fn device(value: serde_json::Value) -> Device {
        serde_json::from_value(value).unwrap()
    }

    fn color_bulb() -> Device {
        device(json!({
            "id": 65537,
            "name": "Living Room",
            "light_control": {
                "can_set_dimmer": true,
                "can_set_color": true,
                "can_set_mireds": true,
                "lights": [{"state": true, "dimmer": 100, "color_temp": 370, "xy_color": [32768, 16384]}]
            }
        }))
    }

    #[test]
    fn test_normalize_xy() {
        assert_eq!(normalize_xy(0.0, 0.0), (0, 0));
        assert_eq!(normalize_xy(1.0, 1.0), (65535, 65535));
        assert_eq!(normalize_xy(0.5, 0.25), (32768, 16384));
        assert_eq!(normalize_xy(-0.1, 1.5), (0, 65535));
    }

    #[test]
    fn test_xy_round_trip_within_one_step() {
        for &(x, y) in &[(0.0, 1.0), (0.3, 0.3), (0.701, 0.299), (0.123456, 0.654321)] {
            let (nx, ny) = normalize_xy(x, y);
            let (dx, dy) = denormalize_xy(nx, ny);
            assert!((dx - x).abs() <= 1.0 / 65535.0, "x {} came back as {}", x, dx);
            assert!((dy - y).abs() <= 1.0 / 65535.0, "y {} came back as {}", y, dy);
        }
    }

    #[test]
    fn test_unit_conversions() {
        assert_eq!(to_dimmer(255), 254);
        assert_eq!(to_dimmer(254), 254);
        assert_eq!(to_dimmer(0), 0);
        assert_eq!(to_transition_time(2.0), 20);
        assert_eq!(to_transition_time(2.5), 20);
        assert_eq!(to_transition_time(0.0), 0);
    }

    #[test]
    fn test_properties_from_device() {
        let light = TradfriLight::new(color_bulb(), Arc::new(AckGateway)).unwrap();

        assert_eq!(light.name(), "Living Room");
        assert!(light.available());
        assert!(!light.should_poll());
        assert!(light.is_on());
        assert_eq!(light.brightness(), Some(100));
        assert_eq!(light.color_temp(), Some(370));
        assert_eq!((light.min_mireds(), light.max_mireds()), (Some(250), Some(454)));
        assert_eq!(light.xy_color(), Some((32768.0 / 65535.0, 16384.0 / 65535.0)));
        assert_eq!(light.hs_color(), None);
        assert_eq!(
            light.supported_features(),
            SUPPORT_BRIGHTNESS | SUPPORT_TRANSITION | SUPPORT_COLOR_TEMP | SUPPORT_COLOR
        );
    }

    #[test]
    fn test_white_bulb_features_and_xy() {
        let light = TradfriLight::new(
            device(json!({
                "id": 65538,
                "name": "Hallway",
                "light_control": {"lights": [{"state": false, "dimmer": 0, "xy_color": [100, 100]}]}
            })),
            Arc::new(AckGateway),
        )
        .unwrap();

        assert_eq!(light.supported_features(), SUPPORTED_FEATURES);
        // xy is only reported when the bulb can set color
        assert_eq!(light.xy_color(), None);
    }

    #[test]
    fn test_rejects_devices_without_light_control() {
        let remote = device(json!({"id": 65536, "name": "Remote"}));
        assert!(matches!(
            TradfriLight::new(remote, Arc::new(AckGateway)),
            Err(TradfriError::NotALight(65536))
        ));

        let empty = device(json!({"id": 65539, "name": "Driver", "light_control": {"lights": []}}));
        assert!(matches!(
            TradfriLight::new(empty, Arc::new(AckGateway)),
            Err(TradfriError::NotALight(65539))
        ));
    }

    #[test]
    fn test_refresh_replaces_snapshot() {
        let light = TradfriLight::new(color_bulb(), Arc::new(AckGateway)).unwrap();

        light
            .refresh(device(json!({
                "id": 65537,
                "name": "Lounge",
                "reachable": false,
                "light_control": {"lights": [{"state": false, "dimmer": 3}]}
            })))
            .unwrap();

        assert_eq!(light.name(), "Lounge");
        assert!(!light.available());
        assert!(!light.is_on());
        assert_eq!(light.color_temp(), None);
        assert_eq!(light.supported_features(), SUPPORTED_FEATURES);
    }

    #[test]
    fn test_observe_command_and_mark_unavailable() {
        let light = TradfriLight::new(color_bulb(), Arc::new(AckGateway)).unwrap();

        assert_eq!(light.observe_command(), Command::ObserveDevice { device_id: 65537 });
        assert!(matches!(
            light.apply_update(Response::Ack),
            Err(TradfriError::UnexpectedResponse { .. })
        ));

        light.mark_unavailable();
        assert!(!light.available());
    }
}
