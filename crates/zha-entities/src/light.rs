//! Light entity adapter
//!
//! Wraps an endpoint carrying the OnOff cluster, plus optionally Level
//! Control and Color Control, into a dimmable color light. Cached state
//! follows the device through polled reads and issued commands; reads go
//! through the absorbing safe-read path so a flaky bulb degrades to stale
//! state instead of errors.

use crate::color;
use crate::features::LightFeatures;
use crate::platform::SharedPlatform;
use std::sync::RwLock;
use tokio::sync::Mutex;
use tracing::debug;
use zha_core::zcl::{cluster, color as zcl_color, level, on_off};
use zha_core::{AttributeValue, EntityId, EntityIdError, OnOffState};
use zha_quirks::SharedQuirkRegistry;
use zha_transport::{safe_read, ClusterCommand, DiscoveryInfo, SharedEndpoint, TransportError};

/// Default transition duration in seconds when a call gives none
pub const DEFAULT_TRANSITION: f64 = 0.5;

/// Parameters for a turn_on call
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TurnOn {
    /// Transition duration in seconds
    pub transition: Option<f64>,
    /// Target brightness, 0..=255
    pub brightness: Option<u8>,
    /// Target color temperature in mireds
    pub color_temp: Option<u16>,
    /// Target color as xy coordinates; takes precedence over `rgb_color`
    pub xy_color: Option<(f64, f64)>,
    /// Target color as RGB, converted to xy before sending
    pub rgb_color: Option<(u8, u8, u8)>,
}

impl TurnOn {
    pub fn with_transition(mut self, seconds: f64) -> Self {
        self.transition = Some(seconds);
        self
    }

    pub fn with_brightness(mut self, brightness: u8) -> Self {
        self.brightness = Some(brightness);
        self
    }

    pub fn with_color_temp(mut self, mireds: u16) -> Self {
        self.color_temp = Some(mireds);
        self
    }

    pub fn with_xy_color(mut self, x: f64, y: f64) -> Self {
        self.xy_color = Some((x, y));
        self
    }

    pub fn with_rgb_color(mut self, red: u8, green: u8, blue: u8) -> Self {
        self.rgb_color = Some((red, green, blue));
        self
    }

    /// Whether this call only adjusts color temperature. Such a call does
    /// not switch the light on.
    fn is_color_temp_only(&self) -> bool {
        self.color_temp.is_some()
            && self.brightness.is_none()
            && self.xy_color.is_none()
            && self.rgb_color.is_none()
    }
}

#[derive(Debug, Clone, Default)]
struct LightState {
    on_off: OnOffState,
    brightness: Option<u8>,
    color_temp: Option<u16>,
    xy_color: Option<(f64, f64)>,
}

/// A dimmable, optionally color-capable light on one endpoint
pub struct Light {
    entity_id: EntityId,
    model: String,
    endpoint: SharedEndpoint,
    features: LightFeatures,
    quirks: SharedQuirkRegistry,
    platform: SharedPlatform,
    /// Serializes commands, polls, and pushed events against each other
    op_lock: Mutex<()>,
    state: RwLock<LightState>,
}

impl Light {
    /// Create a light entity for a discovered endpoint with an already
    /// resolved feature set.
    pub fn new(
        info: &DiscoveryInfo,
        features: LightFeatures,
        quirks: SharedQuirkRegistry,
        platform: SharedPlatform,
    ) -> Result<Self, EntityIdError> {
        let entity_id = EntityId::for_endpoint("light", info.ieee(), info.endpoint_id())?;

        let state = LightState {
            on_off: OnOffState::Unknown,
            brightness: features.contains(LightFeatures::BRIGHTNESS).then_some(0),
            color_temp: None,
            // (1.0, 1.0) marks a color never observed
            xy_color: features
                .contains(LightFeatures::XY_COLOR)
                .then_some((1.0, 1.0)),
        };

        Ok(Self {
            entity_id,
            model: info.model.clone(),
            endpoint: info.endpoint.clone(),
            features,
            quirks,
            platform,
            op_lock: Mutex::new(()),
            state: RwLock::new(state),
        })
    }

    pub fn entity_id(&self) -> &EntityId {
        &self.entity_id
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn supported_features(&self) -> LightFeatures {
        self.features
    }

    /// Whether the light is known to be on. An unobserved light reads as
    /// off.
    pub fn is_on(&self) -> bool {
        self.state
            .read()
            .map(|s| s.on_off.is_on())
            .unwrap_or(false)
    }

    /// The state string exposed to the platform
    pub fn state(&self) -> &'static str {
        self.state
            .read()
            .map(|s| s.on_off.as_str())
            .unwrap_or(OnOffState::Unknown.as_str())
    }

    /// Cached brightness, 0..=255. Absent on lights without level control.
    pub fn brightness(&self) -> Option<u8> {
        self.state.read().map(|s| s.brightness).unwrap_or(None)
    }

    /// Cached color temperature in mireds
    pub fn color_temp(&self) -> Option<u16> {
        self.state.read().map(|s| s.color_temp).unwrap_or(None)
    }

    /// Cached xy color
    pub fn xy_color(&self) -> Option<(f64, f64)> {
        self.state.read().map(|s| s.xy_color).unwrap_or(None)
    }

    pub fn should_poll(&self) -> bool {
        true
    }

    /// Turn the light on.
    ///
    /// Color commands go out first, then a move-to-level-with-on-off when
    /// the light supports brightness, a plain on command otherwise. The
    /// level command subsumes the on command. A call carrying only a
    /// color temperature adjusts the color and returns without switching
    /// the light on.
    pub async fn turn_on(&self, options: TurnOn) -> Result<(), TransportError> {
        let _guard = self.op_lock.lock().await;
        let duration = (options.transition.unwrap_or(DEFAULT_TRANSITION) * 10.0) as u16;

        if let Some(mireds) = options.color_temp {
            let color_cluster = self.endpoint.require_cluster(cluster::COLOR_CONTROL)?;
            color_cluster
                .command(ClusterCommand::MoveToColorTemp {
                    mireds,
                    transition_time: duration,
                })
                .await?;
            if let Ok(mut state) = self.state.write() {
                state.color_temp = Some(mireds);
            }

            if options.is_color_temp_only() {
                self.platform.schedule_update(&self.entity_id);
                return Ok(());
            }
        }

        let target_xy = match (options.xy_color, options.rgb_color) {
            (Some(xy), _) => Some((xy, None)),
            (None, Some((red, green, blue))) => {
                let (x, y, brightness) = color::rgb_to_xy_brightness(red, green, blue);
                Some(((x, y), Some(brightness)))
            }
            (None, None) => None,
        };

        if let Some(((x, y), derived_brightness)) = target_xy {
            let color_cluster = self.endpoint.require_cluster(cluster::COLOR_CONTROL)?;
            color_cluster
                .command(ClusterCommand::MoveToColor {
                    color_x: (x * 65535.0) as u16,
                    color_y: (y * 65535.0) as u16,
                    transition_time: duration,
                })
                .await?;
            if let Ok(mut state) = self.state.write() {
                state.xy_color = Some((x, y));
                if self.features.contains(LightFeatures::BRIGHTNESS) {
                    if let Some(brightness) = derived_brightness {
                        state.brightness = Some(brightness);
                    }
                }
            }
        }

        if self.features.contains(LightFeatures::BRIGHTNESS) {
            let brightness = options.brightness.unwrap_or_else(|| {
                match self.brightness() {
                    Some(cached) if cached > 0 => cached,
                    _ => 255,
                }
            });
            debug!(entity_id = %self.entity_id, brightness, "moving to level with on/off");
            let level_cluster = self.endpoint.require_cluster(cluster::LEVEL_CONTROL)?;
            level_cluster
                .command(ClusterCommand::MoveToLevelWithOnOff {
                    level: brightness,
                    transition_time: duration,
                })
                .await?;
            if let Ok(mut state) = self.state.write() {
                state.brightness = Some(brightness);
                state.on_off = OnOffState::On;
            }
        } else {
            let on_off_cluster = self.endpoint.require_cluster(cluster::ON_OFF)?;
            on_off_cluster.command(ClusterCommand::On).await?;
            if let Ok(mut state) = self.state.write() {
                state.on_off = OnOffState::On;
            }
        }

        self.platform.schedule_update(&self.entity_id);
        Ok(())
    }

    /// Turn the light off
    pub async fn turn_off(&self) -> Result<(), TransportError> {
        let _guard = self.op_lock.lock().await;
        let on_off_cluster = self.endpoint.require_cluster(cluster::ON_OFF)?;
        on_off_cluster.command(ClusterCommand::Off).await?;
        if let Ok(mut state) = self.state.write() {
            state.on_off = OnOffState::Off;
        }
        self.platform.schedule_update(&self.entity_id);
        Ok(())
    }

    /// Poll the device for current state.
    ///
    /// Reads on/off first and stops there when the light is off; color
    /// and brightness of an off light are neither reliable nor needed.
    /// Every read is absorbing, so failures leave the previous cached
    /// values in place, and an endpoint without an OnOff cluster is
    /// simply not polled. The xy pair is applied both-or-neither.
    pub async fn update(&self) -> Result<(), TransportError> {
        let _guard = self.op_lock.lock().await;
        debug!(entity_id = %self.entity_id, "update");

        let Some(on_off_cluster) = self.endpoint.cluster(cluster::ON_OFF) else {
            debug!(entity_id = %self.entity_id, "endpoint has no on/off cluster");
            return Ok(());
        };
        let values = safe_read(on_off_cluster.as_ref(), &[on_off::ATTR_ON_OFF], false).await;
        if let Some(value) = values.get(&on_off::ATTR_ON_OFF) {
            if let Ok(mut state) = self.state.write() {
                state.on_off = OnOffState::from_attribute(value);
            }
        }
        if !self.is_on() {
            return Ok(());
        }

        if self.features.contains(LightFeatures::BRIGHTNESS) {
            if let Some(level_cluster) = self.endpoint.cluster(cluster::LEVEL_CONTROL) {
                let values =
                    safe_read(level_cluster.as_ref(), &[level::ATTR_CURRENT_LEVEL], false).await;
                if let Some(level) = values
                    .get(&level::ATTR_CURRENT_LEVEL)
                    .and_then(AttributeValue::as_u8)
                {
                    if let Ok(mut state) = self.state.write() {
                        state.brightness = Some(level);
                    }
                }
            }
        }

        if self.features.contains(LightFeatures::COLOR_TEMP) {
            if let Some(color_cluster) = self.endpoint.cluster(cluster::COLOR_CONTROL) {
                let values = safe_read(
                    color_cluster.as_ref(),
                    &[zcl_color::ATTR_COLOR_TEMPERATURE],
                    false,
                )
                .await;
                if let Some(mireds) = values
                    .get(&zcl_color::ATTR_COLOR_TEMPERATURE)
                    .and_then(AttributeValue::as_u16)
                {
                    if let Ok(mut state) = self.state.write() {
                        state.color_temp = Some(mireds);
                    }
                }
            }
        }

        if self.features.contains(LightFeatures::XY_COLOR) {
            if let Some(color_cluster) = self.endpoint.cluster(cluster::COLOR_CONTROL) {
                let values = safe_read(
                    color_cluster.as_ref(),
                    &[zcl_color::ATTR_CURRENT_X, zcl_color::ATTR_CURRENT_Y],
                    false,
                )
                .await;
                let x = values
                    .get(&zcl_color::ATTR_CURRENT_X)
                    .and_then(AttributeValue::as_u16);
                let y = values
                    .get(&zcl_color::ATTR_CURRENT_Y)
                    .and_then(AttributeValue::as_u16);
                if let (Some(x), Some(y)) = (x, y) {
                    if let Ok(mut state) = self.state.write() {
                        state.xy_color =
                            Some((f64::from(x) / 65535.0, f64::from(y) / 65535.0));
                    }
                }
            }
        }

        Ok(())
    }

    /// Handle a cluster-specific command pushed from the device.
    ///
    /// The command is offered to the model's quirk handler; without one it
    /// is inert.
    pub async fn cluster_command(&self, tsn: u8, command_id: u8, args: &[AttributeValue]) {
        let _guard = self.op_lock.lock().await;
        let handled = self
            .quirks
            .cluster_command(&self.model, tsn, command_id, args);
        if !handled {
            debug!(
                entity_id = %self.entity_id,
                command_id,
                "cluster command without handler ignored"
            );
        }
    }
}
