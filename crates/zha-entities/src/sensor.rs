//! Sensor entity adapter family
//!
//! One adapter type covers every sensor kind; a [`SensorProfile`] record
//! carries the per-kind differences in value attribute, unit, scaling,
//! and the sentinel shown while no reading exists. Most sensors are pure
//! push targets fed through [`Sensor::attribute_updated`]; the metering
//! profile additionally polls with an attribute discovery loop, because
//! summation attributes are not reliably reported by these meters.

use crate::platform::{SharedPlatform, UnitSystem};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use std::sync::RwLock;
use tokio::sync::Mutex;
use tracing::debug;
use zha_core::zcl::{cluster, metering};
use zha_core::{AttributeValue, EntityId, EntityIdError};
use zha_quirks::SharedQuirkRegistry;
use zha_transport::{safe_read, DiscoveryInfo, SharedEndpoint, TransportError};

/// Sentinel shown for a sensor that has no reading yet
const EMPTY_SENTINEL: &str = "-";

/// Window for metering attribute discovery. One fixed page; discovery is
/// not resumed past it even when the device has more attributes.
const DISCOVERY_START: u16 = 0;
const DISCOVERY_COUNT: u8 = 32;

/// The sensor kinds the factory can select
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorKind {
    Generic,
    Temperature,
    Humidity,
    Pressure,
    Illuminance,
    Metering,
}

/// How a sensor's unit of measurement resolves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorUnit {
    /// No unit exposed
    None,
    /// A fixed unit string
    Fixed(&'static str),
    /// The platform's configured temperature unit
    Temperature,
}

/// How a sensor formats its cached raw value for display
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DisplayPolicy {
    /// Raw value unchanged
    Raw,
    /// Float values rounded to this many decimals, other values unchanged
    RoundFloats(u32),
    /// Value divided by `scale`, rounded to `decimals`
    Scaled { scale: f64, decimals: u32 },
    /// Like `Scaled`, then converted from Celsius into the platform unit
    ScaledTemperature { scale: f64, decimals: u32 },
}

/// Per-kind configuration record for the sensor adapter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorProfile {
    pub kind: SensorKind,
    /// The attribute whose reports replace the cached state
    pub value_attribute: u16,
    pub unit: SensorUnit,
    pub display: DisplayPolicy,
    /// Sentinel displayed while no reading exists; `None` displays nothing
    pub empty_sentinel: Option<&'static str>,
    /// Minimum change worth reporting, in raw units. Used when
    /// configuring device-side reporting, not enforced here.
    pub min_reportable_change: i64,
    pub should_poll: bool,
}

impl SensorProfile {
    pub fn generic() -> Self {
        Self {
            kind: SensorKind::Generic,
            value_attribute: 0,
            unit: SensorUnit::None,
            display: DisplayPolicy::RoundFloats(2),
            empty_sentinel: None,
            min_reportable_change: 1,
            should_poll: true,
        }
    }

    /// Centi-degrees Celsius, shown in the platform's temperature unit
    pub fn temperature() -> Self {
        Self {
            kind: SensorKind::Temperature,
            unit: SensorUnit::Temperature,
            display: DisplayPolicy::ScaledTemperature {
                scale: 100.0,
                decimals: 1,
            },
            empty_sentinel: Some(EMPTY_SENTINEL),
            min_reportable_change: 50,
            ..Self::generic()
        }
    }

    /// Centi-percent relative humidity
    pub fn humidity() -> Self {
        Self {
            kind: SensorKind::Humidity,
            unit: SensorUnit::Fixed("%"),
            display: DisplayPolicy::Scaled {
                scale: 100.0,
                decimals: 1,
            },
            empty_sentinel: Some(EMPTY_SENTINEL),
            ..Self::generic()
        }
    }

    pub fn pressure() -> Self {
        Self {
            kind: SensorKind::Pressure,
            unit: SensorUnit::Fixed("mbar"),
            display: DisplayPolicy::Raw,
            empty_sentinel: Some(EMPTY_SENTINEL),
            min_reportable_change: 50,
            ..Self::generic()
        }
    }

    /// Illuminance has no sentinel; an absent reading displays as nothing
    pub fn illuminance() -> Self {
        Self {
            kind: SensorKind::Illuminance,
            unit: SensorUnit::Fixed("lux"),
            display: DisplayPolicy::Raw,
            empty_sentinel: None,
            min_reportable_change: 5,
            ..Self::generic()
        }
    }

    /// Centi-kWh summation from the metering cluster. Poll-driven through
    /// the discovery loop instead of push reports.
    pub fn metering() -> Self {
        Self {
            kind: SensorKind::Metering,
            unit: SensorUnit::Fixed("kWh"),
            display: DisplayPolicy::Scaled {
                scale: 100.0,
                decimals: 2,
            },
            empty_sentinel: Some(EMPTY_SENTINEL),
            should_poll: false,
            ..Self::generic()
        }
    }

    /// Format a raw value for display
    fn format(&self, value: &AttributeValue, units: &UnitSystem) -> String {
        match self.display {
            DisplayPolicy::Raw => value.to_string(),
            DisplayPolicy::RoundFloats(decimals) => match value {
                AttributeValue::Real(raw) => format_float(round_to(*raw, decimals)),
                other => other.to_string(),
            },
            DisplayPolicy::Scaled { scale, decimals } => match value.as_f64() {
                Some(raw) => format_float(round_to(raw / scale, decimals)),
                None => value.to_string(),
            },
            DisplayPolicy::ScaledTemperature { scale, decimals } => match value.as_f64() {
                Some(raw) => {
                    let celsius = round_to(raw / scale, decimals);
                    format_float(round_to(units.temperature.from_celsius(celsius), 2))
                }
                None => value.to_string(),
            },
        }
    }
}

fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Render like Python's `str()` of a rounded float: whole values keep one
/// trailing decimal.
fn format_float(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

#[derive(Debug, Clone, Default)]
struct SensorState {
    raw: Option<AttributeValue>,
    extra_attributes: IndexMap<String, AttributeValue>,
    /// Metering attribute map, id to ZCL datatype, grown by discovery
    discovered: IndexMap<u16, u8>,
    last_updated: Option<DateTime<Utc>>,
}

/// A sensor entity on one endpoint
pub struct Sensor {
    entity_id: EntityId,
    model: String,
    endpoint: SharedEndpoint,
    profile: SensorProfile,
    quirks: SharedQuirkRegistry,
    platform: SharedPlatform,
    /// Serializes polls and pushed events against each other
    op_lock: Mutex<()>,
    state: RwLock<SensorState>,
}

impl Sensor {
    pub fn new(
        info: &DiscoveryInfo,
        profile: SensorProfile,
        quirks: SharedQuirkRegistry,
        platform: SharedPlatform,
    ) -> Result<Self, EntityIdError> {
        let entity_id = EntityId::for_endpoint("sensor", info.ieee(), info.endpoint_id())?;
        Ok(Self {
            entity_id,
            model: info.model.clone(),
            endpoint: info.endpoint.clone(),
            profile,
            quirks,
            platform,
            op_lock: Mutex::new(()),
            state: RwLock::new(SensorState::default()),
        })
    }

    pub fn entity_id(&self) -> &EntityId {
        &self.entity_id
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn profile(&self) -> &SensorProfile {
        &self.profile
    }

    pub fn should_poll(&self) -> bool {
        self.profile.should_poll
    }

    pub fn unit_of_measurement(&self) -> Option<&'static str> {
        match self.profile.unit {
            SensorUnit::None => None,
            SensorUnit::Fixed(unit) => Some(unit),
            SensorUnit::Temperature => Some(self.platform.units().temperature.symbol()),
        }
    }

    /// The display state. `None` means the platform shows nothing, which
    /// only the profiles without a sentinel produce.
    pub fn state(&self) -> Option<String> {
        let raw = self
            .state
            .read()
            .map(|s| s.raw.clone())
            .unwrap_or(None);
        match raw {
            Some(value) => Some(self.profile.format(&value, &self.platform.units())),
            None => self.profile.empty_sentinel.map(str::to_string),
        }
    }

    /// The cached raw value as reported by the device
    pub fn raw_state(&self) -> Option<AttributeValue> {
        self.state.read().map(|s| s.raw.clone()).unwrap_or(None)
    }

    /// Extra display attributes, in the order they were first stored
    pub fn extra_attributes(&self) -> IndexMap<String, AttributeValue> {
        self.state
            .read()
            .map(|s| s.extra_attributes.clone())
            .unwrap_or_default()
    }

    /// When the cached state last changed
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.state.read().map(|s| s.last_updated).unwrap_or(None)
    }

    /// Handle a pushed attribute report.
    ///
    /// The report first passes through the model's quirk handler, which
    /// may remap it. A report matching the profile's value attribute
    /// replaces the cached state; anything else is ignored.
    pub async fn attribute_updated(&self, attribute: u16, value: AttributeValue) {
        let _guard = self.op_lock.lock().await;
        let (attribute, value) = self.quirks.parse_attribute(&self.model, attribute, value);
        if attribute != self.profile.value_attribute {
            return;
        }
        if let Ok(mut state) = self.state.write() {
            state.raw = Some(value);
            state.last_updated = Some(Utc::now());
        }
        self.platform.schedule_update(&self.entity_id);
    }

    /// Poll the device. Only the metering profile implements a poll; for
    /// every other kind this is a no-op.
    ///
    /// The metering cycle discovers the cluster's attribute set over one
    /// fixed id window, folds the result into the attribute map, then
    /// bulk-reads the summation attribute plus every id known so far.
    /// Attribute ids already known are re-read each cycle, never
    /// re-discovered. Discovery and read failures are absorbed; the cycle
    /// carries on with what it already knows.
    pub async fn update(&self) -> Result<(), TransportError> {
        if self.profile.kind != SensorKind::Metering {
            return Ok(());
        }
        let _guard = self.op_lock.lock().await;

        let meter = self.endpoint.require_cluster(cluster::METERING)?;
        match meter
            .discover_attributes(DISCOVERY_START, DISCOVERY_COUNT)
            .await
        {
            Ok(records) => {
                if let Some(max_id) = records.iter().map(|r| r.id).max() {
                    debug!(entity_id = %self.entity_id, max_id, "discovered metering attributes");
                }
                if let Ok(mut state) = self.state.write() {
                    for record in &records {
                        state.discovered.insert(record.id, record.datatype);
                    }
                }
            }
            Err(err) => {
                debug!(entity_id = %self.entity_id, error = %err, "attribute discovery failed");
            }
        }

        let mut ids = vec![metering::ATTR_CURRENT_SUMM_DELIVERED];
        if let Ok(state) = self.state.read() {
            ids.extend(
                state
                    .discovered
                    .keys()
                    .copied()
                    .filter(|&id| id != metering::ATTR_CURRENT_SUMM_DELIVERED),
            );
        }

        let values = safe_read(meter.as_ref(), &ids, false).await;
        let now = Utc::now();
        if let Ok(mut state) = self.state.write() {
            for &id in &ids {
                let Some(value) = values.get(&id) else {
                    continue;
                };
                if id == metering::ATTR_CURRENT_SUMM_DELIVERED {
                    state.raw = Some(value.clone());
                    state.last_updated = Some(now);
                } else {
                    let name = meter
                        .attribute_name(id)
                        .unwrap_or_else(|| format!("metering_{}", id));
                    state.extra_attributes.insert(name, value.clone());
                }
            }
        }
        Ok(())
    }

    /// Handle a cluster-specific command pushed from the device. Offered
    /// to the model's quirk handler, otherwise inert.
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
