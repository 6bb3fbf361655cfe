//! Simulated Zigbee devices backing the demo gateway
//!
//! Each [`SimDevice`] keeps one attribute store shared by all of its
//! cluster instances, so a with-on-off level command issued on the Level
//! Control cluster is visible through the OnOff cluster on the next read,
//! the way a real bulb behaves.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use tracing::debug;
use zha_core::zcl::{cluster, color, level, measurement, metering, on_off};
use zha_core::AttributeValue;
use zha_transport::{
    AttributeRecord, Cluster, ClusterCommand, DiscoveryInfo, Endpoint, ReadResult, SharedCluster,
    TransportError,
};

/// Attribute store shared by every cluster of one device, keyed by
/// (cluster, attribute)
type DeviceState = Arc<Mutex<BTreeMap<(u16, u16), AttributeValue>>>;

/// One simulated Zigbee device
pub struct SimDevice {
    ieee: String,
    model: String,
    state: DeviceState,
}

impl SimDevice {
    pub fn new(ieee: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            ieee: ieee.into(),
            model: model.into(),
            state: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }

    /// Seed an attribute value
    pub fn with_attribute(
        self,
        cluster_id: u16,
        attribute: u16,
        value: impl Into<AttributeValue>,
    ) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.insert((cluster_id, attribute), value.into());
        }
        self
    }

    pub fn ieee(&self) -> &str {
        &self.ieee
    }

    /// Overwrite an attribute, simulating the device changing on its own
    pub fn set_attribute(&self, cluster_id: u16, attribute: u16, value: AttributeValue) {
        if let Ok(mut state) = self.state.lock() {
            state.insert((cluster_id, attribute), value);
        }
    }

    /// Build the discovery payload for one endpoint exposing `clusters`
    pub fn endpoint(&self, endpoint_id: u8, clusters: &[u16]) -> DiscoveryInfo {
        let clusters: HashMap<u16, SharedCluster> = clusters
            .iter()
            .map(|&id| {
                let sim = SimCluster {
                    ieee: self.ieee.clone(),
                    cluster_id: id,
                    state: self.state.clone(),
                };
                (id, Arc::new(sim) as SharedCluster)
            })
            .collect();
        let endpoint = Arc::new(Endpoint::new(self.ieee.clone(), endpoint_id, clusters));
        DiscoveryInfo::new(endpoint, self.model.clone())
    }
}

/// One cluster of a simulated device
struct SimCluster {
    ieee: String,
    cluster_id: u16,
    state: DeviceState,
}

impl SimCluster {
    fn get(&self, attribute: u16) -> Option<AttributeValue> {
        self.state
            .lock()
            .ok()
            .and_then(|state| state.get(&(self.cluster_id, attribute)).cloned())
    }

    /// Write an attribute, possibly on a sibling cluster
    fn write(&self, cluster_id: u16, attribute: u16, value: AttributeValue) {
        if let Ok(mut state) = self.state.lock() {
            state.insert((cluster_id, attribute), value);
        }
    }
}

#[async_trait]
impl Cluster for SimCluster {
    fn cluster_id(&self) -> u16 {
        self.cluster_id
    }

    async fn read_attributes(
        &self,
        attributes: &[u16],
        _allow_cache: bool,
    ) -> Result<ReadResult, TransportError> {
        let mut result = ReadResult::default();
        for &id in attributes {
            match self.get(id) {
                Some(value) => {
                    result.values.insert(id, value);
                }
                None => result.unsupported.push(id),
            }
        }
        Ok(result)
    }

    async fn command(&self, command: ClusterCommand) -> Result<(), TransportError> {
        debug!(
            ieee = %self.ieee,
            cluster = format_args!("0x{:04x}", self.cluster_id),
            ?command,
            "device command"
        );
        match (self.cluster_id, command) {
            (cluster::ON_OFF, ClusterCommand::On) => {
                self.write(cluster::ON_OFF, on_off::ATTR_ON_OFF, true.into());
            }
            (cluster::ON_OFF, ClusterCommand::Off) => {
                self.write(cluster::ON_OFF, on_off::ATTR_ON_OFF, false.into());
            }
            (cluster::ON_OFF, ClusterCommand::Toggle) => {
                let current = self
                    .get(on_off::ATTR_ON_OFF)
                    .and_then(|v| v.as_bool())
                    .unwrap_or(false);
                self.write(cluster::ON_OFF, on_off::ATTR_ON_OFF, (!current).into());
            }
            (cluster::LEVEL_CONTROL, ClusterCommand::MoveToLevelWithOnOff { level, .. }) => {
                self.write(cluster::LEVEL_CONTROL, level::ATTR_CURRENT_LEVEL, level.into());
                self.write(cluster::ON_OFF, on_off::ATTR_ON_OFF, true.into());
            }
            (cluster::COLOR_CONTROL, ClusterCommand::MoveToColor { color_x, color_y, .. }) => {
                self.write(cluster::COLOR_CONTROL, color::ATTR_CURRENT_X, color_x.into());
                self.write(cluster::COLOR_CONTROL, color::ATTR_CURRENT_Y, color_y.into());
            }
            (cluster::COLOR_CONTROL, ClusterCommand::MoveToColorTemp { mireds, .. }) => {
                self.write(
                    cluster::COLOR_CONTROL,
                    color::ATTR_COLOR_TEMPERATURE,
                    mireds.into(),
                );
            }
            _ => {
                return Err(TransportError::Protocol(format!(
                    "cluster 0x{:04x} does not accept {:?}",
                    self.cluster_id, command
                )));
            }
        }
        Ok(())
    }

    async fn discover_attributes(
        &self,
        start: u16,
        count: u8,
    ) -> Result<Vec<AttributeRecord>, TransportError> {
        let end = start.saturating_add(u16::from(count));
        let records = self
            .state
            .lock()
            .map(|state| {
                state
                    .iter()
                    .filter(|((cluster_id, attribute), _)| {
                        *cluster_id == self.cluster_id && (start..end).contains(attribute)
                    })
                    .map(|((_, attribute), value)| AttributeRecord {
                        id: *attribute,
                        datatype: zcl_datatype(value),
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(records)
    }

    fn attribute_name(&self, attribute: u16) -> Option<String> {
        if self.cluster_id == cluster::METERING {
            metering::attribute_name(attribute).map(str::to_string)
        } else {
            None
        }
    }
}

/// Map a stored value onto the ZCL datatype a device would report it as
fn zcl_datatype(value: &AttributeValue) -> u8 {
    match value {
        AttributeValue::Bool(_) => 0x10,
        AttributeValue::Int(_) => 0x23,
        AttributeValue::Real(_) => 0x39,
        AttributeValue::Text(_) => 0x42,
    }
}

/// The simulated network behind the demo gateway
pub struct SimNetwork {
    pub bulb: Arc<SimDevice>,
    pub thermometer: Arc<SimDevice>,
    pub meter: Arc<SimDevice>,
    pub light_sensor: Arc<SimDevice>,
}

impl SimNetwork {
    /// Discovery payloads for every endpoint, in join order
    pub fn discovered_endpoints(&self) -> Vec<DiscoveryInfo> {
        vec![
            self.bulb.endpoint(
                1,
                &[
                    cluster::ON_OFF,
                    cluster::LEVEL_CONTROL,
                    cluster::COLOR_CONTROL,
                ],
            ),
            self.thermometer.endpoint(1, &[cluster::TEMPERATURE_MEASUREMENT]),
            self.thermometer.endpoint(2, &[cluster::RELATIVE_HUMIDITY]),
            self.meter.endpoint(1, &[cluster::METERING]),
            self.light_sensor.endpoint(1, &[cluster::ILLUMINANCE_MEASUREMENT]),
        ]
    }
}

/// Build the fixed demo network
pub fn demo_network() -> SimNetwork {
    let bulb = SimDevice::new("00:0d:6f:00:0f:3a:81:7c", "FLS-PP3")
        .with_attribute(cluster::ON_OFF, on_off::ATTR_ON_OFF, false)
        .with_attribute(cluster::LEVEL_CONTROL, level::ATTR_CURRENT_LEVEL, 254u8)
        .with_attribute(cluster::COLOR_CONTROL, color::ATTR_COLOR_TEMPERATURE, 370u16)
        // Seeded near the white point
        .with_attribute(cluster::COLOR_CONTROL, color::ATTR_CURRENT_X, 20316u16)
        .with_attribute(cluster::COLOR_CONTROL, color::ATTR_CURRENT_Y, 21561u16)
        .with_attribute(
            cluster::COLOR_CONTROL,
            color::ATTR_COLOR_CAPABILITIES,
            color::CAP_XY | color::CAP_COLOR_TEMP,
        );

    let thermometer = SimDevice::new("00:15:8d:00:01:2e:b4:44", "lumi.sensor_ht")
        .with_attribute(
            cluster::TEMPERATURE_MEASUREMENT,
            measurement::ATTR_MEASURED_VALUE,
            2150i64,
        )
        .with_attribute(
            cluster::RELATIVE_HUMIDITY,
            measurement::ATTR_MEASURED_VALUE,
            4870i64,
        );

    let meter = SimDevice::new("00:12:4b:00:19:38:c2:5d", "SP 120")
        .with_attribute(
            cluster::METERING,
            metering::ATTR_CURRENT_SUMM_DELIVERED,
            412_345i64,
        )
        // power_factor and default_update_period
        .with_attribute(cluster::METERING, 0x0006, 93i64)
        .with_attribute(cluster::METERING, 0x000A, 30i64);

    let light_sensor = SimDevice::new("00:17:88:01:02:11:5a:6f", "lumi.sen_ill.mgl01")
        .with_attribute(
            cluster::ILLUMINANCE_MEASUREMENT,
            measurement::ATTR_MEASURED_VALUE,
            450i64,
        );

    SimNetwork {
        bulb: Arc::new(bulb),
        thermometer: Arc::new(thermometer),
        meter: Arc::new(meter),
        light_sensor: Arc::new(light_sensor),
    }
}
