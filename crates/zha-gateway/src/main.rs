//! ZHA bridge gateway
//!
//! Main entry point for the Zigbee bridge. Discovered endpoints become
//! light and sensor entities, a poll loop refreshes the pollable ones,
//! and pushed attribute reports flow through the quirk registry into
//! sensor state. The Zigbee side is a simulated network, so the gateway
//! runs without radio hardware.

mod config;
mod sim;

use crate::config::GatewayConfig;
use crate::sim::{SimDevice, SimNetwork};
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn, Level};
use tracing_subscriber::FmtSubscriber;
use zha_core::zcl::{cluster, measurement};
use zha_core::{AttributeValue, EntityId};
use zha_entities::{
    make_light, make_sensor, Light, Platform, Sensor, SharedPlatform, TurnOn, UnitSystem,
};
use zha_quirks::{DeviceHandler, QuirkError, QuirkRegistry, SharedQuirkRegistry};
use zha_transport::{DiscoveryInfo, TransportError};

/// Platform boundary backed by an update channel.
///
/// Entities call `schedule_update` after a state change; the receiver
/// half drives the state log task.
struct GatewayPlatform {
    units: UnitSystem,
    updates: mpsc::UnboundedSender<EntityId>,
}

impl Platform for GatewayPlatform {
    fn schedule_update(&self, entity_id: &EntityId) {
        // A closed receiver just means shutdown is in progress
        let _ = self.updates.send(entity_id.clone());
    }

    fn units(&self) -> UnitSystem {
        self.units
    }
}

/// A constructed entity of either domain
pub enum GatewayEntity {
    Light(Arc<Light>),
    Sensor(Arc<Sensor>),
}

impl GatewayEntity {
    fn entity_id(&self) -> &EntityId {
        match self {
            GatewayEntity::Light(light) => light.entity_id(),
            GatewayEntity::Sensor(sensor) => sensor.entity_id(),
        }
    }

    fn should_poll(&self) -> bool {
        match self {
            GatewayEntity::Light(light) => light.should_poll(),
            GatewayEntity::Sensor(sensor) => sensor.should_poll(),
        }
    }

    async fn update(&self) -> Result<(), TransportError> {
        match self {
            GatewayEntity::Light(light) => light.update().await,
            GatewayEntity::Sensor(sensor) => sensor.update().await,
        }
    }

    /// Human-readable state for the log
    fn state_line(&self) -> String {
        match self {
            GatewayEntity::Light(light) => {
                let mut line = light.state().to_string();
                if let Some(brightness) = light.brightness() {
                    line.push_str(&format!(" brightness={brightness}"));
                }
                if let Some(mireds) = light.color_temp() {
                    line.push_str(&format!(" color_temp={mireds}"));
                }
                if let Some((x, y)) = light.xy_color() {
                    line.push_str(&format!(" xy=({x:.3}, {y:.3})"));
                }
                line
            }
            GatewayEntity::Sensor(sensor) => {
                let state = sensor.state().unwrap_or_else(|| "unknown".to_string());
                match sensor.unit_of_measurement() {
                    Some(unit) => format!("{state} {unit}"),
                    None => state,
                }
            }
        }
    }
}

/// The central gateway instance
pub struct Gateway {
    /// Registered device handlers
    pub quirks: SharedQuirkRegistry,
    /// Entities by discovery order, sorted by entity ID
    pub entities: Vec<GatewayEntity>,
}

impl Gateway {
    /// Build entities for every discovered endpoint.
    ///
    /// Endpoints with an OnOff cluster become lights, everything else a
    /// sensor. A factory failure skips the endpoint instead of aborting
    /// the whole discovery.
    pub async fn discover(
        discovered: Vec<DiscoveryInfo>,
        quirks: SharedQuirkRegistry,
        platform: SharedPlatform,
    ) -> Self {
        let mut entities = Vec::new();
        for info in discovered {
            if info.in_clusters.contains(&cluster::ON_OFF) {
                match make_light(&info, quirks.clone(), platform.clone()).await {
                    Ok(light) => {
                        info!(
                            entity_id = %light.entity_id(),
                            model = %info.model,
                            features = light.supported_features().bits(),
                            "adding light"
                        );
                        entities.push(GatewayEntity::Light(Arc::new(light)));
                    }
                    Err(err) => {
                        warn!(ieee = info.ieee(), error = %err, "skipping endpoint");
                    }
                }
            } else {
                match make_sensor(&info, quirks.clone(), platform.clone()) {
                    Ok(sensor) => {
                        info!(
                            entity_id = %sensor.entity_id(),
                            model = %info.model,
                            "adding sensor"
                        );
                        entities.push(GatewayEntity::Sensor(Arc::new(sensor)));
                    }
                    Err(err) => {
                        warn!(ieee = info.ieee(), error = %err, "skipping endpoint");
                    }
                }
            }
        }
        entities.sort_by_key(|entity| entity.entity_id().to_string());

        Self { quirks, entities }
    }

    /// Refresh every entity once before it is exposed
    pub async fn initial_refresh(&self) {
        let updates = self.entities.iter().map(|entity| async move {
            if let Err(err) = entity.update().await {
                warn!(entity_id = %entity.entity_id(), error = %err, "initial update failed");
            }
        });
        futures::future::join_all(updates).await;
    }

    fn entity(&self, entity_id: &EntityId) -> Option<&GatewayEntity> {
        self.entities
            .iter()
            .find(|entity| entity.entity_id() == entity_id)
    }

    fn sensor(&self, entity_id: &EntityId) -> Option<Arc<Sensor>> {
        self.entities.iter().find_map(|entity| match entity {
            GatewayEntity::Sensor(sensor) if sensor.entity_id() == entity_id => {
                Some(sensor.clone())
            }
            _ => None,
        })
    }

    fn first_light(&self) -> Option<Arc<Light>> {
        self.entities.iter().find_map(|entity| match entity {
            GatewayEntity::Light(light) => Some(light.clone()),
            _ => None,
        })
    }
}

/// Attribute some lumi firmware revisions report the measurement under
const LUMI_MEASUREMENT_ATTR: u16 = 0xff01;

/// Handler for the Xiaomi lumi.sensor_ht.
///
/// Early firmware pushes the current measurement under a manufacturer
/// specific attribute next to the standard report; remap it onto
/// MeasuredValue so the reading is not dropped.
struct LumiSensorHt;

impl DeviceHandler for LumiSensorHt {
    fn parse_attribute(
        &self,
        attribute: u16,
        value: AttributeValue,
    ) -> Result<(u16, AttributeValue), QuirkError> {
        match attribute {
            LUMI_MEASUREMENT_ATTR => Ok((measurement::ATTR_MEASURED_VALUE, value)),
            _ => Ok((attribute, value)),
        }
    }
}

fn register_quirks(quirks: &QuirkRegistry) {
    quirks.register("lumi.sensor_ht", Arc::new(LumiSensorHt));
}

/// Log every state change entities schedule
async fn state_log_loop(gateway: Arc<Gateway>, mut updates: mpsc::UnboundedReceiver<EntityId>) {
    while let Some(entity_id) = updates.recv().await {
        if let Some(entity) = gateway.entity(&entity_id) {
            info!(entity_id = %entity_id, state = %entity.state_line(), "state changed");
        }
    }
}

/// Periodically refresh every pollable entity
async fn poll_loop(gateway: Arc<Gateway>, period: Duration) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await;
    loop {
        ticker.tick().await;
        for entity in &gateway.entities {
            if !entity.should_poll() {
                continue;
            }
            match entity.update().await {
                Ok(()) => {
                    debug!(entity_id = %entity.entity_id(), state = %entity.state_line(), "polled");
                }
                Err(err) => {
                    warn!(entity_id = %entity.entity_id(), error = %err, "poll failed");
                }
            }
        }
    }
}

/// Push periodic temperature reports from the simulated thermometer.
///
/// Every third report arrives under the manufacturer attribute instead of
/// MeasuredValue, exercising the lumi.sensor_ht handler.
async fn report_loop(thermometer: Arc<SimDevice>, sensor: Arc<Sensor>) {
    let mut ticker = tokio::time::interval(Duration::from_secs(15));
    let mut report: i64 = 0;
    loop {
        ticker.tick().await;
        // Wander around 21.5 °C, in hundredths
        let raw = 2150 + (report * 37) % 120 - 60;
        let attribute = if report % 3 == 2 {
            LUMI_MEASUREMENT_ATTR
        } else {
            measurement::ATTR_MEASURED_VALUE
        };
        thermometer.set_attribute(
            cluster::TEMPERATURE_MEASUREMENT,
            measurement::ATTR_MEASURED_VALUE,
            AttributeValue::Int(raw),
        );
        sensor
            .attribute_updated(attribute, AttributeValue::Int(raw))
            .await;
        report += 1;
    }
}

/// Script a few light operations so the command path shows in the logs
async fn light_demo(light: Arc<Light>) {
    tokio::time::sleep(Duration::from_secs(3)).await;
    let warm = TurnOn::default()
        .with_brightness(200)
        .with_color_temp(370)
        .with_transition(2.0);
    if let Err(err) = light.turn_on(warm).await {
        warn!(entity_id = %light.entity_id(), error = %err, "turn_on failed");
    }

    tokio::time::sleep(Duration::from_secs(5)).await;
    let sunset = TurnOn::default().with_rgb_color(255, 64, 0);
    if let Err(err) = light.turn_on(sunset).await {
        warn!(entity_id = %light.entity_id(), error = %err, "turn_on failed");
    }

    tokio::time::sleep(Duration::from_secs(5)).await;
    if let Err(err) = light.turn_off().await {
        warn!(entity_id = %light.entity_id(), error = %err, "turn_off failed");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting ZHA bridge gateway");

    let config = match std::env::args().nth(1) {
        Some(path) => GatewayConfig::load(&path)?,
        None => GatewayConfig::default(),
    };
    info!(
        unit_system = config.unit_system.name(),
        poll_interval = config.poll_interval,
        "configuration loaded"
    );

    let quirks: SharedQuirkRegistry = Arc::new(QuirkRegistry::new());
    register_quirks(&quirks);

    let (updates_tx, updates_rx) = mpsc::unbounded_channel();
    let platform: SharedPlatform = Arc::new(GatewayPlatform {
        units: config.units(),
        updates: updates_tx,
    });

    let network: SimNetwork = sim::demo_network();
    let gateway = Arc::new(Gateway::discover(network.discovered_endpoints(), quirks, platform).await);
    info!(
        entities = gateway.entities.len(),
        handlers = gateway.quirks.handler_count(),
        "discovery finished"
    );

    gateway.initial_refresh().await;
    for entity in &gateway.entities {
        info!(entity_id = %entity.entity_id(), state = %entity.state_line(), "entity ready");
    }

    tokio::spawn(state_log_loop(gateway.clone(), updates_rx));
    tokio::spawn(poll_loop(gateway.clone(), config.poll_period()));

    let thermometer_id = EntityId::for_endpoint("sensor", network.thermometer.ieee(), 1)?;
    match gateway.sensor(&thermometer_id) {
        Some(sensor) => {
            tokio::spawn(report_loop(network.thermometer.clone(), sensor));
        }
        None => warn!(entity_id = %thermometer_id, "thermometer entity missing"),
    }

    match gateway.first_light() {
        Some(light) => {
            tokio::spawn(light_demo(light));
        }
        None => warn!("no light discovered"),
    }

    info!("Gateway is running");

    tokio::signal::ctrl_c().await?;
    info!("Shutting down...");

    Ok(())
}
