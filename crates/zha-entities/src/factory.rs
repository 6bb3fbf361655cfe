//! Entity factories selecting the adapter for a discovered endpoint

use crate::features::LightFeatures;
use crate::light::Light;
use crate::platform::SharedPlatform;
use crate::sensor::{Sensor, SensorProfile};
use tracing::debug;
use zha_core::zcl::{cluster, color};
use zha_core::{AttributeValue, EntityIdError};
use zha_quirks::SharedQuirkRegistry;
use zha_transport::{safe_read, DiscoveryInfo};

/// Create a light entity for a discovered endpoint.
///
/// When discovery did not already carry the color-capability mask and the
/// endpoint has a Color Control cluster, the mask is queried first; the
/// query is absorbing, and an unreadable mask leaves the resolver on its
/// default. A light with possibly wrong capabilities beats no light at
/// all.
pub async fn make_light(
    info: &DiscoveryInfo,
    quirks: SharedQuirkRegistry,
    platform: SharedPlatform,
) -> Result<Light, EntityIdError> {
    let mut color_capabilities = info.color_capabilities;
    if color_capabilities.is_none() {
        if let Some(color_cluster) = info.endpoint.cluster(cluster::COLOR_CONTROL) {
            let values = safe_read(
                color_cluster.as_ref(),
                &[color::ATTR_COLOR_CAPABILITIES],
                true,
            )
            .await;
            color_capabilities = values
                .get(&color::ATTR_COLOR_CAPABILITIES)
                .and_then(AttributeValue::as_u16);
            debug!(
                ieee = info.ieee(),
                capabilities = ?color_capabilities,
                "queried color capabilities"
            );
        }
    }

    let features = LightFeatures::resolve(&info.in_clusters, color_capabilities);
    Light::new(info, features, quirks, platform)
}

/// Create a sensor entity for a discovered endpoint, picking the profile
/// from cluster membership. First match wins.
pub fn make_sensor(
    info: &DiscoveryInfo,
    quirks: SharedQuirkRegistry,
    platform: SharedPlatform,
) -> Result<Sensor, EntityIdError> {
    let profile = if info.in_clusters.contains(&cluster::TEMPERATURE_MEASUREMENT) {
        SensorProfile::temperature()
    } else if info.in_clusters.contains(&cluster::RELATIVE_HUMIDITY) {
        SensorProfile::humidity()
    } else if info.in_clusters.contains(&cluster::PRESSURE_MEASUREMENT) {
        SensorProfile::pressure()
    } else if info.in_clusters.contains(&cluster::METERING) {
        SensorProfile::metering()
    } else if info.in_clusters.contains(&cluster::ILLUMINANCE_MEASUREMENT) {
        SensorProfile::illuminance()
    } else {
        SensorProfile::generic()
    };

    Sensor::new(info, profile, quirks, platform)
}
