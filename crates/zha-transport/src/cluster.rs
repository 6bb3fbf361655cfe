//! The Cluster trait and its request/response types

use crate::error::TransportError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;
use zha_core::AttributeValue;

/// Shared handle to a cluster
pub type SharedCluster = Arc<dyn Cluster>;

/// Result of a read_attributes call.
///
/// Attributes the device reported a failure status for land in
/// `unsupported` instead of `values`, so a partial read still succeeds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReadResult {
    pub values: HashMap<u16, AttributeValue>,
    pub unsupported: Vec<u16>,
}

/// One record from a Discover Attributes response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeRecord {
    pub id: u16,
    /// ZCL datatype identifier reported by the device
    pub datatype: u8,
}

/// A cluster command the entity layer can issue.
///
/// Transition times are in tenths of a second, matching the wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterCommand {
    On,
    Off,
    Toggle,
    MoveToLevelWithOnOff {
        level: u8,
        transition_time: u16,
    },
    MoveToColor {
        color_x: u16,
        color_y: u16,
        transition_time: u16,
    },
    MoveToColorTemp {
        mireds: u16,
        transition_time: u16,
    },
}

impl ClusterCommand {
    /// The ZCL command identifier on the wire
    pub fn command_id(&self) -> u8 {
        match self {
            ClusterCommand::Off => zha_core::zcl::on_off::CMD_OFF,
            ClusterCommand::On => zha_core::zcl::on_off::CMD_ON,
            ClusterCommand::Toggle => zha_core::zcl::on_off::CMD_TOGGLE,
            ClusterCommand::MoveToLevelWithOnOff { .. } => {
                zha_core::zcl::level::CMD_MOVE_TO_LEVEL_WITH_ON_OFF
            }
            ClusterCommand::MoveToColor { .. } => zha_core::zcl::color::CMD_MOVE_TO_COLOR,
            ClusterCommand::MoveToColorTemp { .. } => {
                zha_core::zcl::color::CMD_MOVE_TO_COLOR_TEMP
            }
        }
    }
}

/// One cluster instance on a device endpoint.
///
/// Radio backends implement this; the entity layer holds clusters as
/// `Arc<dyn Cluster>` and stays independent of the radio stack.
#[async_trait]
pub trait Cluster: Send + Sync {
    /// The ZCL cluster identifier
    fn cluster_id(&self) -> u16;

    /// Read a set of attributes from the device.
    ///
    /// With `allow_cache` the backend may answer from its attribute cache
    /// instead of going out over the air.
    async fn read_attributes(
        &self,
        attributes: &[u16],
        allow_cache: bool,
    ) -> Result<ReadResult, TransportError>;

    /// Issue a cluster command
    async fn command(&self, command: ClusterCommand) -> Result<(), TransportError>;

    /// Discover attributes implemented by the device, starting at
    /// `start` and returning at most `count` records.
    async fn discover_attributes(
        &self,
        start: u16,
        count: u8,
    ) -> Result<Vec<AttributeRecord>, TransportError>;

    /// Human-readable name for an attribute, if the backend knows one
    fn attribute_name(&self, attribute: u16) -> Option<String> {
        let _ = attribute;
        None
    }
}

/// Read attributes without letting a flaky device break the caller.
///
/// Sleepy end devices routinely time out, and some report failure statuses
/// for attributes they advertise. Whatever goes wrong, the caller gets the
/// values that did arrive, which may be none at all.
pub async fn safe_read(
    cluster: &dyn Cluster,
    attributes: &[u16],
    allow_cache: bool,
) -> HashMap<u16, AttributeValue> {
    match cluster.read_attributes(attributes, allow_cache).await {
        Ok(result) => result.values,
        Err(err) => {
            debug!(
                cluster = format_args!("0x{:04x}", cluster.cluster_id()),
                error = %err,
                "attribute read failed"
            );
            HashMap::new()
        }
    }
}
