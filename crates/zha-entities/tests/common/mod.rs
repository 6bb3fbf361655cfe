//! Common test utilities for the entity adapters
//!
//! Provides a scriptable mock cluster, endpoint assembly helpers, a
//! recording platform, and quirk handlers for dispatch tests.

// Each test binary compiles its own copy and uses a different subset.
#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use zha_core::{AttributeValue, EntityId};
use zha_entities::{Platform, UnitSystem};
use zha_quirks::{DeviceHandler, QuirkError};
use zha_transport::{
    AttributeRecord, Cluster, ClusterCommand, DiscoveryInfo, Endpoint, ReadResult,
    SharedCluster, TransportError,
};

pub const TEST_IEEE: &str = "00:12:4b:00:01:dd:7a:3c";

/// A scriptable in-memory cluster.
///
/// Serves attribute values from a map, records every read request and
/// command, and can be switched to fail all reads.
pub struct MockCluster {
    cluster_id: u16,
    attributes: Mutex<HashMap<u16, AttributeValue>>,
    discovered: Mutex<Vec<AttributeRecord>>,
    names: HashMap<u16, &'static str>,
    fail_reads: bool,
    fail_discovery: bool,
    reads: Mutex<Vec<Vec<u16>>>,
    commands: Mutex<Vec<ClusterCommand>>,
}

impl MockCluster {
    pub fn new(cluster_id: u16) -> Self {
        Self {
            cluster_id,
            attributes: Mutex::new(HashMap::new()),
            discovered: Mutex::new(Vec::new()),
            names: HashMap::new(),
            fail_reads: false,
            fail_discovery: false,
            reads: Mutex::new(Vec::new()),
            commands: Mutex::new(Vec::new()),
        }
    }

    /// Serve a value for an attribute
    pub fn with_attribute(self, id: u16, value: impl Into<AttributeValue>) -> Self {
        self.attributes.lock().unwrap().insert(id, value.into());
        self
    }

    /// Answer discovery with this attribute record
    pub fn with_discovered(self, id: u16, datatype: u8) -> Self {
        self.discovered
            .lock()
            .unwrap()
            .push(AttributeRecord { id, datatype });
        self
    }

    /// Know a schema name for an attribute
    pub fn with_attribute_name(mut self, id: u16, name: &'static str) -> Self {
        self.names.insert(id, name);
        self
    }

    /// Fail every read with a timeout
    pub fn failing_reads(mut self) -> Self {
        self.fail_reads = true;
        self
    }

    /// Fail every discovery request with a timeout
    pub fn failing_discovery(mut self) -> Self {
        self.fail_discovery = true;
        self
    }

    /// Replace a served attribute value after construction
    pub fn set_attribute(&self, id: u16, value: impl Into<AttributeValue>) {
        self.attributes.lock().unwrap().insert(id, value.into());
    }

    /// Drop all scripted discovery records
    pub fn clear_discovered(&self) {
        self.discovered.lock().unwrap().clear();
    }

    /// Every read request seen, in order
    pub fn reads(&self) -> Vec<Vec<u16>> {
        self.reads.lock().unwrap().clone()
    }

    /// Every command received, in order
    pub fn commands(&self) -> Vec<ClusterCommand> {
        self.commands.lock().unwrap().clone()
    }
}

#[async_trait]
impl Cluster for MockCluster {
    fn cluster_id(&self) -> u16 {
        self.cluster_id
    }

    async fn read_attributes(
        &self,
        attributes: &[u16],
        _allow_cache: bool,
    ) -> Result<ReadResult, TransportError> {
        self.reads.lock().unwrap().push(attributes.to_vec());
        if self.fail_reads {
            return Err(TransportError::Timeout);
        }
        let values = self.attributes.lock().unwrap();
        let mut result = ReadResult::default();
        for &id in attributes {
            match values.get(&id) {
                Some(value) => {
                    result.values.insert(id, value.clone());
                }
                None => result.unsupported.push(id),
            }
        }
        Ok(result)
    }

    async fn command(&self, command: ClusterCommand) -> Result<(), TransportError> {
        self.commands.lock().unwrap().push(command);
        Ok(())
    }

    async fn discover_attributes(
        &self,
        start: u16,
        count: u8,
    ) -> Result<Vec<AttributeRecord>, TransportError> {
        if self.fail_discovery {
            return Err(TransportError::Timeout);
        }
        let end = start + u16::from(count);
        Ok(self
            .discovered
            .lock()
            .unwrap()
            .iter()
            .filter(|record| record.id >= start && record.id < end)
            .copied()
            .collect())
    }

    fn attribute_name(&self, attribute: u16) -> Option<String> {
        self.names.get(&attribute).map(|name| name.to_string())
    }
}

/// Assemble a discovery record for an endpoint carrying these clusters
pub fn discovery_info(model: &str, clusters: &[Arc<MockCluster>]) -> DiscoveryInfo {
    let map: HashMap<u16, SharedCluster> = clusters
        .iter()
        .map(|cluster| (cluster.cluster_id(), cluster.clone() as SharedCluster))
        .collect();
    let endpoint = Arc::new(Endpoint::new(TEST_IEEE, 1, map));
    DiscoveryInfo::new(endpoint, model)
}

/// A platform that records refresh requests
pub struct RecordingPlatform {
    units: UnitSystem,
    updates: Mutex<Vec<EntityId>>,
}

impl RecordingPlatform {
    pub fn new() -> Self {
        Self {
            units: UnitSystem::metric(),
            updates: Mutex::new(Vec::new()),
        }
    }

    pub fn imperial() -> Self {
        Self {
            units: UnitSystem::imperial(),
            updates: Mutex::new(Vec::new()),
        }
    }

    /// Every entity refresh requested, in order
    pub fn updates(&self) -> Vec<EntityId> {
        self.updates.lock().unwrap().clone()
    }

    pub fn update_count(&self) -> usize {
        self.updates.lock().unwrap().len()
    }
}

impl Default for RecordingPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl Platform for RecordingPlatform {
    fn schedule_update(&self, entity_id: &EntityId) {
        self.updates.lock().unwrap().push(entity_id.clone());
    }

    fn units(&self) -> UnitSystem {
        self.units
    }
}

/// Quirk handler remapping one attribute id onto another
pub struct RemapQuirk {
    pub from: u16,
    pub to: u16,
}

impl DeviceHandler for RemapQuirk {
    fn parse_attribute(
        &self,
        attribute: u16,
        value: AttributeValue,
    ) -> Result<(u16, AttributeValue), QuirkError> {
        if attribute == self.from {
            Ok((self.to, value))
        } else {
            Ok((attribute, value))
        }
    }
}

/// Quirk handler that always fails
pub struct FailingQuirk;

impl DeviceHandler for FailingQuirk {
    fn parse_attribute(
        &self,
        _attribute: u16,
        _value: AttributeValue,
    ) -> Result<(u16, AttributeValue), QuirkError> {
        Err(QuirkError::Failed("broken handler".into()))
    }

    fn cluster_command(
        &self,
        _tsn: u8,
        _command_id: u8,
        _args: &[AttributeValue],
    ) -> Result<(), QuirkError> {
        Err(QuirkError::Failed("broken handler".into()))
    }
}

/// Quirk handler recording cluster commands it was offered
#[derive(Default)]
pub struct RecordingQuirk {
    pub commands: Mutex<Vec<(u8, u8, Vec<AttributeValue>)>>,
}

impl DeviceHandler for RecordingQuirk {
    fn cluster_command(
        &self,
        tsn: u8,
        command_id: u8,
        args: &[AttributeValue],
    ) -> Result<(), QuirkError> {
        self.commands
            .lock()
            .unwrap()
            .push((tsn, command_id, args.to_vec()));
        Ok(())
    }
}
