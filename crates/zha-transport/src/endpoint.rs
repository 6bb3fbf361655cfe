//! Device endpoints and the discovery payload handed to entity factories

use crate::cluster::SharedCluster;
use crate::error::TransportError;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// Shared handle to an endpoint
pub type SharedEndpoint = Arc<Endpoint>;

/// One endpoint of a joined device with its input clusters
pub struct Endpoint {
    ieee: String,
    endpoint_id: u8,
    clusters: HashMap<u16, SharedCluster>,
}

impl Endpoint {
    pub fn new(
        ieee: impl Into<String>,
        endpoint_id: u8,
        clusters: HashMap<u16, SharedCluster>,
    ) -> Self {
        Self {
            ieee: ieee.into(),
            endpoint_id,
            clusters,
        }
    }

    /// IEEE address of the device this endpoint belongs to
    pub fn ieee(&self) -> &str {
        &self.ieee
    }

    pub fn endpoint_id(&self) -> u8 {
        self.endpoint_id
    }

    pub fn cluster(&self, cluster_id: u16) -> Option<&SharedCluster> {
        self.clusters.get(&cluster_id)
    }

    /// Like [`Endpoint::cluster`] but an error when absent, for callers
    /// that cannot work without the cluster.
    pub fn require_cluster(&self, cluster_id: u16) -> Result<&SharedCluster, TransportError> {
        self.clusters
            .get(&cluster_id)
            .ok_or(TransportError::NoSuchCluster(cluster_id))
    }

    pub fn has_cluster(&self, cluster_id: u16) -> bool {
        self.clusters.contains_key(&cluster_id)
    }

    /// Identifiers of all input clusters, in ascending order
    pub fn cluster_ids(&self) -> BTreeSet<u16> {
        self.clusters.keys().copied().collect()
    }
}

/// Everything known about a newly discovered endpoint when entity
/// factories run.
///
/// `model` comes from the Basic cluster and may be empty when the device
/// never answered the model read. `in_clusters` drives feature detection
/// without further round trips. `color_capabilities` is filled in when
/// discovery already read the mask; factories query it themselves when it
/// is absent.
#[derive(Clone)]
pub struct DiscoveryInfo {
    pub endpoint: SharedEndpoint,
    pub model: String,
    pub in_clusters: BTreeSet<u16>,
    pub color_capabilities: Option<u16>,
}

impl DiscoveryInfo {
    pub fn new(endpoint: SharedEndpoint, model: impl Into<String>) -> Self {
        let in_clusters = endpoint.cluster_ids();
        Self {
            endpoint,
            model: model.into(),
            in_clusters,
            color_capabilities: None,
        }
    }

    /// Record a color-capability mask discovery already obtained
    pub fn with_color_capabilities(mut self, mask: u16) -> Self {
        self.color_capabilities = Some(mask);
        self
    }

    pub fn ieee(&self) -> &str {
        self.endpoint.ieee()
    }

    pub fn endpoint_id(&self) -> u8 {
        self.endpoint.endpoint_id()
    }
}
