//! Cluster abstraction and endpoint model for the ZHA bridge
//!
//! This crate defines the boundary between the entity layer and the radio
//! stack. Entities talk to [`Cluster`] trait objects and never see raw ZCL
//! frames; a radio backend implements the trait, and [`safe_read`] gives
//! entities a read primitive that degrades to an empty result instead of
//! failing.

mod cluster;
mod endpoint;
mod error;

pub use cluster::{
    safe_read, AttributeRecord, Cluster, ClusterCommand, ReadResult, SharedCluster,
};
pub use endpoint::{DiscoveryInfo, Endpoint, SharedEndpoint};
pub use error::TransportError;
