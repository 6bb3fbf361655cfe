//! Core types for the ZHA bridge
//!
//! This crate provides the fundamental types shared by the transport,
//! quirk, and entity layers: EntityId, AttributeValue, OnOffState, and the
//! Zigbee Cluster Library constant tables.

mod attribute;
mod entity_id;
mod state;
pub mod zcl;

pub use attribute::AttributeValue;
pub use entity_id::{EntityId, EntityIdError};
pub use state::OnOffState;

/// State string for an entity that is on
pub const STATE_ON: &str = "on";

/// State string for an entity that is off
pub const STATE_OFF: &str = "off";

/// State string for an entity whose state has never been observed
pub const STATE_UNKNOWN: &str = "unknown";
