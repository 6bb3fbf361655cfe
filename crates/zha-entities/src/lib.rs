//! Light and sensor entity adapters for the ZHA bridge
//!
//! This crate turns discovered device endpoints into typed entities. The
//! factories inspect an endpoint's input clusters to pick the entity kind
//! and its feature set; the adapters own the cached state, poll or receive
//! pushed attribute updates through the transport layer, and issue cluster
//! commands for the mutating operations.
//!
//! Entities never let a flaky device take them down. Failed reads leave
//! the previous cached value in place, and per-model quirk handlers are
//! consulted but can never break generic handling.

pub mod color;
mod factory;
mod features;
mod light;
mod platform;
mod sensor;

pub use factory::{make_light, make_sensor};
pub use features::LightFeatures;
pub use light::{Light, TurnOn, DEFAULT_TRANSITION};
pub use platform::{Platform, SharedPlatform, TemperatureUnit, UnitSystem};
pub use sensor::{DisplayPolicy, Sensor, SensorKind, SensorProfile, SensorUnit};
