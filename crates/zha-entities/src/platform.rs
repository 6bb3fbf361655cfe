//! The platform boundary entities report into

use std::sync::Arc;
use zha_core::EntityId;

/// Temperature unit configured on the platform
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    /// Convert a Celsius reading into this unit
    pub fn from_celsius(&self, celsius: f64) -> f64 {
        match self {
            TemperatureUnit::Celsius => celsius,
            TemperatureUnit::Fahrenheit => celsius * 1.8 + 32.0,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "°C",
            TemperatureUnit::Fahrenheit => "°F",
        }
    }
}

/// Unit system configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnitSystem {
    pub temperature: TemperatureUnit,
}

impl UnitSystem {
    /// Create metric unit system
    pub fn metric() -> Self {
        Self {
            temperature: TemperatureUnit::Celsius,
        }
    }

    /// Create imperial unit system
    pub fn imperial() -> Self {
        Self {
            temperature: TemperatureUnit::Fahrenheit,
        }
    }
}

/// What entities need from the hosting platform.
///
/// `schedule_update` is fire and forget; the platform is expected to read
/// the entity's properties again at its convenience.
pub trait Platform: Send + Sync {
    /// Ask the platform to refresh its view of the entity
    fn schedule_update(&self, entity_id: &EntityId);

    /// Configured units for display conversion
    fn units(&self) -> UnitSystem;
}

/// Shared handle to the platform
pub type SharedPlatform = Arc<dyn Platform>;
