//! On/off state tracking for switchable entities

use crate::attribute::AttributeValue;
use crate::{STATE_OFF, STATE_ON, STATE_UNKNOWN};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Cached on/off state of a switchable entity.
///
/// Freshly created entities start out `Unknown` until the first read or
/// report arrives. An unknown state reads as "not on", so a light that has
/// never been observed is treated as off.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnOffState {
    #[default]
    Unknown,
    Off,
    On,
}

impl OnOffState {
    /// Whether the entity is known to be on
    pub fn is_on(&self) -> bool {
        matches!(self, OnOffState::On)
    }

    /// Build a state from a raw OnOff attribute value. Values that cannot
    /// be interpreted as a boolean leave the state unknown.
    pub fn from_attribute(value: &AttributeValue) -> Self {
        match value.as_bool() {
            Some(true) => OnOffState::On,
            Some(false) => OnOffState::Off,
            None => OnOffState::Unknown,
        }
    }

    /// The state string exposed to the platform
    pub fn as_str(&self) -> &'static str {
        match self {
            OnOffState::Unknown => STATE_UNKNOWN,
            OnOffState::Off => STATE_OFF,
            OnOffState::On => STATE_ON,
        }
    }
}

impl From<bool> for OnOffState {
    fn from(on: bool) -> Self {
        if on {
            OnOffState::On
        } else {
            OnOffState::Off
        }
    }
}

impl fmt::Display for OnOffState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_unknown() {
        assert_eq!(OnOffState::default(), OnOffState::Unknown);
        assert!(!OnOffState::default().is_on());
    }

    #[test]
    fn test_from_attribute() {
        assert_eq!(
            OnOffState::from_attribute(&AttributeValue::Int(1)),
            OnOffState::On
        );
        assert_eq!(
            OnOffState::from_attribute(&AttributeValue::Int(0)),
            OnOffState::Off
        );
        assert_eq!(
            OnOffState::from_attribute(&AttributeValue::Bool(true)),
            OnOffState::On
        );
        assert_eq!(
            OnOffState::from_attribute(&AttributeValue::Text("garbage".into())),
            OnOffState::Unknown
        );
    }

    #[test]
    fn test_state_strings() {
        assert_eq!(OnOffState::On.to_string(), "on");
        assert_eq!(OnOffState::Off.to_string(), "off");
        assert_eq!(OnOffState::Unknown.to_string(), "unknown");
    }
}
