//! Entity ID type representing a domain.object_id pair

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error type for invalid entity IDs
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EntityIdError {
    #[error("entity_id must contain exactly one '.' separator")]
    InvalidFormat,

    #[error("{part} must be lowercase alphanumeric with underscores and cannot start or end with an underscore")]
    InvalidChars { part: &'static str },
}

/// An entity identifier such as "light.zha_00124b0001dd7a3c_1"
///
/// The object_id for ZHA entities is derived from the device IEEE address
/// and endpoint number, so every endpoint maps to a stable identifier no
/// matter in which order devices are discovered.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityId {
    domain: String,
    object_id: String,
}

impl EntityId {
    /// Create a new EntityId from domain and object_id parts
    pub fn new(
        domain: impl Into<String>,
        object_id: impl Into<String>,
    ) -> Result<Self, EntityIdError> {
        let domain = domain.into();
        let object_id = object_id.into();

        if !is_valid_part(&domain) {
            return Err(EntityIdError::InvalidChars { part: "domain" });
        }
        if !is_valid_part(&object_id) {
            return Err(EntityIdError::InvalidChars { part: "object_id" });
        }

        Ok(Self { domain, object_id })
    }

    /// Derive the entity ID for a device endpoint.
    ///
    /// The IEEE address is lowercased and stripped of separators, so
    /// "00:12:4B:00:01:DD:7A:3C" and "00124b0001dd7a3c" produce the same
    /// identifier.
    pub fn for_endpoint(
        domain: &str,
        ieee: &str,
        endpoint_id: u8,
    ) -> Result<Self, EntityIdError> {
        let ieee: String = ieee
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .map(|c| c.to_ascii_lowercase())
            .collect();
        Self::new(domain, format!("zha_{}_{}", ieee, endpoint_id))
    }

    /// Get the domain part of the entity ID
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Get the object_id part of the entity ID
    pub fn object_id(&self) -> &str {
        &self.object_id
    }
}

/// Valid parts are non-empty, lowercase alphanumeric with underscores, and
/// do not start or end with an underscore.
fn is_valid_part(s: &str) -> bool {
    if s.is_empty() || s.starts_with('_') || s.ends_with('_') {
        return false;
    }
    s.chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

impl FromStr for EntityId {
    type Err = EntityIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('.') {
            Some((domain, object_id)) if !object_id.contains('.') => {
                Self::new(domain, object_id)
            }
            _ => Err(EntityIdError::InvalidFormat),
        }
    }
}

impl TryFrom<String> for EntityId {
    type Error = EntityIdError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<EntityId> for String {
    fn from(id: EntityId) -> String {
        id.to_string()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.domain, self.object_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_endpoint() {
        let id = EntityId::for_endpoint("light", "00:12:4B:00:01:DD:7A:3C", 1).unwrap();
        assert_eq!(id.domain(), "light");
        assert_eq!(id.object_id(), "zha_00124b0001dd7a3c_1");
        assert_eq!(id.to_string(), "light.zha_00124b0001dd7a3c_1");
    }

    #[test]
    fn test_for_endpoint_is_separator_insensitive() {
        let colons = EntityId::for_endpoint("sensor", "00:12:4b:00:01:dd:7a:3c", 2).unwrap();
        let bare = EntityId::for_endpoint("sensor", "00124B0001DD7A3C", 2).unwrap();
        assert_eq!(colons, bare);
    }

    #[test]
    fn test_parse_entity_id() {
        let id: EntityId = "sensor.zha_00124b0001dd7a3c_1".parse().unwrap();
        assert_eq!(id.domain(), "sensor");
        assert_eq!(id.object_id(), "zha_00124b0001dd7a3c_1");
    }

    #[test]
    fn test_invalid_format() {
        assert_eq!(
            "no_separator".parse::<EntityId>().unwrap_err(),
            EntityIdError::InvalidFormat
        );
        assert_eq!(
            "too.many.parts".parse::<EntityId>().unwrap_err(),
            EntityIdError::InvalidFormat
        );
    }

    #[test]
    fn test_invalid_chars() {
        assert!("LIGHT.room".parse::<EntityId>().is_err());
        assert!("light.With Space".parse::<EntityId>().is_err());
        assert!("light._room".parse::<EntityId>().is_err());
        assert!("light.room_".parse::<EntityId>().is_err());
        assert!(EntityId::new("", "room").is_err());
        assert!(EntityId::new("light", "").is_err());
    }

    #[test]
    fn test_serde_roundtrip() {
        let id = EntityId::for_endpoint("light", "00124b0001dd7a3c", 1).unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"light.zha_00124b0001dd7a3c_1\"");

        let parsed: EntityId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }
}
