//! Device handler registry for model-specific ZHA quirks
//!
//! Some devices ship firmware that reports attributes under the wrong
//! identifier, packs several readings into one manufacturer attribute, or
//! sends cluster commands that need model-specific interpretation. A
//! [`DeviceHandler`] fixes up such traffic for one device model, and the
//! [`QuirkRegistry`] dispatches to handlers by model string.
//!
//! Quirks are strictly best-effort. A missing or failing handler never
//! breaks attribute processing; the registry falls back to the values as
//! the device sent them.

use dashmap::DashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};
use zha_core::AttributeValue;

/// Errors a device handler can raise
#[derive(Debug, Clone, Error)]
pub enum QuirkError {
    #[error("malformed device payload: {0}")]
    Malformed(String),

    #[error("handler failed: {0}")]
    Failed(String),
}

/// Model-specific fixups for one device family.
///
/// Both hooks default to passthrough, so a handler only implements the
/// traffic it actually needs to touch.
pub trait DeviceHandler: Send + Sync {
    /// Rewrite an incoming attribute report.
    ///
    /// Returns the attribute identifier and value to process in place of
    /// the reported ones.
    fn parse_attribute(
        &self,
        attribute: u16,
        value: AttributeValue,
    ) -> Result<(u16, AttributeValue), QuirkError> {
        Ok((attribute, value))
    }

    /// Interpret a cluster-specific command from the device
    fn cluster_command(
        &self,
        tsn: u8,
        command_id: u8,
        args: &[AttributeValue],
    ) -> Result<(), QuirkError> {
        let _ = (tsn, command_id, args);
        Ok(())
    }
}

/// Derive the registry key from a model string.
///
/// Dots and spaces become underscores, so "lumi.sensor_ht" and
/// "FLS-PP3 White" both form keys a handler can be registered under.
pub fn model_key(model: &str) -> String {
    model.replace(['.', ' '], "_")
}

/// The quirk registry maps device model strings to handlers
pub struct QuirkRegistry {
    /// Handlers indexed by sanitized model key
    handlers: DashMap<String, Arc<dyn DeviceHandler>>,
}

impl QuirkRegistry {
    /// Create a new empty quirk registry
    pub fn new() -> Self {
        Self {
            handlers: DashMap::new(),
        }
    }

    /// Register a handler for a device model
    pub fn register(&self, model: &str, handler: Arc<dyn DeviceHandler>) {
        let key = model_key(model);
        debug!(model = %model, key = %key, "Registering device handler");
        self.handlers.insert(key, handler);
    }

    /// Check if a handler is registered for a model
    pub fn has_handler(&self, model: &str) -> bool {
        self.handlers.contains_key(&model_key(model))
    }

    /// Get total number of registered handlers
    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Run an attribute report through the model's handler.
    ///
    /// Without a handler, or when the handler fails, the report passes
    /// through unchanged.
    pub fn parse_attribute(
        &self,
        model: &str,
        attribute: u16,
        value: AttributeValue,
    ) -> (u16, AttributeValue) {
        let key = model_key(model);
        let Some(handler) = self.handlers.get(&key) else {
            debug!(model = %model, "No device handler registered");
            return (attribute, value);
        };

        match handler.parse_attribute(attribute, value.clone()) {
            Ok(parsed) => parsed,
            Err(err) => {
                info!(model = %model, error = %err, "Device handler failed to parse attribute");
                (attribute, value)
            }
        }
    }

    /// Forward a cluster-specific command to the model's handler.
    ///
    /// Returns whether a handler processed the command.
    pub fn cluster_command(
        &self,
        model: &str,
        tsn: u8,
        command_id: u8,
        args: &[AttributeValue],
    ) -> bool {
        let key = model_key(model);
        let Some(handler) = self.handlers.get(&key) else {
            debug!(model = %model, "No device handler registered");
            return false;
        };

        match handler.cluster_command(tsn, command_id, args) {
            Ok(()) => true,
            Err(err) => {
                info!(model = %model, error = %err, "Device handler failed on cluster command");
                false
            }
        }
    }
}

impl Default for QuirkRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Thread-safe wrapper for QuirkRegistry
pub type SharedQuirkRegistry = Arc<QuirkRegistry>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Remaps attribute 0 to 0xff01 and halves integer values
    struct RemapHandler;

    impl DeviceHandler for RemapHandler {
        fn parse_attribute(
            &self,
            attribute: u16,
            value: AttributeValue,
        ) -> Result<(u16, AttributeValue), QuirkError> {
            if attribute == 0 {
                let raw = value
                    .as_i64()
                    .ok_or_else(|| QuirkError::Malformed(format!("expected int, got {value}")))?;
                Ok((0xff01, AttributeValue::Int(raw / 2)))
            } else {
                Ok((attribute, value))
            }
        }
    }

    struct FailingHandler;

    impl DeviceHandler for FailingHandler {
        fn parse_attribute(
            &self,
            _attribute: u16,
            _value: AttributeValue,
        ) -> Result<(u16, AttributeValue), QuirkError> {
            Err(QuirkError::Failed("always fails".into()))
        }
    }

    #[derive(Default)]
    struct RecordingHandler {
        commands: Mutex<Vec<(u8, u8)>>,
    }

    impl DeviceHandler for RecordingHandler {
        fn cluster_command(
            &self,
            tsn: u8,
            command_id: u8,
            _args: &[AttributeValue],
        ) -> Result<(), QuirkError> {
            self.commands.lock().unwrap().push((tsn, command_id));
            Ok(())
        }
    }

    #[test]
    fn test_model_key() {
        assert_eq!(model_key("lumi.sensor_ht"), "lumi_sensor_ht");
        assert_eq!(model_key("FLS-PP3 White"), "FLS-PP3_White");
        assert_eq!(model_key("plain"), "plain");
    }

    #[test]
    fn test_register_and_lookup() {
        let registry = QuirkRegistry::new();
        registry.register("lumi.sensor_ht", Arc::new(RemapHandler));

        assert!(registry.has_handler("lumi.sensor_ht"));
        assert!(registry.has_handler("lumi sensor_ht"));
        assert!(!registry.has_handler("other.model"));
        assert_eq!(registry.handler_count(), 1);
    }

    #[test]
    fn test_parse_attribute_without_handler_passes_through() {
        let registry = QuirkRegistry::new();
        let (attr, value) =
            registry.parse_attribute("unknown.model", 0x0000, AttributeValue::Int(2577));
        assert_eq!(attr, 0x0000);
        assert_eq!(value, AttributeValue::Int(2577));
    }

    #[test]
    fn test_parse_attribute_remaps() {
        let registry = QuirkRegistry::new();
        registry.register("lumi.sensor_ht", Arc::new(RemapHandler));

        let (attr, value) =
            registry.parse_attribute("lumi.sensor_ht", 0x0000, AttributeValue::Int(100));
        assert_eq!(attr, 0xff01);
        assert_eq!(value, AttributeValue::Int(50));

        // Untouched attributes pass through
        let (attr, value) =
            registry.parse_attribute("lumi.sensor_ht", 0x0001, AttributeValue::Int(7));
        assert_eq!(attr, 0x0001);
        assert_eq!(value, AttributeValue::Int(7));
    }

    #[test]
    fn test_failing_handler_falls_back_to_original() {
        let registry = QuirkRegistry::new();
        registry.register("bad.model", Arc::new(FailingHandler));

        let (attr, value) =
            registry.parse_attribute("bad.model", 0x0000, AttributeValue::Int(42));
        assert_eq!(attr, 0x0000);
        assert_eq!(value, AttributeValue::Int(42));
    }

    #[test]
    fn test_cluster_command_dispatch() {
        let registry = QuirkRegistry::new();
        let handler = Arc::new(RecordingHandler::default());
        registry.register("remote.ctrl", handler.clone());

        let handled = registry.cluster_command("remote.ctrl", 12, 0x02, &[]);
        assert!(handled);
        assert_eq!(*handler.commands.lock().unwrap(), vec![(12, 0x02)]);

        let handled = registry.cluster_command("unknown.model", 1, 0x01, &[]);
        assert!(!handled);
    }
}
