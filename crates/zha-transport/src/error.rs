//! Transport error types

use thiserror::Error;

/// Errors surfaced by the radio layer
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("request timed out waiting for the device")]
    Timeout,

    #[error("device is unreachable")]
    Unreachable,

    #[error("attribute 0x{0:04x} is not supported by the cluster")]
    UnsupportedAttribute(u16),

    #[error("endpoint has no cluster 0x{0:04x}")]
    NoSuchCluster(u16),

    #[error("ZCL failure status 0x{0:02x}")]
    Status(u8),

    #[error("protocol error: {0}")]
    Protocol(String),
}
