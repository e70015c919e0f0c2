//! Link errors, connection status and events.

use purelink_core::{ConnectionError, DisconnectionError, SensorsData, StateData};
use thiserror::Error;

/// Result type for link operations.
pub type AdapterResult<T> = Result<T, AdapterError>;

/// Error type for device link operations.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The device refused or never acknowledged the connection
    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),

    /// The link did not close cleanly
    #[error("Disconnection error: {0}")]
    Disconnection(#[from] DisconnectionError),

    /// Communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// A message or return code the core could not decode
    #[error("Decode error: {0}")]
    Decode(#[from] purelink_core::Error),

    /// Operation timeout
    #[error("Operation timeout after {0}ms")]
    Timeout(u64),

    /// No open link
    #[error("Device is not connected")]
    NotConnected,

    /// Other error
    #[error("Adapter error: {0}")]
    Other(#[from] anyhow::Error),
}

/// Link connection status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Error,
}

impl ConnectionStatus {
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }
}

/// Event decoded by the MQTT event loop and folded into the link state.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkEvent {
    /// CONNACK received (or refused) with its return code.
    Connected { code: u8 },
    /// The link closed; code 0 for a requested disconnect.
    Disconnected { code: u8 },
    State(StateData),
    Sensors(SensorsData),
}
