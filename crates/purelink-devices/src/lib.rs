//! PureLink Devices
//!
//! Transport side of the PureLink client: configuration loading and the MQTT
//! link to one appliance. Decoding is delegated to `purelink-core`.
//!
//! ## Features
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `mqtt` | ✅ | MQTT link (rumqttc) |

pub mod adapter;
pub mod config;

#[cfg(feature = "mqtt")]
pub mod mqtt;

pub use adapter::{AdapterError, AdapterResult, ConnectionStatus, LinkEvent};
pub use config::DeviceConfig;

#[cfg(feature = "mqtt")]
pub use mqtt::PureLinkDevice;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
