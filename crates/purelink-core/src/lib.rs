//! PureLink Core
//!
//! Message decoding and value model for Dyson Pure Link air purifiers.
//!
//! ## Architecture
//!
//! - **message**: envelope parsing and classification by type tag
//! - **field**: scalar / history-pair normalization
//! - **sensors** / **state**: typed snapshots decoded from payloads
//! - **temperature**: Kelvin, Celsius and Fahrenheit conversions, humidex
//! - **return_code**: connection and disconnection code descriptions
//! - **commands**: outgoing command envelopes
//!
//! Everything here is pure and synchronous; the transport lives in
//! `purelink-devices`.

pub mod commands;
pub mod config;
pub mod decode;
pub mod error;
pub mod field;
pub mod message;
pub mod return_code;
pub mod sensors;
pub mod state;
pub mod temperature;

pub use commands::{DeviceCommand, FanMode, StandbyMonitoring};
pub use decode::{decode_bytes, decode_message, decode_sensor_data, decode_state_data, Decoded};
pub use error::{Error, Result};
pub use field::{current_value, FieldValue};
pub use message::{classify, Message, MessageKind, Payload};
pub use return_code::{
    map_connection_code, map_disconnection_code, ConnectionError, DisconnectionError,
};
pub use sensors::SensorsData;
pub use state::StateData;
pub use temperature::TemperatureUnit;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
