//! Entry points combining classification and decoding.

use crate::error::Result;
use crate::message::{Message, MessageKind};
use crate::sensors::SensorsData;
use crate::state::StateData;
use crate::temperature::TemperatureUnit;

/// Outcome of decoding one message.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    Sensors(SensorsData),
    State(StateData),
    /// Message this core does not decode; carries its type tag.
    Other(String),
}

pub fn decode_sensor_data(message: &Message, unit: TemperatureUnit) -> Result<SensorsData> {
    SensorsData::decode(message, unit)
}

pub fn decode_state_data(message: &Message) -> Result<StateData> {
    StateData::decode(message)
}

/// Classify `message` and decode it when it is sensor or state data.
pub fn decode_message(message: &Message, unit: TemperatureUnit) -> Result<Decoded> {
    match message.kind() {
        MessageKind::Sensor => decode_sensor_data(message, unit).map(Decoded::Sensors),
        MessageKind::State => decode_state_data(message).map(Decoded::State),
        MessageKind::Other => Ok(Decoded::Other(message.msg.clone())),
    }
}

/// Parse raw bytes and decode them in one step.
pub fn decode_bytes(bytes: &[u8], unit: TemperatureUnit) -> Result<Decoded> {
    decode_message(&Message::parse(bytes)?, unit)
}
