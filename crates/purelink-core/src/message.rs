//! Device message envelope and classification.
//!
//! ## Envelope
//!
//! ```text
//! {
//!   "msg": "CURRENT-STATE",            // type tag
//!   "time": "2024-01-01T12:00:00.000Z",
//!   "product-state": { "fmod": "FAN", "fnsp": ["0004", "AUTO"], ... }
//! }
//! {
//!   "msg": "ENVIRONMENTAL-CURRENT-SENSOR-DATA",
//!   "data": { "tact": "2931", "hact": "0045", "pact": "0003", "vact": "INIT" }
//! }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Type tag of environmental sensor snapshots.
pub const SENSOR_DATA_MSG: &str = "ENVIRONMENTAL-CURRENT-SENSOR-DATA";
/// Type tag of a full state report.
pub const CURRENT_STATE_MSG: &str = "CURRENT-STATE";
/// Type tag of a state change notification.
pub const STATE_CHANGE_MSG: &str = "STATE-CHANGE";

/// Kind of an incoming message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Sensor,
    State,
    Other,
}

impl MessageKind {
    /// Classify a type tag.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            SENSOR_DATA_MSG => Self::Sensor,
            CURRENT_STATE_MSG | STATE_CHANGE_MSG => Self::State,
            _ => Self::Other,
        }
    }
}

/// Field mapping keyed by short device codes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payload(Map<String, Value>);

impl Payload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, code: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(code.into(), value.into());
        self
    }

    /// Raw value of a field that must be present.
    pub fn required(&self, code: &str) -> Result<&Value> {
        self.0.get(code).ok_or_else(|| Error::missing_field(code))
    }

    pub fn optional(&self, code: &str) -> Option<&Value> {
        self.0.get(code)
    }
}

/// A decoded protocol message, as delivered by the transport.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    /// Type tag.
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    /// Sensor readings (sensor messages).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Payload>,
    /// Device state (state messages).
    #[serde(rename = "product-state", skip_serializing_if = "Option::is_none")]
    pub product_state: Option<Payload>,
}

impl Message {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            msg: msg.into(),
            time: None,
            data: None,
            product_state: None,
        }
    }

    pub fn with_data(mut self, data: Payload) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_product_state(mut self, state: Payload) -> Self {
        self.product_state = Some(state);
        self
    }

    /// Parse a raw MQTT payload.
    ///
    /// Sub-mappings that are not JSON objects are dropped rather than
    /// rejected here: messages this core does not decode may carry other
    /// shapes, and decoders report the missing payload themselves.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(bytes)
            .map_err(|e| Error::InvalidMessage(format!("not valid JSON: {}", e)))?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(mut object) = value else {
            return Err(Error::InvalidMessage("expected a JSON object".to_string()));
        };

        let msg = match object.remove("msg") {
            Some(Value::String(msg)) => msg,
            Some(other) => {
                return Err(Error::InvalidMessage(format!(
                    "`msg` must be a string, got {}",
                    other
                )))
            }
            None => return Err(Error::InvalidMessage("missing `msg` field".to_string())),
        };

        let time = match object.remove("time") {
            Some(Value::String(time)) => Some(time),
            _ => None,
        };

        Ok(Self {
            msg,
            time,
            data: take_payload(&mut object, "data"),
            product_state: take_payload(&mut object, "product-state"),
        })
    }

    pub fn kind(&self) -> MessageKind {
        MessageKind::from_tag(&self.msg)
    }
}

fn take_payload(object: &mut Map<String, Value>, key: &str) -> Option<Payload> {
    match object.remove(key) {
        Some(Value::Object(map)) => Some(Payload(map)),
        _ => None,
    }
}

/// Classify a message by its type tag.
pub fn classify(message: &Message) -> MessageKind {
    message.kind()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classify_tags() {
        assert_eq!(MessageKind::from_tag("ENVIRONMENTAL-CURRENT-SENSOR-DATA"), MessageKind::Sensor);
        assert_eq!(MessageKind::from_tag("CURRENT-STATE"), MessageKind::State);
        assert_eq!(MessageKind::from_tag("STATE-CHANGE"), MessageKind::State);
        assert_eq!(MessageKind::from_tag("WELCOME"), MessageKind::Other);
        assert_eq!(MessageKind::from_tag("current-state"), MessageKind::Other);
    }

    #[test]
    fn test_parse_state_message() {
        let raw = br#"{"msg":"CURRENT-STATE","time":"2024-01-01T00:00:00.000Z","product-state":{"fmod":"FAN"}}"#;
        let message = Message::parse(raw).unwrap();
        assert_eq!(message.kind(), MessageKind::State);
        assert_eq!(message.time.as_deref(), Some("2024-01-01T00:00:00.000Z"));
        let state = message.product_state.unwrap();
        assert_eq!(state.required("fmod").unwrap(), &json!("FAN"));
        assert!(message.data.is_none());
    }

    #[test]
    fn test_parse_ignores_unknown_shapes() {
        let raw = br#"{"msg":"CURRENT-FAULTS","product-errors":{"amf1":"OK"},"data":[1,2]}"#;
        let message = Message::parse(raw).unwrap();
        assert_eq!(message.kind(), MessageKind::Other);
        assert!(message.data.is_none());
    }

    #[test]
    fn test_parse_rejects_bad_envelopes() {
        assert!(matches!(Message::parse(b"not json"), Err(Error::InvalidMessage(_))));
        assert!(matches!(Message::parse(b"[1]"), Err(Error::InvalidMessage(_))));
        assert!(matches!(Message::parse(br#"{"time":"x"}"#), Err(Error::InvalidMessage(_))));
        assert!(matches!(Message::parse(br#"{"msg":5}"#), Err(Error::InvalidMessage(_))));
    }

    #[test]
    fn test_serialize_uses_wire_names() {
        let message = Message::new(CURRENT_STATE_MSG)
            .with_product_state(Payload::new().with_field("rhtm", "ON"));
        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value, json!({"msg": "CURRENT-STATE", "product-state": {"rhtm": "ON"}}));
    }
}
