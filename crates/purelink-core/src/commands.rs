//! Outgoing device commands.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::Error;
use crate::state::codes;

pub const REQUEST_CURRENT_STATE_MSG: &str = "REQUEST-CURRENT-STATE";
pub const REQUEST_SENSOR_DATA_MSG: &str = "REQUEST-PRODUCT-ENVIRONMENT-CURRENT-SENSOR-DATA";
pub const STATE_SET_MSG: &str = "STATE-SET";

/// Timestamp format the device expects in `time`.
const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Fan mode (`fmod`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FanMode {
    Off,
    Fan,
    Auto,
}

impl FanMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "OFF",
            Self::Fan => "FAN",
            Self::Auto => "AUTO",
        }
    }
}

impl fmt::Display for FanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FanMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "OFF" => Ok(Self::Off),
            "FAN" | "ON" => Ok(Self::Fan),
            "AUTO" => Ok(Self::Auto),
            _ => Err(Error::InvalidToken {
                kind: "fan mode",
                value: s.to_string(),
            }),
        }
    }
}

/// Air quality monitoring while on standby (`rhtm`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StandbyMonitoring {
    On,
    Off,
}

impl StandbyMonitoring {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::On => "ON",
            Self::Off => "OFF",
        }
    }
}

impl fmt::Display for StandbyMonitoring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StandbyMonitoring {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ON" => Ok(Self::On),
            "OFF" => Ok(Self::Off),
            _ => Err(Error::InvalidToken {
                kind: "standby monitoring",
                value: s.to_string(),
            }),
        }
    }
}

/// A command published to the device's command topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceCommand {
    /// Ask for a `CURRENT-STATE` report (the device also sends sensor data).
    RequestCurrentState,
    /// Ask for an environmental sensor snapshot only.
    RequestSensorData,
    SetFanMode(FanMode),
    SetStandbyMonitoring(StandbyMonitoring),
}

impl DeviceCommand {
    pub fn msg(&self) -> &'static str {
        match self {
            Self::RequestCurrentState => REQUEST_CURRENT_STATE_MSG,
            Self::RequestSensorData => REQUEST_SENSOR_DATA_MSG,
            Self::SetFanMode(_) | Self::SetStandbyMonitoring(_) => STATE_SET_MSG,
        }
    }

    /// Whether the command changes device state.
    pub fn is_state_change(&self) -> bool {
        matches!(self, Self::SetFanMode(_) | Self::SetStandbyMonitoring(_))
    }

    /// JSON envelope for this command, stamped with `now`.
    pub fn to_json(&self, now: DateTime<Utc>) -> Value {
        let time = now.format(TIME_FORMAT).to_string();
        match self.state_data() {
            Some(data) => json!({ "msg": self.msg(), "time": time, "data": data }),
            None => json!({ "msg": self.msg(), "time": time }),
        }
    }

    /// Serialized envelope stamped with the current time.
    pub fn to_payload(&self) -> Vec<u8> {
        self.to_json(Utc::now()).to_string().into_bytes()
    }

    fn state_data(&self) -> Option<Map<String, Value>> {
        let (code, value) = match self {
            Self::SetFanMode(mode) => (codes::FAN_MODE, mode.as_str()),
            Self::SetStandbyMonitoring(monitor) => (codes::STANDBY_MONITORING, monitor.as_str()),
            _ => return None,
        };
        let mut data = Map::new();
        data.insert(code.to_string(), Value::String(value.to_string()));
        Some(data)
    }
}
