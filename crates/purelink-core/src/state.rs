//! Device configuration/status snapshots.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::commands::{FanMode, StandbyMonitoring};
use crate::error::{Error, Result};
use crate::field::current_value;
use crate::message::{Message, MessageKind, Payload};

/// Fan speed token meaning "automatic".
pub const AUTO: &str = "AUTO";
/// Value `fan_speed` takes when the device runs in automatic speed.
pub const AUTO_FAN_SPEED: &str = "-1";

/// Device codes of the state payload.
pub mod codes {
    pub const FAN_MODE: &str = "fmod";
    pub const FAN_SPEED: &str = "fnsp";
    pub const FAN_STATE: &str = "fnst";
    pub const HEATING_MODE: &str = "hmod";
    pub const HEATING_MAX_TEMP: &str = "hmax";
    pub const HEATING_STATE: &str = "hsta";
    pub const NIGHT_MODE: &str = "nmod";
    pub const OSCILLATION: &str = "oson";
    pub const FILTER_LIFE: &str = "filf";
    pub const QUALITY_TARGET: &str = "qtar";
    pub const STANDBY_MONITORING: &str = "rhtm";
}

/// One device state snapshot. Every attribute holds the latest value of its
/// field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateData {
    pub fan_mode: String,
    /// Numeric speed, or `"-1"` for automatic.
    pub fan_speed: String,
    pub fan_state: String,
    /// Heating fields are only reported by models with a heater.
    pub heating_mode: Option<String>,
    pub heating_max_temp: Option<String>,
    pub heating_state: Option<String>,
    pub night_mode: String,
    /// Same field as `fan_speed`, without the `AUTO` rewrite.
    pub speed: String,
    pub oscillation: String,
    pub filter_life: String,
    pub quality_target: String,
    pub standby_monitoring: String,
}

impl StateData {
    /// Decode a state-classified message.
    pub fn decode(message: &Message) -> Result<Self> {
        if message.kind() != MessageKind::State {
            return Err(Error::InvalidMessage(format!(
                "`{}` is not a state message",
                message.msg
            )));
        }
        let state = message
            .product_state
            .as_ref()
            .ok_or_else(|| Error::missing_field("product-state"))?;
        Self::from_payload(state)
    }

    /// Decode the `product-state` payload of a state message.
    pub fn from_payload(state: &Payload) -> Result<Self> {
        let speed = required(state, codes::FAN_SPEED)?;
        let fan_speed = if speed == AUTO {
            AUTO_FAN_SPEED.to_string()
        } else {
            speed.clone()
        };

        Ok(Self {
            fan_mode: required(state, codes::FAN_MODE)?,
            fan_speed,
            fan_state: required(state, codes::FAN_STATE)?,
            heating_mode: optional(state, codes::HEATING_MODE)?,
            heating_max_temp: optional(state, codes::HEATING_MAX_TEMP)?,
            heating_state: optional(state, codes::HEATING_STATE)?,
            night_mode: required(state, codes::NIGHT_MODE)?,
            speed,
            oscillation: required(state, codes::OSCILLATION)?,
            filter_life: required(state, codes::FILTER_LIFE)?,
            quality_target: required(state, codes::QUALITY_TARGET)?,
            standby_monitoring: required(state, codes::STANDBY_MONITORING)?,
        })
    }

    /// `fan_mode` as a known mode, if it is one.
    pub fn fan_mode_kind(&self) -> Option<FanMode> {
        self.fan_mode.parse().ok()
    }

    /// `standby_monitoring` as a known setting, if it is one.
    pub fn standby_monitoring_kind(&self) -> Option<StandbyMonitoring> {
        self.standby_monitoring.parse().ok()
    }

    pub fn is_auto_speed(&self) -> bool {
        self.fan_speed == AUTO_FAN_SPEED
    }
}

impl fmt::Display for StateData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Fan mode: {}, Fan speed: {}, Oscillation: {}, Filter life: {}, Standby monitoring: {}",
            self.fan_mode, self.speed, self.oscillation, self.filter_life, self.standby_monitoring
        )?;
        if let Some(heating_mode) = &self.heating_mode {
            write!(f, ", Heating mode: {}", heating_mode)?;
        }
        Ok(())
    }
}

fn required(state: &Payload, code: &str) -> Result<String> {
    current_value(code, state.required(code)?)
}

fn optional(state: &Payload, code: &str) -> Result<Option<String>> {
    state
        .optional(code)
        .map(|raw| current_value(code, raw))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pure_cool_state() -> Payload {
        Payload::new()
            .with_field("fmod", json!(["FAN", "AUTO"]))
            .with_field("fnsp", json!(["0004", "AUTO"]))
            .with_field("fnst", "FAN")
            .with_field("nmod", "OFF")
            .with_field("oson", "ON")
            .with_field("filf", "2087")
            .with_field("qtar", "0003")
            .with_field("rhtm", json!(["OFF", "ON"]))
    }

    #[test]
    fn test_auto_speed_rewrite() {
        let state = StateData::from_payload(&pure_cool_state()).unwrap();
        assert_eq!(state.fan_speed, "-1");
        assert_eq!(state.speed, "AUTO");
        assert!(state.is_auto_speed());
    }

    #[test]
    fn test_every_field_normalized() {
        let state = StateData::from_payload(&pure_cool_state()).unwrap();
        assert_eq!(state.fan_mode, "AUTO");
        assert_eq!(state.fan_state, "FAN");
        assert_eq!(state.oscillation, "ON");
        assert_eq!(state.standby_monitoring, "ON");
        assert_eq!(state.fan_mode_kind(), Some(FanMode::Auto));
        assert_eq!(state.standby_monitoring_kind(), Some(StandbyMonitoring::On));
        assert_eq!(state.heating_mode, None);
    }

    #[test]
    fn test_numeric_speed_is_kept() {
        let payload = pure_cool_state().with_field("fnsp", json!(["AUTO", "0007"]));
        let state = StateData::from_payload(&payload).unwrap();
        assert_eq!(state.fan_speed, "0007");
        assert_eq!(state.speed, "0007");
    }

    #[test]
    fn test_heating_fields() {
        let payload = pure_cool_state()
            .with_field("hmod", json!(["OFF", "HEAT"]))
            .with_field("hmax", "2980")
            .with_field("hsta", "OFF");
        let state = StateData::from_payload(&payload).unwrap();
        assert_eq!(state.heating_mode.as_deref(), Some("HEAT"));
        assert_eq!(state.heating_max_temp.as_deref(), Some("2980"));
        assert_eq!(state.heating_state.as_deref(), Some("OFF"));
    }

    #[test]
    fn test_missing_code() {
        let mut payload = Payload::new();
        for (code, value) in [("fmod", "FAN"), ("fnsp", "0001"), ("fnst", "FAN")] {
            payload = payload.with_field(code, value);
        }
        let err = StateData::from_payload(&payload).unwrap_err();
        assert_eq!(err.field(), Some("nmod"));
    }

    #[test]
    fn test_decode_requires_state_payload() {
        let err = StateData::decode(&Message::new("STATE-CHANGE")).unwrap_err();
        assert_eq!(err.field(), Some("product-state"));
        assert!(StateData::decode(&Message::new("WELCOME")).is_err());
    }
}
