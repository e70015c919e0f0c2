//! Environmental sensor snapshots.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::field::current_value;
use crate::message::{Message, MessageKind, Payload};
use crate::temperature::{humidex, TemperatureUnit};

/// Reading reported while a sensor is switched off.
pub const OFF: &str = "OFF";
/// Reading reported while the VOC sensor is still warming up.
pub const INIT: &str = "INIT";

/// Device codes of the sensor payload.
pub mod codes {
    pub const HUMIDITY: &str = "hact";
    pub const TEMPERATURE: &str = "tact";
    pub const VOLATILE_COMPOUNDS: &str = "vact";
    pub const PARTICLES: &str = "pact";
    pub const SLEEP_TIMER: &str = "sltm";
}

/// One environmental snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorsData {
    /// Temperature in `temperature_unit`; absent when the sensor is off.
    pub temperature: Option<f64>,
    pub temperature_unit: TemperatureUnit,
    /// Relative humidity in percent; absent when the sensor is off.
    pub humidity: Option<u8>,
    /// Zero while the sensor initializes.
    pub volatile_compounds: u32,
    pub particles: u32,
    /// Sleep timer in seconds, zero when inactive. Absent on firmware that
    /// does not report it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timer: Option<u32>,
}

impl SensorsData {
    /// Decode a sensor-classified message.
    pub fn decode(message: &Message, unit: TemperatureUnit) -> Result<Self> {
        if message.kind() != MessageKind::Sensor {
            return Err(Error::InvalidMessage(format!(
                "`{}` is not a sensor data message",
                message.msg
            )));
        }
        let data = message
            .data
            .as_ref()
            .ok_or_else(|| Error::missing_field("data"))?;
        Self::from_payload(data, unit)
    }

    /// Decode the `data` payload of a sensor message.
    pub fn from_payload(data: &Payload, unit: TemperatureUnit) -> Result<Self> {
        let humidity = read(data, codes::HUMIDITY)?;
        let temperature = read(data, codes::TEMPERATURE)?;
        let volatile_compounds = read(data, codes::VOLATILE_COMPOUNDS)?;
        let particles = read(data, codes::PARTICLES)?;

        let humidity = if humidity == OFF {
            None
        } else {
            let value: u8 = parse_int(codes::HUMIDITY, &humidity)?;
            if value > 100 {
                return Err(Error::bad_value(
                    codes::HUMIDITY,
                    humidity,
                    "humidity above 100 %",
                ));
            }
            Some(value)
        };

        let temperature = if temperature == OFF {
            None
        } else {
            Some(unit.from_kelvin(parse_deci_kelvin(&temperature)?))
        };

        let volatile_compounds = if volatile_compounds == INIT {
            0
        } else {
            parse_int(codes::VOLATILE_COMPOUNDS, &volatile_compounds)?
        };

        let particles = parse_int(codes::PARTICLES, &particles)?;

        let timer = match data.optional(codes::SLEEP_TIMER) {
            Some(raw) => {
                let timer = current_value(codes::SLEEP_TIMER, raw)?;
                Some(if timer == OFF {
                    0
                } else {
                    parse_int(codes::SLEEP_TIMER, &timer)?
                })
            }
            None => None,
        };

        Ok(Self {
            temperature,
            temperature_unit: unit,
            humidity,
            volatile_compounds,
            particles,
            timer,
        })
    }

    /// Whether the snapshot carries a temperature or a humidity reading.
    pub fn has_data(&self) -> bool {
        self.temperature.is_some() || self.humidity.is_some()
    }

    /// Temperature converted to Celsius, whatever the configured unit.
    pub fn temperature_celsius(&self) -> Option<f64> {
        let value = self.temperature?;
        match self.temperature_unit {
            TemperatureUnit::Celsius => Some(value),
            unit => Some(TemperatureUnit::Celsius.from_kelvin(unit.to_kelvin(value))),
        }
    }

    /// Humidex in °C, computed from the Celsius equivalent of the stored
    /// temperature. Defined only when both temperature and humidity are known.
    pub fn humidex(&self) -> Option<f64> {
        let celsius = self.temperature_celsius()?;
        let humidity = self.humidity?;
        Some(humidex(celsius, f64::from(humidity)))
    }

    /// Humidex expressed in `temperature_unit`.
    pub fn humidex_in_unit(&self) -> Option<f64> {
        let celsius = self.humidex()?;
        Some(
            self.temperature_unit
                .from_kelvin(TemperatureUnit::Celsius.to_kelvin(celsius)),
        )
    }
}

impl fmt::Display for SensorsData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.temperature {
            Some(t) => write!(f, "Temperature: {:.2}°{}", t, self.temperature_unit)?,
            None => write!(f, "Temperature: n/a")?,
        }
        match self.humidity {
            Some(h) => write!(f, ", Humidity: {} %", h)?,
            None => write!(f, ", Humidity: n/a")?,
        }
        write!(
            f,
            ", Volatile Compounds: {}, Particles: {}",
            self.volatile_compounds, self.particles
        )?;
        if let Some(humidex) = self.humidex_in_unit() {
            write!(f, ", Humidex: {:.2}°{}", humidex, self.temperature_unit)?;
        }
        if let Some(timer) = self.timer {
            write!(f, ", Timer: {}", timer)?;
        }
        Ok(())
    }
}

fn read(data: &Payload, code: &str) -> Result<String> {
    current_value(code, data.required(code)?)
}

fn parse_int<T: std::str::FromStr>(code: &str, raw: &str) -> Result<T> {
    raw.parse()
        .map_err(|_| Error::bad_value(code, raw, "not a non-negative integer"))
}

/// `tact` is reported in tenths of a Kelvin.
fn parse_deci_kelvin(raw: &str) -> Result<f64> {
    let value: f64 = raw
        .parse()
        .map_err(|_| Error::bad_value(codes::TEMPERATURE, raw, "not a number"))?;
    if !value.is_finite() || value < 0.0 {
        return Err(Error::bad_value(
            codes::TEMPERATURE,
            raw,
            "not a valid absolute temperature",
        ));
    }
    Ok(value / 10.0)
}
