//! Temperature units and conversions.
//!
//! The device always reports Kelvin internally (in tenths); everything else is
//! derived here.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Display unit for decoded temperatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TemperatureUnit {
    #[default]
    #[serde(rename = "C", alias = "c")]
    Celsius,
    #[serde(rename = "F", alias = "f")]
    Fahrenheit,
}

impl TemperatureUnit {
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Celsius => "C",
            Self::Fahrenheit => "F",
        }
    }

    /// Convert a Kelvin reading into this unit.
    pub fn from_kelvin(&self, kelvin: f64) -> f64 {
        match self {
            Self::Celsius => kelvin_to_celsius(kelvin),
            Self::Fahrenheit => kelvin_to_fahrenheit(kelvin),
        }
    }

    /// Convert a value in this unit back to Kelvin.
    pub fn to_kelvin(&self, value: f64) -> f64 {
        match self {
            Self::Celsius => celsius_to_kelvin(value),
            Self::Fahrenheit => fahrenheit_to_kelvin(value),
        }
    }
}

impl fmt::Display for TemperatureUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for TemperatureUnit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "C" => Ok(Self::Celsius),
            "F" => Ok(Self::Fahrenheit),
            _ => Err(Error::InvalidToken {
                kind: "temperature unit",
                value: s.to_string(),
            }),
        }
    }
}

pub fn kelvin_to_celsius(kelvin: f64) -> f64 {
    kelvin - 273.15
}

pub fn kelvin_to_fahrenheit(kelvin: f64) -> f64 {
    kelvin * 9.0 / 5.0 - 459.67
}

pub fn celsius_to_kelvin(celsius: f64) -> f64 {
    celsius + 273.15
}

pub fn fahrenheit_to_kelvin(fahrenheit: f64) -> f64 {
    (fahrenheit + 459.67) * 5.0 / 9.0
}

/// Humidex for a temperature in °C and a relative humidity in percent.
///
/// The formula is calibrated for Celsius only; callers holding another unit
/// must convert first.
pub fn humidex(celsius: f64, humidity: f64) -> f64 {
    let vapour_pressure = 6.112 * 10f64.powf(7.5 * celsius / (237.7 + celsius)) * (humidity / 100.0);
    celsius + 0.5555 * (vapour_pressure - 10.0)
}
