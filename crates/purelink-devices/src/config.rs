//! Device configuration loading.
//!
//! Sources, in priority order:
//! 1. TOML file given explicitly (`--config`)
//! 2. TOML file named by `PURELINK_CONFIG`
//! 3. `purelink.toml` in the working directory
//! 4. Environment variables

use std::fmt;
use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use purelink_core::config::{defaults, env_vars, topics};
use purelink_core::TemperatureUnit;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};
use tracing::info;

use crate::adapter::{AdapterError, AdapterResult};

/// Connection settings for one appliance.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Device address on the local network
    pub ip_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Serial number, also the MQTT username
    pub serial: String,
    /// Device password as printed on the appliance
    pub password: String,
    /// Product type code (e.g. `475`), first segment of every topic
    pub device_type: String,
    #[serde(default)]
    pub temperature_unit: TemperatureUnit,
}

fn default_port() -> u16 {
    defaults::PORT
}

impl DeviceConfig {
    pub fn new(
        ip_address: impl Into<String>,
        serial: impl Into<String>,
        password: impl Into<String>,
        device_type: impl Into<String>,
    ) -> Self {
        Self {
            ip_address: ip_address.into(),
            port: defaults::PORT,
            serial: serial.into(),
            password: password.into(),
            device_type: device_type.into(),
            temperature_unit: TemperatureUnit::default(),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_temperature_unit(mut self, unit: TemperatureUnit) -> Self {
        self.temperature_unit = unit;
        self
    }

    pub fn command_topic(&self) -> String {
        topics::command(&self.device_type, &self.serial)
    }

    pub fn status_topic(&self) -> String {
        topics::status(&self.device_type, &self.serial)
    }

    /// MQTT password: base64 of the SHA-512 digest of the device password.
    pub fn hashed_password(&self) -> String {
        STANDARD.encode(Sha512::digest(self.password.as_bytes()))
    }

    /// Parse the `[device]` table of a TOML document.
    pub fn from_toml_str(content: &str) -> AdapterResult<Self> {
        let config: TomlConfig = toml::from_str(content)
            .map_err(|e| AdapterError::Configuration(format!("invalid TOML: {}", e)))?;
        let device = config
            .device
            .ok_or_else(|| AdapterError::Configuration("missing [device] table".to_string()))?;
        device.validate()?;
        Ok(device)
    }

    /// Read settings through `lookup`, keyed by environment variable name.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> AdapterResult<Self> {
        let require = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| AdapterError::Configuration(format!("{} is not set", key)))
        };

        let port = match lookup(env_vars::DEVICE_PORT) {
            Some(port) => port.trim().parse().map_err(|_| {
                AdapterError::Configuration(format!(
                    "{} is not a valid port: {}",
                    env_vars::DEVICE_PORT,
                    port
                ))
            })?,
            None => defaults::PORT,
        };
        let temperature_unit = match lookup(env_vars::TEMPERATURE_UNIT) {
            Some(unit) => unit
                .parse()
                .map_err(|e: purelink_core::Error| AdapterError::Configuration(e.to_string()))?,
            None => TemperatureUnit::default(),
        };

        let config = Self {
            ip_address: require(env_vars::DEVICE_IP)?,
            port,
            serial: require(env_vars::SERIAL)?,
            password: require(env_vars::PASSWORD)?,
            device_type: require(env_vars::DEVICE_TYPE)?,
            temperature_unit,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_env() -> AdapterResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from the first available source.
    pub fn load(explicit: Option<&Path>) -> AdapterResult<Self> {
        ConfigSource::detect(explicit)?.parse()
    }

    fn validate(&self) -> AdapterResult<()> {
        for (name, value) in [
            ("ip_address", &self.ip_address),
            ("serial", &self.serial),
            ("password", &self.password),
            ("device_type", &self.device_type),
        ] {
            if value.trim().is_empty() {
                return Err(AdapterError::Configuration(format!("`{}` is empty", name)));
            }
        }
        Ok(())
    }
}

impl fmt::Debug for DeviceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceConfig")
            .field("ip_address", &self.ip_address)
            .field("port", &self.port)
            .field("serial", &self.serial)
            .field("password", &"<redacted>")
            .field("device_type", &self.device_type)
            .field("temperature_unit", &self.temperature_unit)
            .finish()
    }
}

/// Configuration sources in priority order.
enum ConfigSource {
    Toml(PathBuf, String),
    Env,
}

impl ConfigSource {
    fn detect(explicit: Option<&Path>) -> AdapterResult<Self> {
        if let Some(path) = explicit {
            return Self::read(path);
        }

        if let Ok(path) = std::env::var(env_vars::CONFIG_PATH) {
            return Self::read(Path::new(&path));
        }

        let default_path = Path::new(defaults::CONFIG_FILE);
        if default_path.exists() {
            return Self::read(default_path);
        }

        info!(category = "config", "Loading config from environment variables");
        Ok(ConfigSource::Env)
    }

    fn read(path: &Path) -> AdapterResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AdapterError::Configuration(format!("cannot read {}: {}", path.display(), e))
        })?;
        info!(category = "config", "Loading config from: {}", path.display());
        Ok(ConfigSource::Toml(path.to_path_buf(), content))
    }

    fn parse(self) -> AdapterResult<DeviceConfig> {
        match self {
            ConfigSource::Toml(path, content) => DeviceConfig::from_toml_str(&content).map_err(
                |e| match e {
                    AdapterError::Configuration(msg) => {
                        AdapterError::Configuration(format!("{}: {}", path.display(), msg))
                    }
                    other => other,
                },
            ),
            ConfigSource::Env => DeviceConfig::from_env(),
        }
    }
}

/// TOML configuration structure.
#[derive(Debug, Deserialize)]
struct TomlConfig {
    #[serde(default)]
    device: Option<DeviceConfig>,
}
