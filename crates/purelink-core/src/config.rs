//! Shared defaults, environment variable names and topic layout.

/// Default values.
pub mod defaults {
    /// MQTT port the device listens on.
    pub const PORT: u16 = 1883;
    /// Seconds to wait for the CONNACK.
    pub const CONNECT_TIMEOUT_SECS: u64 = 10;
    /// Seconds to wait for each state or sensor snapshot.
    pub const DATA_TIMEOUT_SECS: u64 = 5;
    /// Seconds to wait for the link to close after DISCONNECT.
    pub const DISCONNECT_TIMEOUT_SECS: u64 = 5;
    pub const KEEP_ALIVE_SECS: u64 = 60;
    /// Configuration file looked up in the working directory.
    pub const CONFIG_FILE: &str = "purelink.toml";
}

/// Environment variable names.
pub mod env_vars {
    pub const CONFIG_PATH: &str = "PURELINK_CONFIG";
    pub const DEVICE_IP: &str = "PURELINK_DEVICE_IP";
    pub const DEVICE_PORT: &str = "PURELINK_DEVICE_PORT";
    pub const SERIAL: &str = "PURELINK_SERIAL";
    pub const PASSWORD: &str = "PURELINK_PASSWORD";
    pub const DEVICE_TYPE: &str = "PURELINK_DEVICE_TYPE";
    pub const TEMPERATURE_UNIT: &str = "PURELINK_TEMPERATURE_UNIT";
    pub const LOG_JSON: &str = "PURELINK_LOG_JSON";
}

/// MQTT topic layout.
pub mod topics {
    /// Topic the device listens on for commands.
    pub fn command(device_type: &str, serial: &str) -> String {
        format!("{}/{}/command", device_type, serial)
    }

    /// Topic the device publishes its state and sensor data to.
    pub fn status(device_type: &str, serial: &str) -> String {
        format!("{}/{}/status/current", device_type, serial)
    }
}
