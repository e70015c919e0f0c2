//! Device configuration loading from files.

use std::io::Write;

use purelink_core::TemperatureUnit;
use purelink_devices::{AdapterError, DeviceConfig};

#[test]
fn test_load_explicit_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[device]
ip_address = "192.168.1.20"
port = 1884
serial = "NN2-EU-KEA0000A"
password = "secret"
device_type = "475"
temperature_unit = "F"
"#
    )
    .unwrap();

    let config = DeviceConfig::load(Some(file.path())).unwrap();
    assert_eq!(config.ip_address, "192.168.1.20");
    assert_eq!(config.port, 1884);
    assert_eq!(config.temperature_unit, TemperatureUnit::Fahrenheit);
    assert_eq!(config.command_topic(), "475/NN2-EU-KEA0000A/command");
}

#[test]
fn test_load_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");
    let err = DeviceConfig::load(Some(&path)).unwrap_err();
    assert!(matches!(err, AdapterError::Configuration(_)));
    assert!(err.to_string().contains("absent.toml"));
}

#[test]
fn test_load_reports_missing_key() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[device]
ip_address = "192.168.1.20"
password = "secret"
device_type = "475"
"#
    )
    .unwrap();

    let err = DeviceConfig::load(Some(file.path())).unwrap_err();
    assert!(err.to_string().contains("serial"), "{}", err);
}

#[test]
fn test_load_rejects_empty_values() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[device]
ip_address = ""
serial = "NN2-EU-KEA0000A"
password = "secret"
device_type = "475"
"#
    )
    .unwrap();

    let err = DeviceConfig::load(Some(file.path())).unwrap_err();
    assert!(err.to_string().contains("ip_address"), "{}", err);
}
