//! End-to-end decoding of device messages as they arrive on the status topic.

use purelink_core::temperature::{
    celsius_to_kelvin, fahrenheit_to_kelvin, kelvin_to_celsius, kelvin_to_fahrenheit,
};
use purelink_core::{
    classify, decode_bytes, decode_sensor_data, decode_state_data, map_connection_code,
    map_disconnection_code, Decoded, Error, Message, MessageKind, TemperatureUnit,
};
use serde_json::json;

fn sensor_message(hact: &str, tact: &str, vact: &str) -> Message {
    Message::from_value(json!({
        "msg": "ENVIRONMENTAL-CURRENT-SENSOR-DATA",
        "time": "2024-01-01T12:00:00.000Z",
        "data": { "hact": hact, "tact": tact, "vact": vact, "pact": "0003" }
    }))
    .unwrap()
}

#[test]
fn test_classify_messages() {
    let state = Message::from_value(json!({"msg": "CURRENT-STATE", "product-state": {}})).unwrap();
    let sensor = sensor_message("0045", "2931", "0002");
    let welcome = Message::from_value(json!({"msg": "WELCOME"})).unwrap();

    assert_eq!(classify(&state), MessageKind::State);
    assert_eq!(classify(&sensor), MessageKind::Sensor);
    assert_eq!(classify(&welcome), MessageKind::Other);
}

#[test]
fn test_sensors_off_has_no_data() {
    let data = decode_sensor_data(&sensor_message("OFF", "OFF", "0001"), TemperatureUnit::Celsius)
        .unwrap();
    assert!(!data.has_data());
}

#[test]
fn test_sensor_temperature_in_celsius() {
    let data = decode_sensor_data(&sensor_message("0045", "2910", "0001"), TemperatureUnit::Celsius)
        .unwrap();
    assert!((data.temperature.unwrap() - 17.85).abs() < 1e-9);

    let data = decode_sensor_data(&sensor_message("0045", "2931", "0001"), TemperatureUnit::Celsius)
        .unwrap();
    assert!((data.temperature.unwrap() - 19.95).abs() < 1e-9);
}

#[test]
fn test_volatile_compounds_sentinel() {
    let init = decode_sensor_data(&sensor_message("0045", "2931", "INIT"), TemperatureUnit::Celsius)
        .unwrap();
    assert_eq!(init.volatile_compounds, 0);

    let value = decode_sensor_data(&sensor_message("0045", "2931", "0042"), TemperatureUnit::Celsius)
        .unwrap();
    assert_eq!(value.volatile_compounds, 42);
}

#[test]
fn test_state_fan_speed_auto() {
    let message = Message::from_value(json!({
        "msg": "STATE-CHANGE",
        "product-state": {
            "fmod": ["FAN", "AUTO"],
            "fnsp": ["0004", "AUTO"],
            "fnst": ["FAN", "FAN"],
            "nmod": ["OFF", "OFF"],
            "oson": "ON",
            "filf": ["2087", "2087"],
            "qtar": ["0003", "0003"],
            "rhtm": ["ON", "ON"]
        }
    }))
    .unwrap();

    let state = decode_state_data(&message).unwrap();
    assert_eq!(state.fan_speed, "-1");
    assert_eq!(state.speed, "AUTO");
    assert_eq!(state.oscillation, "ON");
}

#[test]
fn test_decode_bytes_dispatches() {
    let raw = br#"{"msg":"ENVIRONMENTAL-CURRENT-SENSOR-DATA","data":{"hact":"0050","tact":"2950","vact":"0001","pact":"0002","sltm":"OFF"}}"#;
    match decode_bytes(raw, TemperatureUnit::Fahrenheit).unwrap() {
        Decoded::Sensors(data) => {
            assert_eq!(data.humidity, Some(50));
            assert_eq!(data.timer, Some(0));
            assert_eq!(data.temperature_unit, TemperatureUnit::Fahrenheit);
        }
        other => panic!("unexpected decode result: {:?}", other),
    }

    let raw = br#"{"msg":"HELLO"}"#;
    assert_eq!(
        decode_bytes(raw, TemperatureUnit::Celsius).unwrap(),
        Decoded::Other("HELLO".to_string())
    );
}

#[test]
fn test_malformed_value_reports_field_and_raw() {
    let err = decode_sensor_data(&sensor_message("4x", "2931", "0001"), TemperatureUnit::Celsius)
        .unwrap_err();
    match err {
        Error::MalformedField { field, raw, .. } => {
            assert_eq!(field, "hact");
            assert_eq!(raw.as_deref(), Some("4x"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_temperature_round_trips() {
    for x in [-273.15, -17.5, 0.0, 0.1, 36.6, 451.0] {
        assert!((kelvin_to_celsius(celsius_to_kelvin(x)) - x).abs() < 1e-9);
        assert!((kelvin_to_fahrenheit(fahrenheit_to_kelvin(x)) - x).abs() < 1e-9);
    }
}

#[test]
fn test_return_codes() {
    assert_eq!(map_connection_code(0).unwrap(), "Connection successful");
    assert_eq!(
        map_connection_code(4).unwrap(),
        "Connection refused: bad username or password"
    );
    assert_eq!(map_disconnection_code(7), map_disconnection_code(50));
}
