//! Field normalization.
//!
//! Device payloads carry each field either as a bare value (`"ON"`) or as a
//! history pair (`["OFF", "ON"]`, previous then current). Only the current
//! value is ever kept.

use serde_json::Value;

use crate::error::{Error, Result};

/// Raw payload field as sent by the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// A single value.
    Scalar(String),
    /// An ordered history, oldest first.
    History(Vec<String>),
}

impl FieldValue {
    /// Read a field from its JSON form, failing on anything other than a
    /// string or an array of strings.
    pub fn from_json(code: &str, value: &Value) -> Result<Self> {
        match value {
            Value::String(s) => Ok(Self::Scalar(s.clone())),
            Value::Array(items) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => Ok(s.clone()),
                    other => Err(Error::bad_value(
                        code,
                        other.to_string(),
                        "history entries must be strings",
                    )),
                })
                .collect::<Result<Vec<_>>>()
                .map(Self::History),
            other => Err(Error::bad_value(
                code,
                other.to_string(),
                "expected a string or a list of strings",
            )),
        }
    }

    /// Current value: the scalar itself, or the last entry of a history.
    ///
    /// Histories of any non-zero length are accepted; the device only sends
    /// pairs today.
    pub fn current(&self, code: &str) -> Result<&str> {
        match self {
            Self::Scalar(s) => Ok(s),
            Self::History(items) => items
                .last()
                .map(String::as_str)
                .ok_or_else(|| Error::bad_value(code, "[]", "empty history")),
        }
    }
}

/// Normalize a raw JSON field to its current value.
pub fn current_value(code: &str, value: &Value) -> Result<String> {
    let field = FieldValue::from_json(code, value)?;
    field.current(code).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalar_is_returned_unchanged() {
        assert_eq!(current_value("oson", &json!("ON")).unwrap(), "ON");
    }

    #[test]
    fn test_pair_yields_second_element() {
        assert_eq!(current_value("fmod", &json!(["FAN", "AUTO"])).unwrap(), "AUTO");
    }

    #[test]
    fn test_longer_history_yields_last_element() {
        assert_eq!(current_value("qtar", &json!(["0001", "0003", "0004"])).unwrap(), "0004");
    }

    #[test]
    fn test_empty_history_is_malformed() {
        let err = current_value("filf", &json!([])).unwrap_err();
        assert_eq!(err.field(), Some("filf"));
    }

    #[test]
    fn test_non_string_is_malformed() {
        assert!(current_value("nmod", &json!(42)).is_err());
        assert!(current_value("nmod", &json!(["OFF", 1])).is_err());
        assert!(current_value("nmod", &json!({"a": "b"})).is_err());
    }
}
