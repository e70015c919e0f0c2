//! Error types for message decoding and return-code mapping.

use thiserror::Error;

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the decoding core.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A required field is missing or carries an unparseable value.
    #[error("Malformed field `{field}`: {reason}{}", raw_suffix(.raw))]
    MalformedField {
        /// Device code of the offending field (e.g. `hact`).
        field: String,
        /// Raw value as received, when there was one.
        raw: Option<String>,
        reason: String,
    },

    /// Connection return code outside the known table.
    #[error("Unknown connection return code: {0}")]
    UnknownReturnCode(u8),

    /// The bytes could not be read as a device message envelope.
    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    /// A command token that does not name a known mode.
    #[error("Invalid value `{value}` for {kind}")]
    InvalidToken { kind: &'static str, value: String },
}

impl Error {
    /// A required field is absent from the payload.
    pub fn missing_field(field: &str) -> Self {
        Self::MalformedField {
            field: field.to_string(),
            raw: None,
            reason: "required field is missing".to_string(),
        }
    }

    /// A field is present but its value cannot be used.
    pub fn bad_value(field: &str, raw: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedField {
            field: field.to_string(),
            raw: Some(raw.into()),
            reason: reason.into(),
        }
    }

    /// Device code of the offending field, for malformed-field errors.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::MalformedField { field, .. } => Some(field),
            _ => None,
        }
    }
}

fn raw_suffix(raw: &Option<String>) -> String {
    match raw {
        Some(raw) => format!(" (raw value: {:?})", raw),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_field_display_includes_raw_value() {
        let err = Error::bad_value("pact", "abc", "not an integer");
        let msg = err.to_string();
        assert!(msg.contains("pact"));
        assert!(msg.contains("\"abc\""));
        assert_eq!(err.field(), Some("pact"));
    }

    #[test]
    fn test_missing_field_display() {
        let err = Error::missing_field("hact");
        assert_eq!(
            err.to_string(),
            "Malformed field `hact`: required field is missing"
        );
    }
}
