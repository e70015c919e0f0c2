//! Connection and disconnection return codes.

use crate::error::{Error, Result};

/// Code used when the device did not answer in time.
pub const TIMEOUT_CODE: u8 = 99;
/// Disconnection code every unknown code falls back to.
pub const UNEXPECTED_DISCONNECTION_CODE: u8 = 50;

const CONNECTION_STATE: &[(u8, &str)] = &[
    (0, "Connection successful"),
    (1, "Connection refused: incorrect protocol version"),
    (2, "Connection refused: invalid client identifier"),
    (3, "Connection refused: server unavailable"),
    (4, "Connection refused: bad username or password"),
    (5, "Connection refused: not authorised"),
    (TIMEOUT_CODE, "Connection refused: timeout"),
];

const DISCONNECTION_STATE: &[(u8, &str)] = &[
    (0, "Disconnection successful"),
    (UNEXPECTED_DISCONNECTION_CODE, "Disconnection error: unexpected error"),
    (TIMEOUT_CODE, "Disconnection error: timeout"),
];

fn lookup(table: &[(u8, &'static str)], code: u8) -> Option<&'static str> {
    table
        .iter()
        .find(|(known, _)| *known == code)
        .map(|(_, message)| *message)
}

/// Describe a connection return code. Unknown codes are an error.
pub fn map_connection_code(code: u8) -> Result<&'static str> {
    lookup(CONNECTION_STATE, code).ok_or(Error::UnknownReturnCode(code))
}

/// Describe a disconnection return code. Unknown codes read as an
/// unexpected error.
pub fn map_disconnection_code(code: u8) -> &'static str {
    lookup(DISCONNECTION_STATE, code)
        .or_else(|| lookup(DISCONNECTION_STATE, UNEXPECTED_DISCONNECTION_CODE))
        .unwrap_or("Disconnection error: unexpected error")
}

/// A failed connection attempt.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} (code {code})")]
pub struct ConnectionError {
    pub code: u8,
    pub message: &'static str,
}

impl ConnectionError {
    pub fn from_code(code: u8) -> Result<Self> {
        Ok(Self {
            code,
            message: map_connection_code(code)?,
        })
    }

    pub fn timeout() -> Self {
        Self {
            code: TIMEOUT_CODE,
            message: "Connection refused: timeout",
        }
    }
}

/// A failed disconnection attempt.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} (code {code})")]
pub struct DisconnectionError {
    pub code: u8,
    pub message: &'static str,
}

impl DisconnectionError {
    pub fn from_code(code: u8) -> Self {
        Self {
            code,
            message: map_disconnection_code(code),
        }
    }

    pub fn timeout() -> Self {
        Self::from_code(TIMEOUT_CODE)
    }
}
