//! Serialization modes and formatted serials
//!
//! A mode fixes the zero-padding width and the wraparound ceiling of the
//! numbers it issues. [`FormattedSerial`] is the only representation ever
//! handed to a caller.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::modes;
use crate::errors::{AppError, Result};

/// Which serial family a number belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SerializationMode {
    /// JBK number, three digits, wraps after 500
    Jbk,
    /// Lot number, nine digits, wraps after 999,999,999
    Lot,
}

impl SerializationMode {
    /// Number of digits a formatted serial is padded to
    pub fn width(&self) -> usize {
        match self {
            SerializationMode::Jbk => modes::JBK_WIDTH,
            SerializationMode::Lot => modes::LOT_WIDTH,
        }
    }

    /// Highest issuable number before the counter resets to zero
    pub fn ceiling(&self) -> u64 {
        match self {
            SerializationMode::Jbk => modes::JBK_CEILING,
            SerializationMode::Lot => modes::LOT_CEILING,
        }
    }

    /// Value to store after issuing `issued`
    ///
    /// The issuable range is `0..=ceiling`; issuing the ceiling resets the
    /// counter to zero.
    pub fn successor(&self, issued: u64) -> u64 {
        if issued >= self.ceiling() {
            0
        } else {
            issued + 1
        }
    }

    /// Render `value` zero-padded to this mode's width
    pub fn format(&self, value: u64) -> FormattedSerial {
        FormattedSerial {
            text: format!("{:0width$}", value, width = self.width()),
            value,
        }
    }
}

impl fmt::Display for SerializationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SerializationMode::Jbk => write!(f, "jbk"),
            SerializationMode::Lot => write!(f, "lot"),
        }
    }
}

impl FromStr for SerializationMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jbk" => Ok(SerializationMode::Jbk),
            "lot" => Ok(SerializationMode::Lot),
            other => Err(format!(
                "unknown serialization mode '{}', expected 'jbk' or 'lot'",
                other
            )),
        }
    }
}

/// A serial number as printed on a label
///
/// Deserialization goes through [`FormattedSerial::parse`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FormattedSerial {
    text: String,
    value: u64,
}

impl FormattedSerial {
    /// Accept a serial handed back by a caller
    ///
    /// Padding is not checked against a mode: the cache is keyed by part, and
    /// `"007"` and `"7"` denote the same reserved number.
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::InvalidSerial {
                value: text.to_string(),
                reason: "serial is empty".to_string(),
            });
        }
        if !text.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AppError::InvalidSerial {
                value: text.to_string(),
                reason: "serial must contain only decimal digits".to_string(),
            });
        }
        let value = text.parse::<u64>().map_err(|_| AppError::InvalidSerial {
            value: text.to_string(),
            reason: "serial is too large".to_string(),
        })?;
        Ok(Self {
            text: text.to_string(),
            value,
        })
    }

    /// The integer this serial represents
    pub fn value(&self) -> u64 {
        self.value
    }

    /// The serial as printed
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl TryFrom<String> for FormattedSerial {
    type Error = AppError;

    fn try_from(text: String) -> Result<Self> {
        Self::parse(&text)
    }
}

impl From<FormattedSerial> for String {
    fn from(serial: FormattedSerial) -> Self {
        serial.text
    }
}

impl fmt::Display for FormattedSerial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl AsRef<str> for FormattedSerial {
    fn as_ref(&self) -> &str {
        &self.text
    }
}
