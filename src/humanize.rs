//! Human-readable duration parsing for configuration values

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid duration format: {0}")]
    InvalidFormat(String),

    #[error("invalid number: {0}")]
    InvalidNumber(#[from] std::num::ParseIntError),

    #[error("invalid unit: {0}")]
    InvalidUnit(String),
}

/// Millisecond duration wrapper with human-readable parsing.
///
/// Accepts `"500ms"`, `"5s"`, `"2m"`, or a bare integer (milliseconds).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct DurationMs(pub u64);

impl DurationMs {
    pub fn as_millis(&self) -> u64 {
        self.0
    }

    pub fn as_duration(&self) -> Duration {
        Duration::from_millis(self.0)
    }

    pub fn to_human_readable(&self) -> String {
        if self.0 >= 60_000 && self.0 % 60_000 == 0 {
            format!("{}m", self.0 / 60_000)
        } else if self.0 >= 1_000 && self.0 % 1_000 == 0 {
            format!("{}s", self.0 / 1_000)
        } else {
            format!("{}ms", self.0)
        }
    }
}

impl From<Duration> for DurationMs {
    fn from(d: Duration) -> Self {
        DurationMs(d.as_millis() as u64)
    }
}

impl FromStr for DurationMs {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ParseError::InvalidFormat(s.to_string()));
        }

        let split = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
        let (number, unit) = s.split_at(split);

        if number.is_empty() {
            return Err(ParseError::InvalidFormat(s.to_string()));
        }
        let value: u64 = number.parse()?;

        let millis = match unit.trim().to_lowercase().as_str() {
            "" | "ms" => value,
            "s" => value * 1_000,
            "m" => value * 60_000,
            other => return Err(ParseError::InvalidUnit(other.to_string())),
        };

        Ok(DurationMs(millis))
    }
}

impl fmt::Display for DurationMs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_human_readable())
    }
}

impl<'de> Deserialize<'de> for DurationMs {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct DurationMsVisitor;

        impl serde::de::Visitor<'_> for DurationMsVisitor {
            type Value = DurationMs;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a duration like \"500ms\", \"5s\", \"2m\", or milliseconds")
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(DurationMs(value))
            }

            fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                u64::try_from(value)
                    .map(DurationMs)
                    .map_err(|_| E::custom("duration must be non-negative"))
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                value.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(DurationMsVisitor)
    }
}
