//! Zone-naive timestamps.
//!
//! Morgen expresses event times as a wall-clock `LocalDateTime` plus a
//! separate IANA `timeZone` field. A `Z` suffix or numeric offset would
//! change the meaning of the value, so neither is ever added on output and
//! both are rejected on input.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// `%.f` reads and prints nothing when there are no fractional seconds.
const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LocalDateTime(NaiveDateTime);

impl LocalDateTime {
    pub fn new(dt: NaiveDateTime) -> Self {
        LocalDateTime(dt)
    }

    pub fn naive(&self) -> NaiveDateTime {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalDateTimeError {
    UtcSuffix,
    Offset,
    Format,
}

impl fmt::Display for LocalDateTimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocalDateTimeError::UtcSuffix => write!(f, "has a 'Z' suffix"),
            LocalDateTimeError::Offset => write!(f, "has a timezone offset"),
            LocalDateTimeError::Format => write!(f, "is not in YYYY-MM-DDTHH:mm:ss format"),
        }
    }
}

impl std::error::Error for LocalDateTimeError {}

impl FromStr for LocalDateTime {
    type Err = LocalDateTimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.ends_with('Z') || s.ends_with('z') {
            return Err(LocalDateTimeError::UtcSuffix);
        }
        if has_offset(s) {
            return Err(LocalDateTimeError::Offset);
        }
        NaiveDateTime::parse_from_str(s, FORMAT)
            .map(LocalDateTime)
            .map_err(|_| LocalDateTimeError::Format)
    }
}

/// `+HH:MM` / `-HH:MM` after the time component.
fn has_offset(s: &str) -> bool {
    let Some((_, time)) = s.split_once('T') else {
        return false;
    };
    time.len() >= 6 && {
        let tail = &time.as_bytes()[time.len() - 6..];
        (tail[0] == b'+' || tail[0] == b'-')
            && tail[1].is_ascii_digit()
            && tail[2].is_ascii_digit()
            && tail[3] == b':'
            && tail[4].is_ascii_digit()
            && tail[5].is_ascii_digit()
    }
}

impl fmt::Display for LocalDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(FORMAT))
    }
}

impl Serialize for LocalDateTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for LocalDateTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse()
            .map_err(|e| serde::de::Error::custom(format!("'{}' {}", s, e)))
    }
}
