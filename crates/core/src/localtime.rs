//! Local time as an explicit `(epoch seconds, offset seconds)` value type.
//!
//! The scheduler never works with host-local wall clocks. Every participant's
//! "now" is derived from a UTC instant plus their stored timezone offset, so
//! the same sweep pass can evaluate users across timezones deterministically.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Timelike, Utc, Weekday};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TimeParseError {
    #[error("invalid time of day `{0}` (expected HH:MM)")]
    InvalidTimeOfDay(String),
    #[error("invalid weekday code `{0}` (expected mon|tue|wed|thu|fri|sat|sun)")]
    InvalidWeekdayCode(String),
}

/// A point in time paired with a fixed UTC offset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LocalTimestamp {
    pub epoch_seconds: i64,
    pub offset_seconds: i32,
}

impl LocalTimestamp {
    pub fn new(at: DateTime<Utc>, offset_seconds: i32) -> Self {
        Self { epoch_seconds: at.timestamp(), offset_seconds }
    }

    fn shifted(&self) -> DateTime<FixedOffset> {
        let offset = FixedOffset::east_opt(self.offset_seconds)
            .unwrap_or_else(|| FixedOffset::east_opt(0).expect("zero offset is valid"));
        DateTime::from_timestamp(self.epoch_seconds, 0)
            .unwrap_or_else(|| DateTime::<Utc>::UNIX_EPOCH)
            .with_timezone(&offset)
    }

    /// Calendar date at the participant's offset.
    pub fn date(&self) -> NaiveDate {
        self.shifted().date_naive()
    }

    /// Minutes since local midnight.
    pub fn minutes_of_day(&self) -> u32 {
        let local = self.shifted();
        local.hour() * 60 + local.minute()
    }

    pub fn weekday(&self) -> WeekdayCode {
        WeekdayCode::from(self.shifted().weekday())
    }
}

/// Time of day in local minutes, parsed from `HH:MM`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct LocalTimeOfDay {
    minutes: u32,
}

impl LocalTimeOfDay {
    pub fn from_minutes(minutes: u32) -> Self {
        Self { minutes: minutes.min(23 * 60 + 59) }
    }

    pub fn parse(value: &str) -> Result<Self, TimeParseError> {
        let (hours, minutes) = value
            .split_once(':')
            .ok_or_else(|| TimeParseError::InvalidTimeOfDay(value.to_string()))?;
        let hours: u32 = hours
            .parse()
            .map_err(|_| TimeParseError::InvalidTimeOfDay(value.to_string()))?;
        let minutes: u32 = minutes
            .parse()
            .map_err(|_| TimeParseError::InvalidTimeOfDay(value.to_string()))?;
        if hours > 23 || minutes > 59 {
            return Err(TimeParseError::InvalidTimeOfDay(value.to_string()));
        }
        Ok(Self { minutes: hours * 60 + minutes })
    }

    pub fn minutes_of_day(&self) -> u32 {
        self.minutes
    }
}

impl std::fmt::Display for LocalTimeOfDay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}", self.minutes / 60, self.minutes % 60)
    }
}

impl Serialize for LocalTimeOfDay {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for LocalTimeOfDay {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Three-letter weekday codes used by schedule definitions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WeekdayCode {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl WeekdayCode {
    pub fn parse(value: &str) -> Result<Self, TimeParseError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "mon" => Ok(Self::Mon),
            "tue" => Ok(Self::Tue),
            "wed" => Ok(Self::Wed),
            "thu" => Ok(Self::Thu),
            "fri" => Ok(Self::Fri),
            "sat" => Ok(Self::Sat),
            "sun" => Ok(Self::Sun),
            other => Err(TimeParseError::InvalidWeekdayCode(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mon => "mon",
            Self::Tue => "tue",
            Self::Wed => "wed",
            Self::Thu => "thu",
            Self::Fri => "fri",
            Self::Sat => "sat",
            Self::Sun => "sun",
        }
    }
}

impl From<Weekday> for WeekdayCode {
    fn from(value: Weekday) -> Self {
        match value {
            Weekday::Mon => Self::Mon,
            Weekday::Tue => Self::Tue,
            Weekday::Wed => Self::Wed,
            Weekday::Thu => Self::Thu,
            Weekday::Fri => Self::Fri,
            Weekday::Sat => Self::Sat,
            Weekday::Sun => Self::Sun,
        }
    }
}

impl std::fmt::Display for WeekdayCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for WeekdayCode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for WeekdayCode {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
