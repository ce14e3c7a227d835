//! Schedule times and service dates as they appear in GTFS tables.
//!
//! GTFS stop times are written `H:MM:SS` relative to the start of the
//! service day, and may run past `24:00:00` for trips that finish after
//! midnight. [`Time`] keeps the raw fields and orders them numerically
//! without wrapping.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};

/// Error returned when parsing an invalid schedule time.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time {input:?}: {reason}")]
pub struct TimeError {
    input: String,
    reason: &'static str,
}

impl TimeError {
    fn new(input: &str, reason: &'static str) -> Self {
        Self {
            input: input.to_owned(),
            reason,
        }
    }
}

/// Error returned when parsing an invalid `YYYYMMDD` service date.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid service date {input:?}: {reason}")]
pub struct DateError {
    input: String,
    reason: &'static str,
}

/// A time of the service day.
///
/// Ordering compares hours, then minutes, then seconds, so `25:10:00`
/// sorts after `23:59:59`.
///
/// ```
/// use transit_schedule::time::Time;
///
/// let late: Time = "25:10:00".parse().unwrap();
/// let early: Time = "8:05:00".parse().unwrap();
/// assert!(early < late);
/// assert_eq!(early.to_string(), "08:05:00");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Time {
    hour: u32,
    minute: u32,
    second: u32,
}

impl Time {
    /// Build a time from its raw fields. None of them is bounded, and
    /// `08:60:00` stays distinct from `09:00:00`.
    pub fn from_hms(hour: u32, minute: u32, second: u32) -> Self {
        Self {
            hour,
            minute,
            second,
        }
    }

    pub fn hour(&self) -> u32 {
        self.hour
    }

    pub fn minute(&self) -> u32 {
        self.minute
    }

    pub fn second(&self) -> u32 {
        self.second
    }

    /// Seconds since the start of the service day.
    pub fn as_seconds(&self) -> u64 {
        u64::from(self.hour) * 3600 + u64::from(self.minute) * 60 + u64::from(self.second)
    }
}

impl FromStr for Time {
    type Err = TimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(':');
        let mut next = |what: &'static str| -> Result<u32, TimeError> {
            let part = parts.next().ok_or_else(|| TimeError::new(s, "expected H:MM:SS"))?;
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(TimeError::new(s, what));
            }
            part.parse().map_err(|_| TimeError::new(s, what))
        };

        let hour = next("invalid hour digits")?;
        let minute = next("invalid minute digits")?;
        let second = next("invalid second digits")?;
        if parts.next().is_some() {
            return Err(TimeError::new(s, "expected H:MM:SS"));
        }

        Ok(Time::from_hms(hour, minute, second))
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hour, self.minute, self.second)
    }
}

impl<'de> Deserialize<'de> for Time {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// The half-open interval `[start, end)` a schedule is restricted to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeWindow {
    start: Time,
    end: Time,
}

impl TimeWindow {
    /// Returns `None` when `start` is after `end`.
    pub fn new(start: Time, end: Time) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    pub fn start(&self) -> Time {
        self.start
    }

    pub fn end(&self) -> Time {
        self.end
    }

    /// Whether a stop event's `[arrival, departure]` stay overlaps the
    /// window: the vehicle is still there at `start` and got there before
    /// `end`.
    ///
    /// ```
    /// use transit_schedule::time::{Time, TimeWindow};
    ///
    /// let t = |s: &str| s.parse::<Time>().unwrap();
    /// let window = TimeWindow::new(t("8:00:00"), t("9:00:00")).unwrap();
    ///
    /// assert!(window.admits(t("7:59:00"), t("8:00:00")));
    /// assert!(!window.admits(t("9:00:00"), t("9:01:00")));
    /// ```
    pub fn admits(&self, arrival: Time, departure: Time) -> bool {
        departure >= self.start && arrival < self.end
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// Parse a calendar-exception date written as exactly eight digits,
/// `YYYYMMDD`.
///
/// Anything other than eight digits is an error. Eight digits naming a day
/// the calendar does not have (`20240230`) give `Ok(None)`: such a row can
/// never match a service date, but it is not malformed.
pub fn parse_service_date(s: &str) -> Result<Option<NaiveDate>, DateError> {
    let error = |reason: &'static str| DateError {
        input: s.to_owned(),
        reason,
    };

    if s.len() != 8 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(error("expected YYYYMMDD"));
    }

    let year: i32 = s[0..4].parse().map_err(|_| error("invalid year"))?;
    let month: u32 = s[4..6].parse().map_err(|_| error("invalid month"))?;
    let day: u32 = s[6..8].parse().map_err(|_| error("invalid day"))?;

    Ok(NaiveDate::from_ymd_opt(year, month, day))
}

pub(crate) fn deserialize_service_date<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<NaiveDate>, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse_service_date(&raw).map_err(serde::de::Error::custom)
}
