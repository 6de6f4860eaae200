//! Visibility instant value type.
//!
//! # Responsibility
//! - Hold the "visible after" instant of a record at second precision.
//! - Normalize free-form input through parse-then-format.
//! - Derive the visibility state of a record relative to "now".
//!
//! # Invariants
//! - Values are UTC and carry no sub-second component.
//! - Values lie in years 0000-9999, so the text form always has a four-digit
//!   year.
//! - `Display` output (`YYYY-MM-DD HH:MM:SS`) is the storage form; its lexical
//!   order equals chronological order.
//! - Lenient parsing never fails loudly: malformed input yields `None`.

use chrono::{
    DateTime, Duration, NaiveDate, NaiveDateTime, SubsecRound, TimeZone, Utc,
};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Canonical text format, also used for storage and SQL comparison.
pub const SCHEDULE_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// `0000-01-01 00:00:00` as Unix seconds.
const MIN_UNIX_SECONDS: i64 = -62_167_219_200;
/// `9999-12-31 23:59:59` as Unix seconds.
const MAX_UNIX_SECONDS: i64 = 253_402_300_799;

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Second-precision UTC instant after which a record becomes visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScheduleAt(DateTime<Utc>);

impl ScheduleAt {
    /// Converts any zoned datetime to UTC and drops sub-second precision.
    ///
    /// Instants outside years 0000-9999 are clamped to the nearest bound.
    pub fn from_datetime<Tz: TimeZone>(value: DateTime<Tz>) -> Self {
        let utc = value.with_timezone(&Utc);
        let seconds = utc.timestamp().clamp(MIN_UNIX_SECONDS, MAX_UNIX_SECONDS);
        Self(DateTime::from_timestamp(seconds, 0).unwrap_or_else(|| utc.trunc_subsecs(0)))
    }

    /// Builds an instant from Unix epoch seconds; `None` outside years
    /// 0000-9999.
    pub fn from_unix_seconds(seconds: i64) -> Option<Self> {
        if !(MIN_UNIX_SECONDS..=MAX_UNIX_SECONDS).contains(&seconds) {
            return None;
        }
        DateTime::from_timestamp(seconds, 0).map(Self)
    }

    /// Like `from_datetime`, but refuses instants outside years 0000-9999.
    pub fn checked_from_datetime<Tz: TimeZone>(value: DateTime<Tz>) -> Option<Self> {
        let seconds = value.timestamp();
        if (MIN_UNIX_SECONDS..=MAX_UNIX_SECONDS).contains(&seconds) {
            Some(Self::from_datetime(value))
        } else {
            None
        }
    }

    /// Lenient parse used by attribute setters.
    ///
    /// Returns `None` for empty or malformed input instead of an error.
    pub fn parse(input: &str) -> Option<Self> {
        input.parse().ok()
    }

    pub fn as_datetime(&self) -> DateTime<Utc> {
        self.0
    }

    pub fn unix_seconds(&self) -> i64 {
        self.0.timestamp()
    }

    /// Returns this instant moved by `by`; unchanged when the result would
    /// leave years 0000-9999.
    pub fn shift(self, by: Duration) -> Self {
        self.0
            .checked_add_signed(by)
            .and_then(Self::checked_from_datetime)
            .unwrap_or(self)
    }

    /// Derived visibility state relative to `now`.
    pub fn state_at(&self, now: ScheduleAt) -> ScheduleState {
        if *self > now {
            ScheduleState::Pending
        } else {
            ScheduleState::Visible
        }
    }
}

impl Display for ScheduleAt {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format(SCHEDULE_AT_FORMAT))
    }
}

impl FromStr for ScheduleAt {
    type Err = ScheduleAtParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ScheduleAtParseError::Empty);
        }

        let parsed = parse_utc(trimmed)
            .ok_or_else(|| ScheduleAtParseError::Unrecognized(trimmed.to_string()))?;
        Self::checked_from_datetime(parsed)
            .ok_or_else(|| ScheduleAtParseError::OutOfRange(trimmed.to_string()))
    }
}

fn parse_utc(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, format) {
            return Some(parsed.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|midnight| midnight.and_utc());
    }

    value
        .parse::<i64>()
        .ok()
        .and_then(|seconds| DateTime::from_timestamp(seconds, 0))
}

impl<Tz: TimeZone> From<DateTime<Tz>> for ScheduleAt {
    fn from(value: DateTime<Tz>) -> Self {
        Self::from_datetime(value)
    }
}

impl Serialize for ScheduleAt {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ScheduleAt {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Strict parse failure for `ScheduleAt::from_str`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleAtParseError {
    Empty,
    Unrecognized(String),
    /// Parsed, but outside years 0000-9999.
    OutOfRange(String),
}

impl Display for ScheduleAtParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "schedule time cannot be empty"),
            Self::Unrecognized(value) => write!(f, "unrecognized schedule time `{value}`"),
            Self::OutOfRange(value) => {
                write!(f, "schedule time `{value}` is outside years 0000-9999")
            }
        }
    }
}

impl Error for ScheduleAtParseError {}

/// Visibility state of a record, derived from `schedule_at` and "now".
///
/// Never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleState {
    /// No visibility instant; always visible.
    Unscheduled,
    /// Instant lies strictly in the future; hidden from default reads.
    Pending,
    /// Instant has elapsed (or equals now); visible.
    Visible,
}

impl ScheduleState {
    /// Derives the state for an optional instant.
    pub fn of(schedule_at: Option<ScheduleAt>, now: ScheduleAt) -> Self {
        match schedule_at {
            None => Self::Unscheduled,
            Some(at) => at.state_at(now),
        }
    }

    /// Whether records in this state appear in default reads.
    pub fn is_visible(self) -> bool {
        !matches!(self, Self::Pending)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unscheduled => "unscheduled",
            Self::Pending => "pending",
            Self::Visible => "visible",
        }
    }
}

/// Parse-then-format normalization for optional attribute input.
///
/// `None`, empty, and malformed input all collapse to `None`.
pub fn normalize_schedule_input(input: Option<&str>) -> Option<ScheduleAt> {
    input.and_then(ScheduleAt::parse)
}
