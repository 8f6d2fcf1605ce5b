//! Canonical time units and their fixed conversion to seconds.

use std::fmt;

use serde::Serialize;

/// A canonical time unit.
///
/// Each unit has a fixed conversion to seconds. A year is a flat 365 days
/// with no leap adjustment — the sites that emit these strings use the same
/// approximation, and output compatibility matters more than calendar
/// accuracy here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Year,
    Week,
    Day,
    Hour,
    Minute,
    Second,
}

impl TimeUnit {
    /// Seconds in one of this unit.
    pub const fn seconds_per(self) -> u64 {
        match self {
            Self::Year => 365 * 24 * 60 * 60,
            Self::Week => 7 * 24 * 60 * 60,
            Self::Day => 24 * 60 * 60,
            Self::Hour => 60 * 60,
            Self::Minute => 60,
            Self::Second => 1,
        }
    }

    /// Resolve a unit keyword to its canonical unit (case-insensitive,
    /// accepting singular, plural, and the `min`/`sec` abbreviations).
    ///
    /// Canonicalization happens here, before any seconds-per-unit lookup.
    pub fn from_keyword(word: &str) -> Option<Self> {
        let lower = word.to_ascii_lowercase();
        match lower.as_str() {
            "year" | "years" => Some(Self::Year),
            "week" | "weeks" => Some(Self::Week),
            "day" | "days" => Some(Self::Day),
            "hour" | "hours" => Some(Self::Hour),
            "minute" | "minutes" | "min" | "mins" => Some(Self::Minute),
            "second" | "seconds" | "sec" | "secs" => Some(Self::Second),
            _ => None,
        }
    }

    /// The canonical singular name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Year => "year",
            Self::Week => "week",
            Self::Day => "day",
            Self::Hour => "hour",
            Self::Minute => "minute",
            Self::Second => "second",
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
